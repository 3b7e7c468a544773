//! Task status lifecycle: the single-status model and the rules that keep
//! the four wire-level flags mutually exclusive.
//!
//! A task is always in exactly one of four statuses. The wire format (and
//! the storage rows) carry four booleans for compatibility with existing
//! clients and data, so this module owns the two mapping rules:
//!
//! - conflict resolution, used when ingesting an arbitrary flag set
//!   (repair, legacy rows): `completed > failed > active > newTask`;
//! - intent application, used for employee self-service updates:
//!   `active > newTask > completed > failed`.
//!
//! The two orderings are different on purpose. Conflict resolution picks the
//! most terminal state a corrupted row ever reached; intent application picks
//! what a caller setting a single flag most likely meant. Do not unify them.

use serde::{Deserialize, Serialize};

/// Lifecycle stage of a task. Exactly one applies at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskStatus {
    NewTask,
    Active,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::NewTask => "newTask",
            TaskStatus::Active => "active",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }

    /// Parse a status name from an admin update request.
    /// Unrecognized names fall back to `NewTask`, matching the existing
    /// API contract for the admin status-update endpoint.
    pub fn parse_or_default(s: &str) -> Self {
        match s {
            "active" => TaskStatus::Active,
            "completed" => TaskStatus::Completed,
            "failed" => TaskStatus::Failed,
            _ => TaskStatus::NewTask,
        }
    }
}

/// The four wire-level status flags as read from a row or a payload.
/// May be in any combination, including none or several set.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusFlags {
    pub new_task: bool,
    pub active: bool,
    pub completed: bool,
    pub failed: bool,
}

impl StatusFlags {
    /// Number of flags currently set.
    pub fn true_count(&self) -> usize {
        [self.new_task, self.active, self.completed, self.failed]
            .iter()
            .filter(|f| **f)
            .count()
    }

    /// Whether this flag set already satisfies the one-status invariant.
    pub fn is_valid(&self) -> bool {
        self.true_count() == 1
    }

    /// Collapse an arbitrary flag set to a single status.
    ///
    /// Priority when several flags are set: completed > failed > active >
    /// newTask. An empty flag set resolves to `NewTask`, so no write path
    /// can persist a task with no status at all.
    pub fn resolve(&self) -> TaskStatus {
        if self.completed {
            TaskStatus::Completed
        } else if self.failed {
            TaskStatus::Failed
        } else if self.active {
            TaskStatus::Active
        } else {
            TaskStatus::NewTask
        }
    }
}

impl From<TaskStatus> for StatusFlags {
    fn from(status: TaskStatus) -> Self {
        StatusFlags {
            new_task: status == TaskStatus::NewTask,
            active: status == TaskStatus::Active,
            completed: status == TaskStatus::Completed,
            failed: status == TaskStatus::Failed,
        }
    }
}

/// Status intents from an employee self-service update. Each field is
/// independently optional in the request body.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusIntent {
    pub active: Option<bool>,
    pub new_task: Option<bool>,
    pub completed: Option<bool>,
    pub failed: Option<bool>,
}

impl StatusIntent {
    /// Pick the status the caller asked for.
    ///
    /// Priority: active > newTask > completed > failed, defaulting to
    /// `NewTask` when nothing is set. Note this ordering is NOT the
    /// conflict-resolution ordering in [`StatusFlags::resolve`].
    pub fn apply(&self) -> TaskStatus {
        if self.active == Some(true) {
            TaskStatus::Active
        } else if self.new_task == Some(true) {
            TaskStatus::NewTask
        } else if self.completed == Some(true) {
            TaskStatus::Completed
        } else if self.failed == Some(true) {
            TaskStatus::Failed
        } else {
            TaskStatus::NewTask
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_single_flag_is_identity() {
        for status in [
            TaskStatus::NewTask,
            TaskStatus::Active,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ] {
            let flags = StatusFlags::from(status);
            assert!(flags.is_valid());
            assert_eq!(flags.resolve(), status);
        }
    }

    #[test]
    fn resolve_prefers_completed_over_everything() {
        let flags = StatusFlags {
            new_task: true,
            active: true,
            completed: true,
            failed: true,
        };
        assert_eq!(flags.resolve(), TaskStatus::Completed);
    }

    #[test]
    fn resolve_prefers_failed_over_active() {
        let flags = StatusFlags {
            new_task: false,
            active: true,
            completed: false,
            failed: true,
        };
        assert_eq!(flags.resolve(), TaskStatus::Failed);
    }

    #[test]
    fn resolve_empty_defaults_to_new_task() {
        let flags = StatusFlags::default();
        assert_eq!(flags.true_count(), 0);
        assert_eq!(flags.resolve(), TaskStatus::NewTask);
    }

    #[test]
    fn intent_priority_prefers_active() {
        let intent = StatusIntent {
            active: Some(true),
            new_task: Some(true),
            completed: Some(true),
            failed: Some(true),
        };
        assert_eq!(intent.apply(), TaskStatus::Active);
    }

    #[test]
    fn intent_new_task_outranks_completed() {
        let intent = StatusIntent {
            active: None,
            new_task: Some(true),
            completed: Some(true),
            failed: None,
        };
        assert_eq!(intent.apply(), TaskStatus::NewTask);
    }

    #[test]
    fn intent_empty_defaults_to_new_task() {
        let intent = StatusIntent::default();
        assert_eq!(intent.apply(), TaskStatus::NewTask);
    }

    #[test]
    fn intent_false_flags_are_ignored() {
        let intent = StatusIntent {
            active: Some(false),
            new_task: None,
            completed: Some(true),
            failed: None,
        };
        assert_eq!(intent.apply(), TaskStatus::Completed);
    }

    #[test]
    fn parse_or_default_falls_back_to_new_task() {
        assert_eq!(TaskStatus::parse_or_default("active"), TaskStatus::Active);
        assert_eq!(
            TaskStatus::parse_or_default("completed"),
            TaskStatus::Completed
        );
        assert_eq!(TaskStatus::parse_or_default("failed"), TaskStatus::Failed);
        assert_eq!(TaskStatus::parse_or_default("newTask"), TaskStatus::NewTask);
        assert_eq!(TaskStatus::parse_or_default("bogus"), TaskStatus::NewTask);
    }
}
