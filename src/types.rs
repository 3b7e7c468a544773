//! Core types for the taskcrew backend.

use serde::{Deserialize, Serialize};

use crate::lifecycle::{StatusFlags, TaskStatus};

/// Caller role attached to every issued token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Employee => "employee",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "employee" => Some(Role::Employee),
            _ => None,
        }
    }
}

/// Per-employee tally of tasks by status. Denormalized; recomputed from the
/// tasks table on every task write, never updated incrementally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub active: i64,
    pub new_task: i64,
    pub completed: i64,
    pub failed: i64,
}

/// An employee record as stored. `password_hash` never leaves the server;
/// use [`EmployeeView`] for responses.
#[derive(Debug, Clone)]
pub struct Employee {
    pub id: String,
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<i64>,
    pub task_counts: TaskCounts,
    pub created_at: i64,
    pub updated_at: i64,
}

/// An admin record as stored.
#[derive(Debug, Clone)]
pub struct Admin {
    pub id: String,
    pub first_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub reset_token: Option<String>,
    pub reset_expires_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A task owned by exactly one employee.
#[derive(Debug, Clone)]
pub struct Task {
    pub id: String,
    pub employee_id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub category: String,
    pub status: TaskStatus,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Task representation on the wire: the status travels as four mutually
/// exclusive booleans for compatibility with existing clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub date: String,
    pub category: String,
    #[serde(flatten)]
    pub flags: StatusFlags,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        TaskView {
            id: task.id.clone(),
            title: task.title.clone(),
            description: task.description.clone(),
            date: task.date.clone(),
            category: task.category.clone(),
            flags: StatusFlags::from(task.status),
        }
    }
}

/// A task in the admin-wide listing, annotated with its owner and a derived
/// single-string status.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedTaskView {
    #[serde(flatten)]
    pub task: TaskView,
    pub assigned_to: String,
    pub assigned_to_name: String,
    pub assigned_to_email: String,
    pub task_status: TaskStatus,
}

/// Employee representation on the wire, without the password hash.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeView {
    pub id: String,
    pub first_name: String,
    pub email: String,
    pub role: String,
    pub task_counts: TaskCounts,
    pub tasks: Vec<TaskView>,
}

impl EmployeeView {
    pub fn new(employee: &Employee, tasks: &[Task]) -> Self {
        EmployeeView {
            id: employee.id.clone(),
            first_name: employee.first_name.clone(),
            email: employee.email.clone(),
            role: employee.role.clone(),
            task_counts: employee.task_counts,
            tasks: tasks.iter().map(TaskView::from).collect(),
        }
    }
}

/// The `user` object returned by login and the registration endpoints.
/// Employee callers get their counts and tasks inline; admins do not.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPayload {
    pub id: String,
    pub email: String,
    pub role: Role,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_counts: Option<TaskCounts>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskView>>,
}

/// Aggregate counts for the admin dashboard.
///
/// `total_tasks` sums active, completed, and failed only — the figure the
/// dashboard has always shown.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_employees: i64,
    pub total_tasks: i64,
    pub completed_tasks: i64,
    pub active_tasks: i64,
    pub failed_tasks: i64,
}

/// Input for assigning a task to an employee.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTaskInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub category: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_view_serializes_flat_status_flags() {
        let task = Task {
            id: "t-1".to_string(),
            employee_id: "e-1".to_string(),
            title: "DB tuning".to_string(),
            description: "Optimize queries".to_string(),
            date: "2024-10-11".to_string(),
            category: "Database".to_string(),
            status: TaskStatus::Active,
            created_at: 0,
            updated_at: 0,
        };

        let json = serde_json::to_value(TaskView::from(&task)).unwrap();
        assert_eq!(json["active"], true);
        assert_eq!(json["newTask"], false);
        assert_eq!(json["completed"], false);
        assert_eq!(json["failed"], false);
        assert_eq!(json["category"], "Database");
    }

    #[test]
    fn user_payload_omits_absent_task_fields() {
        let payload = UserPayload {
            id: "a-1".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            first_name: "Admin".to_string(),
            task_counts: None,
            tasks: None,
        };

        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["role"], "admin");
        assert!(json.get("taskCounts").is_none());
        assert!(json.get("tasks").is_none());
    }
}
