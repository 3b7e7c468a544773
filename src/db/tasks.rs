//! Task CRUD and status-transition operations.
//!
//! Every status write funnels through a single [`TaskStatus`] value, so a
//! task row written by any path here carries exactly one true flag. The
//! repair routine is the one place that reads rows at the raw-flag level,
//! because its whole job is fixing rows that predate that guarantee.

use super::employees::recompute_task_counts;
use super::{Database, now_ms};
use crate::error::ApiError;
use crate::lifecycle::{StatusFlags, TaskStatus};
use crate::types::{AssignedTaskView, Task, TaskView};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

pub(crate) fn parse_task_row(row: &Row) -> rusqlite::Result<Task> {
    let flags = StatusFlags {
        new_task: row.get("new_task")?,
        active: row.get("active")?,
        completed: row.get("completed")?,
        failed: row.get("failed")?,
    };

    Ok(Task {
        id: row.get("id")?,
        employee_id: row.get("employee_id")?,
        title: row.get("title")?,
        description: row.get("description")?,
        date: row.get("task_date")?,
        category: row.get("category")?,
        status: flags.resolve(),
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Write a task's flag columns from a single status value.
fn write_task_flags(conn: &Connection, task_id: &str, status: TaskStatus, now: i64) -> Result<()> {
    let flags = StatusFlags::from(status);
    conn.execute(
        "UPDATE tasks SET new_task = ?2, active = ?3, completed = ?4, failed = ?5, updated_at = ?6
         WHERE id = ?1",
        params![
            task_id,
            flags.new_task,
            flags.active,
            flags.completed,
            flags.failed,
            now
        ],
    )?;
    Ok(())
}

/// Internal helper to get a task using an existing connection.
fn get_task_internal(conn: &Connection, task_id: &str) -> Result<Option<Task>> {
    let mut stmt = conn.prepare("SELECT * FROM tasks WHERE id = ?1")?;

    let result = stmt.query_row(params![task_id], parse_task_row);

    match result {
        Ok(task) => Ok(Some(task)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Find the employee owning a task, if any.
fn find_task_owner(conn: &Connection, task_id: &str) -> Result<Option<String>> {
    let result = conn.query_row(
        "SELECT employee_id FROM tasks WHERE id = ?1",
        params![task_id],
        |row| row.get::<_, String>(0),
    );
    match result {
        Ok(employee_id) => Ok(Some(employee_id)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

impl Database {
    /// Assign a new task to an employee. The task starts as `newTask`.
    pub fn assign_task(
        &self,
        employee_id: &str,
        title: &str,
        description: &str,
        date: &str,
        category: &str,
    ) -> Result<Task> {
        let task_id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM employees WHERE id = ?1",
                params![employee_id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(ApiError::employee_not_found().into());
            }

            let flags = StatusFlags::from(TaskStatus::NewTask);
            tx.execute(
                "INSERT INTO tasks (
                    id, employee_id, title, description, task_date, category,
                    new_task, active, completed, failed, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                params![
                    task_id,
                    employee_id,
                    title,
                    description,
                    date,
                    category,
                    flags.new_task,
                    flags.active,
                    flags.completed,
                    flags.failed,
                    now,
                    now
                ],
            )?;

            recompute_task_counts(&tx, employee_id, now)?;

            let task = get_task_internal(&tx, &task_id)?
                .ok_or_else(|| anyhow::anyhow!("task vanished during insert"))?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// List an employee's tasks, oldest first.
    pub fn list_tasks_for(&self, employee_id: &str) -> Result<Vec<Task>> {
        self.with_conn(|conn| {
            let mut stmt = conn
                .prepare("SELECT * FROM tasks WHERE employee_id = ?1 ORDER BY created_at ASC")?;
            let tasks = stmt
                .query_map(params![employee_id], parse_task_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(tasks)
        })
    }

    /// Set a task's status by id, regardless of owner (admin path).
    pub fn set_task_status(&self, task_id: &str, status: TaskStatus) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let employee_id =
                find_task_owner(&tx, task_id)?.ok_or_else(ApiError::task_not_found)?;

            write_task_flags(&tx, task_id, status, now)?;
            recompute_task_counts(&tx, &employee_id, now)?;

            let task = get_task_internal(&tx, task_id)?.ok_or_else(ApiError::task_not_found)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Set a task's status on behalf of its owner (employee path).
    ///
    /// The lookup is scoped to the caller's own tasks: a task id belonging to
    /// a different employee is indistinguishable from a missing one, and
    /// nothing is mutated.
    pub fn set_own_task_status(
        &self,
        employee_id: &str,
        task_id: &str,
        status: TaskStatus,
    ) -> Result<Task> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let owned: i64 = tx.query_row(
                "SELECT COUNT(*) FROM tasks WHERE id = ?1 AND employee_id = ?2",
                params![task_id, employee_id],
                |row| row.get(0),
            )?;
            if owned == 0 {
                return Err(ApiError::task_not_found().into());
            }

            write_task_flags(&tx, task_id, status, now)?;
            recompute_task_counts(&tx, employee_id, now)?;

            let task = get_task_internal(&tx, task_id)?.ok_or_else(ApiError::task_not_found)?;

            tx.commit()?;
            Ok(task)
        })
    }

    /// Delete a task by id. Returns false if no such task exists.
    pub fn delete_task(&self, task_id: &str) -> Result<bool> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let Some(employee_id) = find_task_owner(&tx, task_id)? else {
                return Ok(false);
            };

            tx.execute("DELETE FROM tasks WHERE id = ?1", params![task_id])?;
            recompute_task_counts(&tx, &employee_id, now)?;

            tx.commit()?;
            Ok(true)
        })
    }

    /// All tasks across all employees, annotated with owner identity and the
    /// single-string status the admin UI filters on.
    pub fn list_all_tasks(&self) -> Result<Vec<AssignedTaskView>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT t.*, e.first_name AS owner_name, e.email AS owner_email
                 FROM tasks t
                 JOIN employees e ON e.id = t.employee_id
                 ORDER BY t.created_at ASC",
            )?;

            let views = stmt
                .query_map([], |row| {
                    let task = parse_task_row(row)?;
                    let owner_name: String = row.get("owner_name")?;
                    let owner_email: String = row.get("owner_email")?;
                    Ok(AssignedTaskView {
                        task_status: task.status,
                        assigned_to: task.employee_id.clone(),
                        assigned_to_name: owner_name,
                        assigned_to_email: owner_email,
                        task: TaskView::from(&task),
                    })
                })?
                .collect::<Result<Vec<_>, _>>()?;

            Ok(views)
        })
    }

    /// Scan every task row at the raw-flag level and restore the one-status
    /// invariant: several flags set collapse by priority (completed > failed
    /// > active > newTask), none set becomes newTask. Only employees with at
    /// least one corrected task are touched; returns how many were.
    ///
    /// Running this twice in a row changes nothing on the second run.
    pub fn repair_task_statuses(&self) -> Result<i64> {
        let now = now_ms();

        self.with_conn_mut(|conn| {
            let tx = conn.transaction()?;

            let rows: Vec<(String, String, StatusFlags)> = {
                let mut stmt = tx.prepare(
                    "SELECT id, employee_id, new_task, active, completed, failed FROM tasks",
                )?;
                let rows = stmt
                    .query_map([], |row| {
                        Ok((
                            row.get::<_, String>(0)?,
                            row.get::<_, String>(1)?,
                            StatusFlags {
                                new_task: row.get(2)?,
                                active: row.get(3)?,
                                completed: row.get(4)?,
                                failed: row.get(5)?,
                            },
                        ))
                    })?
                    .collect::<Result<Vec<_>, _>>()?;
                rows
            };

            let mut touched_employees: Vec<String> = Vec::new();
            for (task_id, employee_id, flags) in rows {
                if flags.is_valid() {
                    continue;
                }
                write_task_flags(&tx, &task_id, flags.resolve(), now)?;
                if !touched_employees.contains(&employee_id) {
                    touched_employees.push(employee_id);
                }
            }

            for employee_id in &touched_employees {
                recompute_task_counts(&tx, employee_id, now)?;
            }

            let updated = touched_employees.len() as i64;
            tx.commit()?;
            Ok(updated)
        })
    }
}
