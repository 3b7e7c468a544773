//! Employee records: creation, lookup, listing, deletion, and the
//! denormalized task-count projection.

use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::{Employee, TaskCounts};
use anyhow::Result;
use rusqlite::{Connection, Row, params};
use uuid::Uuid;

pub(crate) fn parse_employee_row(row: &Row) -> rusqlite::Result<Employee> {
    Ok(Employee {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: row.get("role")?,
        reset_token: row.get("reset_token")?,
        reset_expires_at: row.get("reset_expires_at")?,
        task_counts: TaskCounts {
            active: row.get("count_active")?,
            new_task: row.get("count_new_task")?,
            completed: row.get("count_completed")?,
            failed: row.get("count_failed")?,
        },
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

/// Check whether an email is taken by any employee or admin.
/// Email uniqueness holds across the union of the two tables.
pub(crate) fn email_in_use(conn: &Connection, email: &str) -> Result<bool> {
    let employees: i64 = conn.query_row(
        "SELECT COUNT(*) FROM employees WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    let admins: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admins WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )?;
    Ok(employees + admins > 0)
}

/// Recompute the four per-employee counters from the tasks table.
/// Runs inside the caller's transaction, after any flag writes, so the
/// counts always reflect the corrected flags.
pub(crate) fn recompute_task_counts(conn: &Connection, employee_id: &str, now: i64) -> Result<()> {
    conn.execute(
        "UPDATE employees SET
            count_active = (SELECT COUNT(*) FROM tasks WHERE employee_id = ?1 AND active = 1),
            count_new_task = (SELECT COUNT(*) FROM tasks WHERE employee_id = ?1 AND new_task = 1),
            count_completed = (SELECT COUNT(*) FROM tasks WHERE employee_id = ?1 AND completed = 1),
            count_failed = (SELECT COUNT(*) FROM tasks WHERE employee_id = ?1 AND failed = 1),
            updated_at = ?2
         WHERE id = ?1",
        params![employee_id, now],
    )?;
    Ok(())
}

impl Database {
    /// Create a new employee. The email must not be registered as either an
    /// employee or an admin.
    pub fn create_employee(
        &self,
        first_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Employee> {
        let email = email.to_lowercase();
        let id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn(|conn| {
            if email_in_use(conn, &email)? {
                return Err(ApiError::already_exists().into());
            }

            conn.execute(
                "INSERT INTO employees (id, first_name, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, first_name, email, password_hash, now, now],
            )?;

            let mut stmt = conn.prepare("SELECT * FROM employees WHERE id = ?1")?;
            Ok(stmt.query_row(params![id], parse_employee_row)?)
        })
    }

    /// Get an employee by id.
    pub fn get_employee(&self, employee_id: &str) -> Result<Option<Employee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM employees WHERE id = ?1")?;
            match stmt.query_row(params![employee_id], parse_employee_row) {
                Ok(employee) => Ok(Some(employee)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// Get an employee by email (case-insensitive).
    pub fn get_employee_by_email(&self, email: &str) -> Result<Option<Employee>> {
        let email = email.to_lowercase();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM employees WHERE email = ?1")?;
            match stmt.query_row(params![email], parse_employee_row) {
                Ok(employee) => Ok(Some(employee)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }

    /// List all employees, ordered by creation time.
    pub fn list_employees(&self) -> Result<Vec<Employee>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM employees ORDER BY created_at ASC")?;
            let employees = stmt
                .query_map([], parse_employee_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(employees)
        })
    }

    /// Delete an employee. Owned tasks go with it (FK cascade).
    /// Returns false if no such employee exists.
    pub fn delete_employee(&self, employee_id: &str) -> Result<bool> {
        self.with_conn(|conn| {
            let changed = conn.execute(
                "DELETE FROM employees WHERE id = ?1",
                params![employee_id],
            )?;
            Ok(changed > 0)
        })
    }
}
