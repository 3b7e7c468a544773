//! Admin records: creation and lookup.

use super::employees::email_in_use;
use super::{Database, now_ms};
use crate::error::ApiError;
use crate::types::Admin;
use anyhow::Result;
use rusqlite::{Row, params};
use uuid::Uuid;

pub(crate) fn parse_admin_row(row: &Row) -> rusqlite::Result<Admin> {
    Ok(Admin {
        id: row.get("id")?,
        first_name: row.get("first_name")?,
        email: row.get("email")?,
        password_hash: row.get("password_hash")?,
        role: row.get("role")?,
        reset_token: row.get("reset_token")?,
        reset_expires_at: row.get("reset_expires_at")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

impl Database {
    /// Create a new admin. The email must not be registered as either an
    /// employee or an admin.
    pub fn create_admin(
        &self,
        first_name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Admin> {
        let email = email.to_lowercase();
        let id = Uuid::now_v7().to_string();
        let now = now_ms();

        self.with_conn(|conn| {
            if email_in_use(conn, &email)? {
                return Err(ApiError::already_exists().into());
            }

            conn.execute(
                "INSERT INTO admins (id, first_name, email, password_hash, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![id, first_name, email, password_hash, now, now],
            )?;

            let mut stmt = conn.prepare("SELECT * FROM admins WHERE id = ?1")?;
            Ok(stmt.query_row(params![id], parse_admin_row)?)
        })
    }

    /// Get an admin by email (case-insensitive).
    pub fn get_admin_by_email(&self, email: &str) -> Result<Option<Admin>> {
        let email = email.to_lowercase();
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT * FROM admins WHERE email = ?1")?;
            match stmt.query_row(params![email], parse_admin_row) {
                Ok(admin) => Ok(Some(admin)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e.into()),
            }
        })
    }
}
