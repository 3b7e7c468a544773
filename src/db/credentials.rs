//! Password-reset token bookkeeping across the two identity tables.
//!
//! Tokens are single-use and time-limited: consuming one (or having the
//! email send fail) clears it, and expiry is checked at lookup time, so a
//! token can never authorize two resets.

use super::{Database, now_ms};
use crate::types::Role;
use anyhow::Result;
use rusqlite::params;

/// A password-bearing identity found in either table.
#[derive(Debug, Clone)]
pub struct Principal {
    pub role: Role,
    pub id: String,
    pub first_name: String,
    pub email: String,
}

fn table_for(role: Role) -> &'static str {
    match role {
        Role::Admin => "admins",
        Role::Employee => "employees",
    }
}

impl Database {
    /// Find the identity registered under an email, checking employees
    /// before admins. Returns None when the email is unknown; callers must
    /// not surface that distinction to the client.
    pub fn find_principal_by_email(&self, email: &str) -> Result<Option<Principal>> {
        let email = email.to_lowercase();
        self.with_conn(|conn| {
            for (table, role) in [("employees", Role::Employee), ("admins", Role::Admin)] {
                let result = conn.query_row(
                    &format!("SELECT id, first_name, email FROM {} WHERE email = ?1", table),
                    params![email],
                    |row| {
                        Ok(Principal {
                            role,
                            id: row.get(0)?,
                            first_name: row.get(1)?,
                            email: row.get(2)?,
                        })
                    },
                );
                match result {
                    Ok(principal) => return Ok(Some(principal)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(None)
        })
    }

    /// Attach a reset token with its expiry to an identity.
    pub fn set_reset_token(
        &self,
        role: Role,
        id: &str,
        token: &str,
        expires_at: i64,
    ) -> Result<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "UPDATE {} SET reset_token = ?2, reset_expires_at = ?3, updated_at = ?4
                     WHERE id = ?1",
                    table_for(role)
                ),
                params![id, token, expires_at, now],
            )?;
            Ok(())
        })
    }

    /// Remove a pending reset token, e.g. after a failed email send.
    pub fn clear_reset_token(&self, role: Role, id: &str) -> Result<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "UPDATE {} SET reset_token = NULL, reset_expires_at = NULL, updated_at = ?2
                     WHERE id = ?1",
                    table_for(role)
                ),
                params![id, now],
            )?;
            Ok(())
        })
    }

    /// Find the identity holding an unexpired reset token.
    pub fn find_principal_by_reset_token(&self, token: &str) -> Result<Option<Principal>> {
        let now = now_ms();
        self.with_conn(|conn| {
            for (table, role) in [("employees", Role::Employee), ("admins", Role::Admin)] {
                let result = conn.query_row(
                    &format!(
                        "SELECT id, first_name, email FROM {}
                         WHERE reset_token = ?1 AND reset_expires_at > ?2",
                        table
                    ),
                    params![token, now],
                    |row| {
                        Ok(Principal {
                            role,
                            id: row.get(0)?,
                            first_name: row.get(1)?,
                            email: row.get(2)?,
                        })
                    },
                );
                match result {
                    Ok(principal) => return Ok(Some(principal)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => continue,
                    Err(e) => return Err(e.into()),
                }
            }
            Ok(None)
        })
    }

    /// Replace an identity's password and consume its reset token in one
    /// statement.
    pub fn update_password_and_clear_token(
        &self,
        role: Role,
        id: &str,
        password_hash: &str,
    ) -> Result<()> {
        let now = now_ms();
        self.with_conn(|conn| {
            conn.execute(
                &format!(
                    "UPDATE {} SET password_hash = ?2, reset_token = NULL,
                     reset_expires_at = NULL, updated_at = ?3
                     WHERE id = ?1",
                    table_for(role)
                ),
                params![id, password_hash, now],
            )?;
            Ok(())
        })
    }
}
