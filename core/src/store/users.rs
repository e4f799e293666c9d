//! Store methods for the panel_user table.

use rusqlite::{params, OptionalExtension};

use super::{decode_timestamp, encode_timestamp, PanelStore};
use crate::{credentials::UserCredential, error::PanelResult, types::Timestamp};

impl PanelStore {
    /// Exact-match lookup. `None` when the username is absent.
    pub fn get_user(&self, username: &str) -> PanelResult<Option<UserCredential>> {
        let row = self
            .conn
            .query_row(
                "SELECT username, password_hash, last_reset_date, first_login
                 FROM panel_user WHERE username = ?1",
                params![username],
                |row| {
                    Ok(UserCredential {
                        username:        row.get(0)?,
                        password_hash:   row.get(1)?,
                        last_reset_date: decode_timestamp(2, &row.get::<_, String>(2)?)?,
                        first_login:     row.get::<_, i32>(3)? != 0,
                    })
                },
            )
            .optional()?;
        Ok(row)
    }

    /// Single-row update of hash, reset date and first-login flag.
    /// Returns the number of rows touched (0 or 1).
    pub fn update_user_password(
        &self,
        username: &str,
        password_hash: &str,
        reset_at: Timestamp,
    ) -> PanelResult<usize> {
        let changed = self.conn.execute(
            "UPDATE panel_user
             SET password_hash = ?1, last_reset_date = ?2, first_login = 0
             WHERE username = ?3",
            params![password_hash, encode_timestamp(&reset_at), username],
        )?;
        Ok(changed)
    }

    /// Insert unless the username already exists. Returns true if inserted.
    pub fn insert_user_if_absent(&self, user: &UserCredential) -> PanelResult<bool> {
        let inserted = self.conn.execute(
            "INSERT OR IGNORE INTO panel_user (username, password_hash, last_reset_date, first_login)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                user.username,
                user.password_hash,
                encode_timestamp(&user.last_reset_date),
                user.first_login as i32,
            ],
        )?;
        Ok(inserted == 1)
    }

    // ── Test / summary helpers ────────────────────────────────────────

    pub fn user_count(&self) -> PanelResult<i64> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM panel_user", [], |row| row.get(0))?;
        Ok(count)
    }
}
