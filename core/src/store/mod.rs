//! SQLite persistence layer.
//!
//! RULE: Only the store talks to the database.
//! Everything else calls store methods and never executes SQL directly.
//! Every query binds its values as parameters.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{params, types::Type, Connection};

use crate::{error::PanelResult, event::EventLogEntry, types::Timestamp};

mod pricing;
mod users;

pub struct PanelStore {
    conn: Connection,
}

impl PanelStore {
    pub fn open(path: &str) -> PanelResult<Self> {
        if path == ":memory:" {
            return Self::in_memory();
        }
        let conn = Connection::open_with_flags(
            path,
            rusqlite::OpenFlags::SQLITE_OPEN_READ_WRITE
                | rusqlite::OpenFlags::SQLITE_OPEN_CREATE
                | rusqlite::OpenFlags::SQLITE_OPEN_URI,
        )?;
        // WAL mode only for real files (shared-memory and :memory: ignore it).
        let _ = conn.execute_batch("PRAGMA journal_mode=WAL;");
        log::debug!("store: opened {path}");
        Ok(Self { conn })
    }

    /// Open an in-memory database (used in tests).
    pub fn in_memory() -> PanelResult<Self> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }

    /// Apply all schema migrations in order.
    pub fn migrate(&self) -> PanelResult<()> {
        self.conn
            .execute_batch(include_str!("../../../migrations/001_users.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/002_pricing.sql"))?;
        self.conn
            .execute_batch(include_str!("../../../migrations/003_event_log.sql"))?;
        Ok(())
    }

    // ── Event log ──────────────────────────────────────────────

    pub fn append_event(&self, entry: &EventLogEntry) -> PanelResult<()> {
        self.conn.execute(
            "INSERT INTO event_log (username, event_type, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                entry.username,
                entry.event_type,
                entry.payload,
                encode_timestamp(&entry.created_at),
            ],
        )?;
        Ok(())
    }

    pub fn events_for_user(&self, username: &str) -> PanelResult<Vec<EventLogEntry>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, username, event_type, payload, created_at
             FROM event_log WHERE username = ?1
             ORDER BY id ASC",
        )?;
        let entries = stmt
            .query_map(params![username], |row| {
                Ok(EventLogEntry {
                    id:         Some(row.get(0)?),
                    username:   row.get(1)?,
                    event_type: row.get(2)?,
                    payload:    row.get(3)?,
                    created_at: decode_timestamp(4, &row.get::<_, String>(4)?)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entries)
    }
}

/// Fixed-width RFC 3339 so lexical order matches time order.
pub(crate) fn encode_timestamp(ts: &Timestamp) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_timestamp(column: usize, raw: &str) -> rusqlite::Result<Timestamp> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(column, Type::Text, Box::new(e)))
}
