//! Audit events emitted by the panel.
//!
//! Both forced-reset causes are recorded separately even though the
//! session treats them the same way.

use serde::{Deserialize, Serialize};

use crate::{auth::LoginStatus, types::Timestamp};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelEvent {
    LoginEvaluated {
        username: String,
        status:   LoginStatus,
    },
    /// The credential store could not be reached while logging in.
    LoginFailedTransport {
        username: String,
    },
    PasswordReset {
        username: String,
    },
    PasswordResetFailed {
        username: String,
        reason:   String,
    },
    LoggedOut {
        username: String,
    },
}

impl PanelEvent {
    pub fn username(&self) -> &str {
        match self {
            PanelEvent::LoginEvaluated { username, .. }
            | PanelEvent::LoginFailedTransport { username }
            | PanelEvent::PasswordReset { username }
            | PanelEvent::PasswordResetFailed { username, .. }
            | PanelEvent::LoggedOut { username } => username,
        }
    }

    /// Stable name for the event_type column in event_log.
    pub fn type_name(&self) -> &'static str {
        match self {
            PanelEvent::LoginEvaluated { .. }       => "login_evaluated",
            PanelEvent::LoginFailedTransport { .. } => "login_failed_transport",
            PanelEvent::PasswordReset { .. }        => "password_reset",
            PanelEvent::PasswordResetFailed { .. }  => "password_reset_failed",
            PanelEvent::LoggedOut { .. }            => "logged_out",
        }
    }
}

/// A persisted row of the event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    pub id:         Option<i64>,
    pub username:   String,
    pub event_type: String,
    pub payload:    String,
    pub created_at: Timestamp,
}

impl EventLogEntry {
    pub fn from_event(event: &PanelEvent, created_at: Timestamp) -> serde_json::Result<Self> {
        Ok(Self {
            id:         None,
            username:   event.username().to_string(),
            event_type: event.type_name().to_string(),
            payload:    serde_json::to_string(event)?,
            created_at,
        })
    }

    pub fn decode(&self) -> serde_json::Result<PanelEvent> {
        serde_json::from_str(&self.payload)
    }
}
