//! Explicit per-user session context.
//!
//! The UI owns where this lives between page views; the core only
//! reads and transitions it. `force_reset` always blocks dashboard
//! access, whatever `authenticated` says.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::LoginStatus;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub session_id:    Uuid,
    pub authenticated: bool,
    pub username:      String,
    pub force_reset:   bool,
    /// Outcome of the most recent login attempt, for display and audit.
    pub last_status:   Option<LoginStatus>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self {
            session_id:    Uuid::new_v4(),
            authenticated: false,
            username:      String::new(),
            force_reset:   false,
            last_status:   None,
        }
    }

    pub fn can_view_dashboard(&self) -> bool {
        self.authenticated && !self.force_reset
    }

    pub fn must_reset_password(&self) -> bool {
        self.force_reset
    }

    /// Apply a login outcome. Both forced-reset causes move the session
    /// to the reset form; INVALID drops any previous authentication.
    pub fn apply_login(&mut self, username: &str, status: LoginStatus) {
        self.last_status = Some(status);
        match status {
            LoginStatus::Success => {
                self.authenticated = true;
                self.username = username.to_string();
                self.force_reset = false;
            }
            LoginStatus::ForceResetInitial | LoginStatus::ForceResetExpired => {
                self.authenticated = false;
                self.username = username.to_string();
                self.force_reset = true;
            }
            LoginStatus::Invalid => {
                self.authenticated = false;
            }
        }
    }

    /// A forced reset was committed: grant dashboard access.
    pub fn complete_reset(&mut self) {
        self.authenticated = true;
        self.force_reset = false;
    }

    /// Logout. Every field is reset and a fresh session id is issued.
    pub fn clear(&mut self) {
        *self = Self::new();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forced_reset_never_grants_dashboard() {
        let mut session = SessionContext::new();
        session.apply_login("Dados", LoginStatus::ForceResetExpired);
        assert!(session.must_reset_password());
        assert!(!session.can_view_dashboard());
        assert_eq!(session.username, "Dados");
    }

    #[test]
    fn invalid_after_success_revokes_access() {
        let mut session = SessionContext::new();
        session.apply_login("Dados", LoginStatus::Success);
        assert!(session.can_view_dashboard());
        session.apply_login("Dados", LoginStatus::Invalid);
        assert!(!session.can_view_dashboard());
    }

    #[test]
    fn clear_resets_everything() {
        let mut session = SessionContext::new();
        let old_id = session.session_id;
        session.apply_login("Dados", LoginStatus::Success);
        session.clear();
        assert!(!session.authenticated);
        assert!(!session.force_reset);
        assert!(session.username.is_empty());
        assert!(session.last_status.is_none());
        assert_ne!(session.session_id, old_id);
    }
}
