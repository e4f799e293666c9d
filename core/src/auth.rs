//! Login state machine and forced password reset.
//!
//! UNKNOWN → { INVALID, FORCE_RESET_INITIAL, FORCE_RESET_EXPIRED, SUCCESS }
//!
//! Order of checks is fixed: existence, password, first login, expiry.
//! A store failure is returned as `PanelError::Transport` and never
//! folded into INVALID.

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    credentials::{CredentialAdapter, CredentialStore, UserCredential},
    error::{PanelError, PanelResult},
    password::PasswordHasher,
    policy,
    session::SessionContext,
    types::Timestamp,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LoginStatus {
    Invalid,
    /// Account is still on its provisioned password.
    ForceResetInitial,
    /// Password is older than the expiry window.
    ForceResetExpired,
    Success,
}

impl LoginStatus {
    pub fn requires_reset(&self) -> bool {
        matches!(self, LoginStatus::ForceResetInitial | LoginStatus::ForceResetExpired)
    }
}

/// Pure decision over an already-fetched record.
pub fn decide(
    credential: Option<&UserCredential>,
    password_matches: impl FnOnce(&UserCredential) -> bool,
    now: Timestamp,
    expiry: Duration,
) -> LoginStatus {
    let Some(credential) = credential else {
        return LoginStatus::Invalid;
    };
    if !password_matches(credential) {
        return LoginStatus::Invalid;
    }
    if credential.first_login {
        return LoginStatus::ForceResetInitial;
    }
    // A deadline past the representable range never expires.
    match credential.last_reset_date.checked_add_signed(expiry) {
        Some(deadline) if now > deadline => LoginStatus::ForceResetExpired,
        _ => LoginStatus::Success,
    }
}

pub struct Authenticator<'a, S: CredentialStore + ?Sized> {
    credentials: CredentialAdapter<'a, S>,
    hasher:      &'a PasswordHasher,
    clock:       &'a dyn Clock,
    expiry:      Duration,
}

impl<'a, S: CredentialStore + ?Sized> Authenticator<'a, S> {
    pub fn new(
        store: &'a S,
        hasher: &'a PasswordHasher,
        clock: &'a dyn Clock,
        expiry_days: i64,
    ) -> Self {
        Self {
            credentials: CredentialAdapter::new(store, hasher, clock),
            hasher,
            clock,
            expiry: Duration::try_days(expiry_days).unwrap_or(Duration::MAX),
        }
    }

    /// Evaluate a login attempt without touching any session.
    pub fn login(&self, username: &str, password: &str) -> PanelResult<LoginStatus> {
        if username.is_empty() || password.is_empty() {
            return Err(PanelError::Validation(
                "Please enter both username and password.".into(),
            ));
        }
        let credential = self.credentials.fetch(username)?;
        let status = decide(
            credential.as_ref(),
            |c| self.hasher.verify(password, &c.password_hash),
            self.clock.now(),
            self.expiry,
        );
        log::info!("auth: login evaluated user={username} status={status:?}");
        Ok(status)
    }

    /// Evaluate a login attempt and apply the outcome to `session`.
    /// On error the session is left as it was.
    pub fn login_into(
        &self,
        session: &mut SessionContext,
        username: &str,
        password: &str,
    ) -> PanelResult<LoginStatus> {
        let status = self.login(username, password)?;
        session.apply_login(username, status);
        Ok(status)
    }

    /// Commit a forced password reset for the session's user.
    ///
    /// Validation failures leave the session on the reset form. A store
    /// failure may have happened after the new hash was written, so the
    /// session is cleared and the user has to log in again.
    pub fn reset_password(
        &self,
        session: &mut SessionContext,
        new_password: &str,
        confirmation: &str,
    ) -> PanelResult<()> {
        if !session.force_reset || session.username.is_empty() {
            return Err(PanelError::Authentication(
                "no password reset is pending for this session".into(),
            ));
        }
        policy::validate_new_password(new_password, confirmation)?;

        let username = session.username.clone();
        match self.credentials.update(&username, new_password) {
            Ok(()) => {
                session.complete_reset();
                log::info!("auth: forced reset completed user={username}");
                Ok(())
            }
            Err(e @ PanelError::Transport(_)) => {
                log::warn!("auth: reset outcome unknown user={username}, session cleared: {e}");
                session.clear();
                Err(e)
            }
            Err(e) => {
                log::warn!("auth: reset failed user={username}: {e}");
                Err(e)
            }
        }
    }
}
