//! Credential store adapter: point lookup and point update by username.
//!
//! Usernames are matched exactly as stored (case-sensitive). Callers
//! are expected to trim surrounding whitespace before lookup.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    clock::Clock,
    error::{PanelError, PanelResult},
    password::PasswordHasher,
    store::PanelStore,
    types::{Timestamp, Username},
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserCredential {
    pub username:        Username,
    pub password_hash:   String,
    pub last_reset_date: Timestamp,
    pub first_login:     bool,
}

/// Backing storage for user credentials. The SQLite store is the
/// production implementation; tests substitute failing stores.
pub trait CredentialStore {
    fn fetch_user(&self, username: &str) -> PanelResult<Option<UserCredential>>;

    /// Returns the number of rows changed (0 when the user is absent).
    fn write_password_hash(
        &self,
        username: &str,
        password_hash: &str,
        reset_at: Timestamp,
    ) -> PanelResult<usize>;

    fn insert_user_if_absent(&self, user: &UserCredential) -> PanelResult<bool>;
}

impl CredentialStore for PanelStore {
    fn fetch_user(&self, username: &str) -> PanelResult<Option<UserCredential>> {
        self.get_user(username)
    }

    fn write_password_hash(
        &self,
        username: &str,
        password_hash: &str,
        reset_at: Timestamp,
    ) -> PanelResult<usize> {
        self.update_user_password(username, password_hash, reset_at)
    }

    fn insert_user_if_absent(&self, user: &UserCredential) -> PanelResult<bool> {
        PanelStore::insert_user_if_absent(self, user)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Provisioned {
    Created,
    AlreadyExists,
}

pub struct CredentialAdapter<'a, S: CredentialStore + ?Sized> {
    store:  &'a S,
    hasher: &'a PasswordHasher,
    clock:  &'a dyn Clock,
}

impl<'a, S: CredentialStore + ?Sized> CredentialAdapter<'a, S> {
    pub fn new(store: &'a S, hasher: &'a PasswordHasher, clock: &'a dyn Clock) -> Self {
        Self { store, hasher, clock }
    }

    pub fn fetch(&self, username: &str) -> PanelResult<Option<UserCredential>> {
        self.store.fetch_user(username)
    }

    /// Hash `new_password`, stamp the reset date with the current time
    /// and clear the first-login flag, in one single-row write.
    pub fn update(&self, username: &str, new_password: &str) -> PanelResult<()> {
        let hash = self.hasher.hash(new_password)?;
        let now = self.clock.now();
        match self.store.write_password_hash(username, &hash, now)? {
            0 => Err(PanelError::not_found("user", username)),
            _ => {
                log::info!("credentials: password updated user={username}");
                Ok(())
            }
        }
    }

    /// Create a user on their initial password. The account starts with
    /// `first_login` set and a reset date at the Unix epoch, so the first
    /// successful login always forces a reset. Existing users are left
    /// untouched.
    pub fn provision(&self, username: &str, initial_password: &str) -> PanelResult<Provisioned> {
        if username.trim().is_empty() {
            return Err(PanelError::Validation("Username must not be empty.".into()));
        }
        if self.store.fetch_user(username)?.is_some() {
            log::info!("credentials: user={username} already exists, nothing to do");
            return Ok(Provisioned::AlreadyExists);
        }
        let user = UserCredential {
            username:        username.to_string(),
            password_hash:   self.hasher.hash(initial_password)?,
            last_reset_date: DateTime::<Utc>::from(std::time::UNIX_EPOCH),
            first_login:     true,
        };
        if self.store.insert_user_if_absent(&user)? {
            log::info!("credentials: provisioned user={username}");
            Ok(Provisioned::Created)
        } else {
            Ok(Provisioned::AlreadyExists)
        }
    }
}
