//! Salted, memory-hard password hashing (argon2id, PHC string format).

use argon2::{
    password_hash::{PasswordHash, PasswordHasher as _, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;

use crate::{
    config::HashingConfig,
    error::{PanelError, PanelResult},
};

#[derive(Debug, Clone)]
pub struct PasswordHasher {
    params: Params,
}

impl PasswordHasher {
    pub fn new(config: &HashingConfig) -> PanelResult<Self> {
        let params = Params::new(config.memory_kib, config.iterations, config.parallelism, None)
            .map_err(|e| PanelError::Config(format!("argon2 parameters: {e}")))?;
        Ok(Self { params })
    }

    fn argon2(&self) -> Argon2<'static> {
        Argon2::new(Algorithm::Argon2id, Version::V0x13, self.params.clone())
    }

    /// Hash with a fresh random salt. Two calls on the same password
    /// never return the same string.
    pub fn hash(&self, password: &str) -> PanelResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        self.argon2()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| PanelError::Other(anyhow::anyhow!("password hashing failed: {e}")))
    }

    /// Verify against a stored PHC string. The cost parameters embedded
    /// in the stored hash win over the configured ones. A malformed hash
    /// is a mismatch, never an error.
    pub fn verify(&self, password: &str, stored_hash: &str) -> bool {
        let parsed = match PasswordHash::new(stored_hash) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("password: stored hash is malformed: {e}");
                return false;
            }
        };
        self.argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(&crate::config::PanelConfig::default_test().hashing).unwrap()
    }

    #[test]
    fn hash_is_phc_argon2id() {
        let hash = hasher().hash("changeme").unwrap();
        assert!(hash.starts_with("$argon2id$"), "unexpected format: {hash}");
    }

    #[test]
    fn garbage_hash_is_a_mismatch() {
        let h = hasher();
        assert!(!h.verify("changeme", ""));
        assert!(!h.verify("changeme", "not-a-hash"));
        assert!(!h.verify("changeme", "$2b$12$abcdefghijklmnopqrstuv"));
    }

    #[test]
    fn invalid_params_are_config_errors() {
        let config = HashingConfig { memory_kib: 1, iterations: 0, parallelism: 1 };
        assert!(matches!(PasswordHasher::new(&config), Err(PanelError::Config(_))));
    }
}
