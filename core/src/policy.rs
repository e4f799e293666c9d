//! Password complexity checklist for the reset form.
//!
//! `evaluate` is pure and cheap so the UI can call it on every keystroke.

use serde::Serialize;

use crate::error::{PanelError, PanelResult};

pub const MIN_LENGTH: usize = 8;

/// Characters accepted for the "special character" requirement.
pub const SPECIAL_CHARACTERS: &str = "!@#$%^&*(),.?\":{}|<>";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PasswordRequirements {
    pub length_ok:    bool,
    pub lowercase_ok: bool,
    pub uppercase_ok: bool,
    pub digit_ok:     bool,
    pub special_ok:   bool,
}

impl PasswordRequirements {
    pub fn all_met(&self) -> bool {
        self.length_ok && self.lowercase_ok && self.uppercase_ok && self.digit_ok && self.special_ok
    }

    /// Checklist rows in display order, paired with their status.
    pub fn checklist(&self) -> [(&'static str, bool); 5] {
        [
            ("At least 8 characters", self.length_ok),
            ("At least one lowercase letter (a-z)", self.lowercase_ok),
            ("At least one uppercase letter (A-Z)", self.uppercase_ok),
            ("At least one digit (0-9)", self.digit_ok),
            ("At least one special character (!@#$...)", self.special_ok),
        ]
    }

    pub fn failed_labels(&self) -> Vec<&'static str> {
        self.checklist()
            .into_iter()
            .filter(|(_, met)| !met)
            .map(|(label, _)| label)
            .collect()
    }
}

pub fn evaluate(password: &str) -> PasswordRequirements {
    PasswordRequirements {
        length_ok:    password.chars().count() >= MIN_LENGTH,
        lowercase_ok: password.chars().any(|c| c.is_ascii_lowercase()),
        uppercase_ok: password.chars().any(|c| c.is_ascii_uppercase()),
        digit_ok:     password.chars().any(|c| c.is_ascii_digit()),
        special_ok:   password.chars().any(|c| SPECIAL_CHARACTERS.contains(c)),
    }
}

/// Gate run before a new password is committed. Checks run in the
/// order the reset form reports them: complexity, confirmation, empty.
pub fn validate_new_password(new_password: &str, confirmation: &str) -> PanelResult<()> {
    let requirements = evaluate(new_password);
    if !requirements.all_met() {
        return Err(PanelError::Validation(format!(
            "Password does not meet all requirements: {}",
            requirements.failed_labels().join("; ")
        )));
    }
    if new_password != confirmation {
        return Err(PanelError::Validation("Passwords do not match.".into()));
    }
    if new_password.is_empty() {
        return Err(PanelError::Validation("Please enter a password.".into()));
    }
    Ok(())
}
