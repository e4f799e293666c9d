use thiserror::Error;

/// Every failure the panel core can surface.
///
/// `Transport` and `Inference` are kept apart from `Authentication` and
/// `NotFound` so callers can tell "credentials wrong" from "system
/// unavailable". None of these are fatal to the process.
#[derive(Error, Debug)]
pub enum PanelError {
    #[error("{what} '{key}' not found")]
    NotFound { what: &'static str, key: String },

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Store unavailable: {0}")]
    Transport(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Prediction failed: {0}")]
    Inference(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for PanelError {
    fn from(e: rusqlite::Error) -> Self {
        PanelError::Transport(e.to_string())
    }
}

impl From<std::io::Error> for PanelError {
    fn from(e: std::io::Error) -> Self {
        PanelError::Transport(e.to_string())
    }
}

impl PanelError {
    pub fn not_found(what: &'static str, key: impl Into<String>) -> Self {
        PanelError::NotFound { what, key: key.into() }
    }

    /// True when the same request may succeed later without any change
    /// from the user (store or model layer trouble).
    pub fn is_retryable(&self) -> bool {
        matches!(self, PanelError::Transport(_) | PanelError::Inference(_))
    }

    /// Message suitable for showing to the end user.
    pub fn user_message(&self) -> String {
        match self {
            PanelError::NotFound { what, key } => format!("{what} '{key}' was not found."),
            PanelError::Authentication(reason) => reason.clone(),
            PanelError::Transport(_) => {
                "The service is unavailable right now. Please try again.".to_string()
            }
            PanelError::Validation(reason) => reason.clone(),
            PanelError::Inference(_) => "The prediction could not be computed.".to_string(),
            PanelError::Serialization(_) | PanelError::Config(_) | PanelError::Other(_) => {
                format!("Unexpected error: {self}")
            }
        }
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
