//! Error types shared across Recompose crates.
//!
//! The taxonomy follows how a failure affects a request:
//! validation failures are rejected before any pixel work, decode failures
//! are fatal for whole-request inputs, and collaborator failures always
//! carry the collaborator's own diagnostic.

/// Top-level error type for Recompose operations.
#[derive(Debug, thiserror::Error)]
pub enum RecomposeError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Decode error: {message}")]
    Decode { message: String },

    #[error("Encode error: {message}")]
    Encode { message: String },

    #[error("{service} failed: {message}")]
    Collaborator { service: String, message: String },

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Not found: {what}")]
    NotFound { what: String },

    #[error("Operation exceeded its {budget_ms} ms budget")]
    Timeout { budget_ms: u64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using RecomposeError.
pub type RecomposeResult<T> = Result<T, RecomposeError>;

impl RecomposeError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode {
            message: msg.into(),
        }
    }

    pub fn collaborator(service: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Collaborator {
            service: service.into(),
            message: msg.into(),
        }
    }

    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage {
            message: msg.into(),
        }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Whether the error was raised before any work began.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Whether the error came from an external collaborator.
    pub fn is_collaborator(&self) -> bool {
        matches!(self, Self::Collaborator { .. })
    }
}
