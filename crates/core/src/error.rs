//! Error taxonomy for the core triage services.
//!
//! Two error families matter to callers:
//!
//! - [`TriageError::InvalidInput`] — a submission or decision was rejected
//!   before any scoring or persistence took place.
//! - [`TriageError::Configuration`] — the classifier configuration is
//!   unusable. The classifier never silently substitutes defaults; the
//!   caller decides whether to fall back to a last-known-good value.
//!
//! The remaining variants wrap storage failures with the operation that
//! produced them.

/// Errors produced by core triage operations.
#[derive(Debug, thiserror::Error)]
pub enum TriageError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid classifier configuration: {0}")]
    Configuration(String),
    #[error("referral not found: {0}")]
    NotFound(String),
    #[error("referral already decided: {0}")]
    AlreadyDecided(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create referral directory: {0}")]
    ReferralDirCreation(std::io::Error),
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
}

impl From<retria_types::TextError> for TriageError {
    fn from(err: retria_types::TextError) -> Self {
        TriageError::InvalidInput(err.to_string())
    }
}

pub type TriageResult<T> = std::result::Result<T, TriageError>;
