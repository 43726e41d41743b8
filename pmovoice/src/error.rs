//! Types d'erreurs pour pmovoice

use pmocast::CastError;

/// Failures outside of a single command. Command failures become a
/// [`Reply`](crate::response::Reply) instead.
#[derive(Debug, thiserror::Error)]
pub enum SkillError {
    #[error(transparent)]
    Cast(#[from] CastError),

    #[error("Unknown intent: {0}")]
    UnknownIntent(String),

    #[error("Invalid host message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Type Result spécialisé pour pmovoice
pub type Result<T> = std::result::Result<T, SkillError>;
