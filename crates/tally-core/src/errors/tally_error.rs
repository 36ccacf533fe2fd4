use super::StorageError;

/// Top-level error type for the tally quota system.
/// All subsystem errors convert into this via `From` impls.
///
/// Quota denials are NOT errors — they travel as
/// [`crate::models::gate::GateDecision`] values so callers can tell
/// "upgrade your plan" apart from "something went wrong". Anything here is an
/// infrastructure or caller fault, and a gated action must fail closed on it.
#[derive(Debug, thiserror::Error)]
pub enum TallyError {
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("template not found: {id}")]
    TemplateNotFound { id: String },

    #[error("no subscription on record for user: {user_id}")]
    SubscriptionNotFound { user_id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Convenience type alias.
pub type TallyResult<T> = Result<T, TallyError>;
