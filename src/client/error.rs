use thiserror::Error;

/// Every failure the session layer can surface to an operator.
///
/// Variants carry display-ready text so presentation never sees a raw
/// transport error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// Backend rejected the session config. Text is the backend's detail verbatim.
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Network(String),
    #[error("nothing to send")]
    EmptyInput,
    #[error("still {0}, try again when it finishes")]
    Busy(&'static str),
    #[error("session is not initialized")]
    NotInitialized,
    #[error("session is already initialized")]
    AlreadyInitialized,
    #[error("session view was closed")]
    Detached,
    #[error("invalid backend url '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl ClientError {
    /// Failures the operator can fix by retrying the same action
    pub fn is_retryable(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Busy(_))
    }
}
