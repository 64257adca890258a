#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CoreError {
    /// Input rejected before it reached the backend.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The operation was invoked with inputs that can never produce a
    /// meaningful request (e.g. an allocation with no assignees).
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The action conflicts with one already in progress.
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
