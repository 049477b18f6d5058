use thiserror::Error;

pub type Result<T> = std::result::Result<T, BackendError>;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// Transport or service failure. Retrying is the caller's call;
    /// nothing in this workspace retries automatically.
    #[error("network error: {0}")]
    Network(String),

    /// Unique-constraint violation: the write was already recorded
    /// (e.g. a second like from the same user). Benign for toggles.
    #[error("duplicate write")]
    Duplicate,

    /// No signed-in user, or the caller lacks the required role.
    #[error("authentication required")]
    AuthRequired,

    #[error("not found: {0}")]
    NotFound(String),
}
