use aduan_backend::BackendError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, FeedError>;

/// Failures that escape a feed component as an error. Mutation outcomes
/// (rate limits, locks, rollbacks) surface as [`crate::Resolution`] and
/// notices instead, never as errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error(transparent)]
    Backend(#[from] BackendError),

    #[error("authentication required")]
    AuthRequired,
}
