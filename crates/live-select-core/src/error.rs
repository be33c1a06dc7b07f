//! Errors raised by the scheduling primitives.

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The task already ran, was cancelled, or never belonged to this scheduler.
    #[error("scheduled task is no longer queued")]
    InvalidTaskId,
}
