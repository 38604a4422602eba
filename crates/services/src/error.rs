//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::QuizError;
use storage::repository::StorageError;

/// Errors emitted by session services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
