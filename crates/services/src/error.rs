//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{QuizError, RegistrationError};
use storage::question_source::{DataFormatError, UploadError};
use storage::repository::StorageError;

/// Errors emitted by `QuizService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizServiceError {
    #[error("no quiz has been started for this session")]
    NotStarted,
    #[error(transparent)]
    Quiz(#[from] QuizError),
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    DataFormat(#[from] DataFormatError),
    #[error(transparent)]
    Upload(#[from] UploadError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl QuizServiceError {
    /// True for rejections caused by the request itself rather than the server.
    #[must_use]
    pub fn is_rejection(&self) -> bool {
        match self {
            Self::NotStarted | Self::Quiz(_) | Self::Registration(_) => true,
            Self::Upload(err) => !matches!(err, UploadError::Io(_)),
            Self::DataFormat(_) | Self::Storage(_) | Self::Task(_) => false,
        }
    }
}
