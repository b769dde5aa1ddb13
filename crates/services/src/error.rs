//! Shared error types for the services crate.

use thiserror::Error;

use exam_core::model::{
    QuestionId, QuestionValidationError, SessionId, SubmissionRecordError,
};
use storage::repository::StorageError;

/// Errors emitted by the session subsystem.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions match the session configuration")]
    Empty,

    #[error("session already submitted")]
    AlreadySubmitted,

    #[error("session has not been submitted")]
    NotSubmitted,

    #[error("unknown question {0}")]
    UnknownQuestion(QuestionId),

    #[error("question {0} was checked and its answer is locked")]
    AnswerLocked(QuestionId),

    #[error("answer checking is only available in study mode")]
    CheckUnavailable,

    #[error("unknown session {0}")]
    SessionNotFound(SessionId),

    #[error("session {0} already exists")]
    DuplicateSession(SessionId),

    #[error(transparent)]
    Question(#[from] QuestionValidationError),

    #[error(transparent)]
    Record(#[from] SubmissionRecordError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}
