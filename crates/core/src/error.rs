use thiserror::Error;

use crate::model::QuestionValidationError;
use crate::model::SubmissionRecordError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    QuestionValidation(#[from] QuestionValidationError),
    #[error(transparent)]
    SubmissionRecord(#[from] SubmissionRecordError),
}
