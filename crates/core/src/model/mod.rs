mod answer;
mod bank;
mod ids;
mod question;
mod record;

pub use answer::{AnswerKey, SubmittedAnswer};
pub use bank::{merged_pool, BankSummary, QuestionBank};
pub use ids::{BankId, PartId, QuestionId, RecordId, SessionId};

pub use question::{
    ChoiceOption, Difficulty, Domain, DragItem, MatchPair, Part, PartKind, Question, QuestionKind,
    QuestionType, QuestionValidationError,
};
pub use record::{Mode, QuestionResponse, SubmissionRecord, SubmissionRecordError};
