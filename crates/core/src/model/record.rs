use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::answer::{AnswerKey, SubmittedAnswer};
use crate::model::ids::{BankId, QuestionId, SessionId};
use crate::model::question::{Domain, QuestionType};
use crate::score::ScoreSummary;

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How a quiz attempt is run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Per-question answer checking is available before submission.
    Study,
    /// Timed, no feedback until submission.
    Exam,
}

impl Mode {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Study => "study",
            Mode::Exam => "exam",
        }
    }
}

//
// ─── SUBMISSION RECORD ─────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SubmissionRecordError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("summary counts {total} questions but {responses} responses were recorded")]
    ResponseCountMismatch { total: usize, responses: usize },

    #[error("correct_count {correct} exceeds question count {total}")]
    CorrectCountTooLarge { correct: usize, total: usize },
}

/// One graded question as persisted with a submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionResponse {
    pub question_id: QuestionId,
    pub question_type: QuestionType,
    pub domain: Domain,
    pub objective: String,
    /// `None` when the question was left unanswered.
    pub submitted: Option<SubmittedAnswer>,
    pub correct_answer: AnswerKey,
    pub is_correct: bool,
    pub score: f64,
}

/// Persisted summary of one completed quiz attempt.
///
/// Created exactly once per session, at submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionRecord {
    session_id: SessionId,
    mode: Mode,
    bank_ids: Vec<BankId>,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    summary: ScoreSummary,
    responses: Vec<QuestionResponse>,
}

impl SubmissionRecord {
    /// Assemble a record from a freshly graded session.
    ///
    /// # Errors
    ///
    /// Returns `SubmissionRecordError` if the timestamps are inverted or
    /// the summary does not line up with the responses.
    pub fn new(
        session_id: SessionId,
        mode: Mode,
        bank_ids: Vec<BankId>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        summary: ScoreSummary,
        responses: Vec<QuestionResponse>,
    ) -> Result<Self, SubmissionRecordError> {
        if completed_at < started_at {
            return Err(SubmissionRecordError::InvalidTimeRange);
        }
        if summary.total_questions != responses.len() {
            return Err(SubmissionRecordError::ResponseCountMismatch {
                total: summary.total_questions,
                responses: responses.len(),
            });
        }
        if summary.correct_count > summary.total_questions {
            return Err(SubmissionRecordError::CorrectCountTooLarge {
                correct: summary.correct_count,
                total: summary.total_questions,
            });
        }

        Ok(Self {
            session_id,
            mode,
            bank_ids,
            started_at,
            completed_at,
            summary,
            responses,
        })
    }

    /// Rehydrate a record from persisted storage.
    ///
    /// # Errors
    ///
    /// Same validation as [`SubmissionRecord::new`].
    pub fn from_persisted(
        session_id: SessionId,
        mode: Mode,
        bank_ids: Vec<BankId>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        summary: ScoreSummary,
        responses: Vec<QuestionResponse>,
    ) -> Result<Self, SubmissionRecordError> {
        Self::new(
            session_id,
            mode,
            bank_ids,
            started_at,
            completed_at,
            summary,
            responses,
        )
    }

    #[must_use]
    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    #[must_use]
    pub fn bank_ids(&self) -> &[BankId] {
        &self.bank_ids
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn summary(&self) -> &ScoreSummary {
        &self.summary
    }

    #[must_use]
    pub fn responses(&self) -> &[QuestionResponse] {
        &self.responses
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn empty_summary() -> ScoreSummary {
        ScoreSummary {
            total_questions: 0,
            correct_count: 0,
            earned_points: 0.0,
            raw_percentage: 0.0,
            scaled_score: 100,
            passed: false,
            elapsed_seconds: 0,
            domain_breakdown: Vec::new(),
        }
    }

    #[test]
    fn rejects_inverted_time_range() {
        let now = fixed_now();
        let earlier = now - chrono::Duration::minutes(5);
        let err = SubmissionRecord::new(
            SessionId::new("s1"),
            Mode::Exam,
            vec![BankId::new("b1")],
            now,
            earlier,
            empty_summary(),
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, SubmissionRecordError::InvalidTimeRange));
    }

    #[test]
    fn rejects_summary_response_mismatch() {
        let now = fixed_now();
        let mut summary = empty_summary();
        summary.total_questions = 3;
        let err = SubmissionRecord::new(
            SessionId::new("s1"),
            Mode::Study,
            vec![BankId::new("b1")],
            now,
            now,
            summary,
            Vec::new(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            SubmissionRecordError::ResponseCountMismatch { .. }
        ));
    }

    #[test]
    fn valid_record_round_trips_accessors() {
        let now = fixed_now();
        let record = SubmissionRecord::new(
            SessionId::new("s1"),
            Mode::Exam,
            vec![BankId::new("b1"), BankId::new("b2")],
            now,
            now + chrono::Duration::minutes(90),
            empty_summary(),
            Vec::new(),
        )
        .unwrap();
        assert_eq!(record.session_id(), &SessionId::new("s1"));
        assert_eq!(record.mode(), Mode::Exam);
        assert_eq!(record.bank_ids().len(), 2);
        assert!(!record.summary().passed);
    }
}
