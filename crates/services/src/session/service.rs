use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use std::fmt;

use exam_core::eval::{evaluate, EvaluationResult};
use exam_core::model::{
    BankId, Mode, Question, QuestionId, QuestionResponse, RecordId, SessionId, SubmittedAnswer,
};
use exam_core::score::ScoreSummary;

use super::presentation::Presentation;
use super::progress::SessionProgress;
use crate::error::SessionError;

//
// ─── SUBMIT OUTCOME ────────────────────────────────────────────────────────────
//

/// What a successful submission produced: the score summary and the id of
/// the persisted record.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub summary: ScoreSummary,
    pub record_id: RecordId,
}

//
// ─── QUIZ SESSION ──────────────────────────────────────────────────────────────
//

/// One in-progress quiz attempt.
///
/// Owns the mutable attempt state: recorded answers, study-mode check
/// results, flags, and the one-way submitted transition. Question
/// definitions are immutable and shared; this struct only ever reads them.
pub struct QuizSession {
    id: SessionId,
    mode: Mode,
    time_limit_minutes: u32,
    bank_ids: Vec<BankId>,
    questions: Vec<Question>,
    presentations: HashMap<QuestionId, Presentation>,
    answers: HashMap<QuestionId, SubmittedAnswer>,
    checked: HashMap<QuestionId, EvaluationResult>,
    flags: HashSet<QuestionId>,
    started_at: DateTime<Utc>,
    outcome: Option<SubmitOutcome>,
}

impl QuizSession {
    /// Create a session over an ordered, non-empty question selection.
    ///
    /// `started_at` should come from the services layer clock to keep time
    /// deterministic.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(
        id: SessionId,
        mode: Mode,
        time_limit_minutes: u32,
        bank_ids: Vec<BankId>,
        questions: Vec<Question>,
        presentations: HashMap<QuestionId, Presentation>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            id,
            mode,
            time_limit_minutes,
            bank_ids,
            questions,
            presentations,
            answers: HashMap::new(),
            checked: HashMap::new(),
            flags: HashSet::new(),
            started_at,
            outcome: None,
        })
    }

    #[must_use]
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    #[must_use]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Configured time limit in minutes; 0 means unlimited.
    #[must_use]
    pub fn time_limit_minutes(&self) -> u32 {
        self.time_limit_minutes
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
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Display data fixed for this session, if the question type has any.
    #[must_use]
    pub fn presentation(&self, question_id: &QuestionId) -> Option<&Presentation> {
        self.presentations.get(question_id)
    }

    #[must_use]
    pub fn answer(&self, question_id: &QuestionId) -> Option<&SubmittedAnswer> {
        self.answers.get(question_id)
    }

    #[must_use]
    pub fn checked_result(&self, question_id: &QuestionId) -> Option<&EvaluationResult> {
        self.checked.get(question_id)
    }

    #[must_use]
    pub fn is_flagged(&self, question_id: &QuestionId) -> bool {
        self.flags.contains(question_id)
    }

    #[must_use]
    pub fn is_submitted(&self) -> bool {
        self.outcome.is_some()
    }

    /// The stored submission outcome, once the session has been submitted.
    #[must_use]
    pub fn outcome(&self) -> Option<&SubmitOutcome> {
        self.outcome.as_ref()
    }

    /// Returns a summary of the current session progress.
    #[must_use]
    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            total: self.questions.len(),
            answered: self.answers.len(),
            checked: self.checked.len(),
            flagged: self.flags.len(),
            is_submitted: self.is_submitted(),
        }
    }

    fn question(&self, question_id: &QuestionId) -> Result<&Question, SessionError> {
        self.questions
            .iter()
            .find(|q| &q.id == question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))
    }

    /// Record (or overwrite) an answer for a question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission,
    /// `SessionError::UnknownQuestion` for a question outside this session,
    /// and `SessionError::AnswerLocked` once the question has been checked.
    pub fn record_answer(
        &mut self,
        question_id: &QuestionId,
        answer: SubmittedAnswer,
    ) -> Result<(), SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        self.question(question_id)?;
        if self.checked.contains_key(question_id) {
            return Err(SessionError::AnswerLocked(question_id.clone()));
        }
        self.answers.insert(question_id.clone(), answer);
        Ok(())
    }

    /// Grade one question now and lock its answer (study mode).
    ///
    /// Checking is idempotent: a second call returns the stored result
    /// without invoking the evaluator again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CheckUnavailable` in exam mode,
    /// `SessionError::AlreadySubmitted` after submission, and
    /// `SessionError::UnknownQuestion` for a question outside this session.
    pub fn check(&mut self, question_id: &QuestionId) -> Result<&EvaluationResult, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        if self.mode != Mode::Study {
            return Err(SessionError::CheckUnavailable);
        }
        if !self.checked.contains_key(question_id) {
            let result = {
                let question = self.question(question_id)?;
                evaluate(question, self.answers.get(question_id))
            };
            self.checked.insert(question_id.clone(), result);
        }
        self.checked
            .get(question_id)
            .ok_or_else(|| SessionError::UnknownQuestion(question_id.clone()))
    }

    /// Toggle the review flag on a question. Pure bookkeeping, no grading
    /// effect. Returns the new flag state.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadySubmitted` after submission and
    /// `SessionError::UnknownQuestion` for a question outside this session.
    pub fn toggle_flag(&mut self, question_id: &QuestionId) -> Result<bool, SessionError> {
        if self.is_submitted() {
            return Err(SessionError::AlreadySubmitted);
        }
        self.question(question_id)?;
        if self.flags.remove(question_id) {
            Ok(false)
        } else {
            self.flags.insert(question_id.clone());
            Ok(true)
        }
    }

    /// Cap client-reported elapsed time at the configured limit.
    #[must_use]
    pub fn clamp_elapsed(&self, reported_elapsed_seconds: u32) -> u32 {
        if self.time_limit_minutes == 0 {
            return reported_elapsed_seconds;
        }
        reported_elapsed_seconds.min(self.time_limit_minutes * 60)
    }

    /// Grade every question, reusing stored check results where present.
    #[must_use]
    pub(crate) fn evaluate_all(&self) -> Vec<(Question, EvaluationResult)> {
        self.questions
            .iter()
            .map(|question| {
                let result = self
                    .checked
                    .get(&question.id)
                    .cloned()
                    .unwrap_or_else(|| evaluate(question, self.answers.get(&question.id)));
                (question.clone(), result)
            })
            .collect()
    }

    /// Pair graded results with the answers that produced them, for the
    /// submission record.
    pub(crate) fn build_responses(
        &self,
        results: &[(Question, EvaluationResult)],
    ) -> Vec<QuestionResponse> {
        results
            .iter()
            .map(|(question, result)| QuestionResponse {
                question_id: question.id.clone(),
                question_type: question.question_type(),
                domain: question.domain,
                objective: question.objective.clone(),
                submitted: self.answers.get(&question.id).cloned(),
                correct_answer: result.correct_answer.clone(),
                is_correct: result.is_correct,
                score: result.score,
            })
            .collect()
    }

    /// Store the submission outcome. The first outcome wins; the
    /// transition never reverts.
    pub(crate) fn mark_submitted(&mut self, outcome: SubmitOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("id", &self.id)
            .field("mode", &self.mode)
            .field("questions_len", &self.questions.len())
            .field("answered", &self.answers.len())
            .field("checked", &self.checked.len())
            .field("started_at", &self.started_at)
            .field("submitted", &self.is_submitted())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{ChoiceOption, Difficulty, Domain, QuestionKind};
    use exam_core::time::fixed_now;

    fn mc_question(id: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            domain: Domain::ProjectManagementConcepts,
            objective: "1.1".to_string(),
            difficulty: Difficulty::Easy,
            prompt: "Pick a.".to_string(),
            explanation: String::new(),
            kind: QuestionKind::MultipleChoice {
                options: vec![
                    ChoiceOption {
                        key: "a".to_string(),
                        text: "A".to_string(),
                    },
                    ChoiceOption {
                        key: "b".to_string(),
                        text: "B".to_string(),
                    },
                ],
                correct: "a".to_string(),
            },
        }
    }

    fn build_session(mode: Mode, ids: &[&str]) -> QuizSession {
        QuizSession::new(
            SessionId::new("s1"),
            mode,
            0,
            vec![BankId::new("b1")],
            ids.iter().map(|id| mc_question(id)).collect(),
            HashMap::new(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn empty_session_returns_error() {
        let err = QuizSession::new(
            SessionId::new("s1"),
            Mode::Study,
            0,
            Vec::new(),
            Vec::new(),
            HashMap::new(),
            fixed_now(),
        )
        .unwrap_err();
        assert!(matches!(err, SessionError::Empty));
    }

    #[test]
    fn record_answer_overwrites_prior_value() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        let q1 = QuestionId::new("q1");

        session
            .record_answer(&q1, SubmittedAnswer::Choice("b".to_string()))
            .unwrap();
        session
            .record_answer(&q1, SubmittedAnswer::Choice("a".to_string()))
            .unwrap();

        assert_eq!(
            session.answer(&q1),
            Some(&SubmittedAnswer::Choice("a".to_string()))
        );
    }

    #[test]
    fn record_answer_rejects_unknown_question() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        let err = session
            .record_answer(
                &QuestionId::new("nope"),
                SubmittedAnswer::Choice("a".to_string()),
            )
            .unwrap_err();
        assert!(matches!(err, SessionError::UnknownQuestion(_)));
    }

    #[test]
    fn check_is_study_mode_only() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        let err = session.check(&QuestionId::new("q1")).unwrap_err();
        assert!(matches!(err, SessionError::CheckUnavailable));
    }

    #[test]
    fn check_grades_and_locks_the_answer() {
        let mut session = build_session(Mode::Study, &["q1"]);
        let q1 = QuestionId::new("q1");
        session
            .record_answer(&q1, SubmittedAnswer::Choice("a".to_string()))
            .unwrap();

        let result = session.check(&q1).unwrap().clone();
        assert!(result.is_correct);

        let err = session
            .record_answer(&q1, SubmittedAnswer::Choice("b".to_string()))
            .unwrap_err();
        assert!(matches!(err, SessionError::AnswerLocked(_)));
    }

    #[test]
    fn second_check_returns_the_stored_result() {
        let mut session = build_session(Mode::Study, &["q1"]);
        let q1 = QuestionId::new("q1");
        session
            .record_answer(&q1, SubmittedAnswer::Choice("b".to_string()))
            .unwrap();

        let first = session.check(&q1).unwrap().clone();
        assert!(!first.is_correct);

        let second = session.check(&q1).unwrap().clone();
        assert_eq!(first, second);
    }

    #[test]
    fn check_of_unanswered_question_scores_zero() {
        let mut session = build_session(Mode::Study, &["q1"]);
        let result = session.check(&QuestionId::new("q1")).unwrap();
        assert!(!result.is_correct);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn toggle_flag_flips_state() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        let q1 = QuestionId::new("q1");
        assert!(session.toggle_flag(&q1).unwrap());
        assert!(session.is_flagged(&q1));
        assert!(!session.toggle_flag(&q1).unwrap());
        assert!(!session.is_flagged(&q1));
    }

    #[test]
    fn clamp_caps_reported_time_at_the_limit() {
        let session = QuizSession::new(
            SessionId::new("s1"),
            Mode::Exam,
            100,
            vec![BankId::new("b1")],
            vec![mc_question("q1")],
            HashMap::new(),
            fixed_now(),
        )
        .unwrap();
        assert_eq!(session.clamp_elapsed(5_999), 5_999);
        assert_eq!(session.clamp_elapsed(9_000), 6_000);
    }

    #[test]
    fn unlimited_sessions_do_not_clamp() {
        let session = build_session(Mode::Study, &["q1"]);
        assert_eq!(session.clamp_elapsed(1_000_000), 1_000_000);
    }

    #[test]
    fn evaluate_all_reuses_checked_results() {
        let mut session = build_session(Mode::Study, &["q1", "q2"]);
        let q1 = QuestionId::new("q1");
        session
            .record_answer(&q1, SubmittedAnswer::Choice("a".to_string()))
            .unwrap();
        let checked = session.check(&q1).unwrap().clone();

        let results = session.evaluate_all();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].1, checked);
        // q2 was never answered: graded as incorrect at submit time.
        assert!(!results[1].1.is_correct);
    }

    #[test]
    fn mutation_after_submission_is_rejected() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        session.mark_submitted(SubmitOutcome {
            summary: exam_core::score::aggregate(
                &session.evaluate_all(),
                &exam_core::score::ScorePolicy::default(),
                0,
            ),
            record_id: RecordId::new("r1"),
        });

        let q1 = QuestionId::new("q1");
        assert!(matches!(
            session.record_answer(&q1, SubmittedAnswer::Choice("a".to_string())),
            Err(SessionError::AlreadySubmitted)
        ));
        assert!(matches!(
            session.toggle_flag(&q1),
            Err(SessionError::AlreadySubmitted)
        ));
    }

    #[test]
    fn first_submission_outcome_wins() {
        let mut session = build_session(Mode::Exam, &["q1"]);
        let summary = exam_core::score::aggregate(
            &session.evaluate_all(),
            &exam_core::score::ScorePolicy::default(),
            0,
        );
        session.mark_submitted(SubmitOutcome {
            summary: summary.clone(),
            record_id: RecordId::new("r1"),
        });
        session.mark_submitted(SubmitOutcome {
            summary,
            record_id: RecordId::new("r2"),
        });
        assert_eq!(
            session.outcome().unwrap().record_id,
            RecordId::new("r1")
        );
    }
}
