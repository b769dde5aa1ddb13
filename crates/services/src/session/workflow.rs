use std::sync::Arc;

use exam_core::eval::EvaluationResult;
use exam_core::model::{
    Mode, QuestionBank, QuestionId, SessionId, SubmissionRecord, SubmittedAnswer,
};
use exam_core::score::{aggregate, ScorePolicy};
use exam_core::Clock;
use storage::repository::HistoryRepository;

use super::builder::SessionBuilder;
use super::progress::SessionProgress;
use super::service::SubmitOutcome;
use super::store::SessionStore;
use crate::error::SessionError;

//
// ─── QUIZ SERVICE ──────────────────────────────────────────────────────────────
//

/// Orchestrates the session lifecycle against the history store.
///
/// Sessions are created on quiz start, mutated through the attempt, and
/// submitted exactly once; the per-session lock in [`SessionStore`] makes
/// the submitted transition atomic even under a duplicate request.
#[derive(Clone)]
pub struct QuizService {
    clock: Clock,
    history: Arc<dyn HistoryRepository>,
    policy: ScorePolicy,
    store: SessionStore,
}

impl QuizService {
    #[must_use]
    pub fn new(clock: Clock, history: Arc<dyn HistoryRepository>) -> Self {
        Self {
            clock,
            history,
            policy: ScorePolicy::default(),
            store: SessionStore::new(),
        }
    }

    /// Override the scoring policy (scale endpoints and cut score).
    #[must_use]
    pub fn with_policy(mut self, policy: ScorePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Build a session from the given banks and register it.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for an empty selection or id collisions.
    pub fn start(
        &self,
        builder: SessionBuilder,
        banks: &[QuestionBank],
    ) -> Result<SessionId, SessionError> {
        let session = builder.build(banks, self.clock.now())?;
        self.store.insert(session)
    }

    /// Record an answer for a question in an in-progress session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` if the session or question is unknown, the
    /// session was submitted, or the question's answer is locked.
    pub async fn record_answer(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
        answer: SubmittedAnswer,
    ) -> Result<(), SessionError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        session.record_answer(question_id, answer)
    }

    /// Grade one question now and lock its answer (study mode only).
    ///
    /// Repeated checks return the stored result without re-grading.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::CheckUnavailable` in exam mode, or the usual
    /// session and question lookup errors.
    pub async fn check(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
    ) -> Result<EvaluationResult, SessionError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        session.check(question_id).cloned()
    }

    /// Toggle the review flag on a question. Returns the new flag state.
    ///
    /// # Errors
    ///
    /// Returns the usual session and question lookup errors.
    pub async fn toggle_flag(
        &self,
        session_id: &SessionId,
        question_id: &QuestionId,
    ) -> Result<bool, SessionError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;
        session.toggle_flag(question_id)
    }

    /// Progress counters for a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` for an unknown session.
    pub async fn progress(&self, session_id: &SessionId) -> Result<SessionProgress, SessionError> {
        let handle = self.store.get(session_id)?;
        let session = handle.lock().await;
        Ok(session.progress())
    }

    /// Submit a session: grade every question, aggregate, persist, and
    /// flip the submitted flag.
    ///
    /// The session lock is held across the whole transition, so a
    /// duplicate near-simultaneous submit waits and then receives the
    /// stored outcome; nothing is re-evaluated or re-persisted. The flag
    /// is only set after persistence succeeds, which keeps a failed
    /// submit retryable.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if persistence fails (the session
    /// stays in progress), or `SessionError::SessionNotFound`.
    pub async fn submit(
        &self,
        session_id: &SessionId,
        reported_elapsed_seconds: u32,
    ) -> Result<SubmitOutcome, SessionError> {
        let handle = self.store.get(session_id)?;
        let mut session = handle.lock().await;

        if let Some(outcome) = session.outcome() {
            return Ok(outcome.clone());
        }

        let completed_at = self.clock.now();
        let elapsed = session.clamp_elapsed(reported_elapsed_seconds);
        let results = session.evaluate_all();
        let summary = aggregate(&results, &self.policy, elapsed);
        let responses = session.build_responses(&results);

        let record = SubmissionRecord::new(
            session.id().clone(),
            session.mode(),
            session.bank_ids().to_vec(),
            session.started_at(),
            completed_at,
            summary.clone(),
            responses,
        )?;

        let record_id = self.history.save(&record).await?;
        let outcome = SubmitOutcome { summary, record_id };
        session.mark_submitted(outcome.clone());
        Ok(outcome)
    }

    /// Force-submit an exam session whose time limit has expired, capping
    /// the elapsed time at the configured limit.
    ///
    /// # Errors
    ///
    /// Same as [`QuizService::submit`].
    pub async fn submit_expired(
        &self,
        session_id: &SessionId,
    ) -> Result<SubmitOutcome, SessionError> {
        let limit_seconds = {
            let handle = self.store.get(session_id)?;
            let session = handle.lock().await;
            session.time_limit_minutes() * 60
        };
        self.submit(session_id, limit_seconds).await
    }

    /// Evict a submitted session from the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitted` while the attempt is still in
    /// progress, or `SessionError::SessionNotFound`.
    pub async fn archive(&self, session_id: &SessionId) -> Result<(), SessionError> {
        let handle = self.store.get(session_id)?;
        {
            let session = handle.lock().await;
            if !session.is_submitted() {
                return Err(SessionError::NotSubmitted);
            }
        }
        self.store.remove(session_id)?;
        Ok(())
    }

    /// Load all persisted submission history, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if history cannot be read.
    pub async fn history(&self) -> Result<Vec<SubmissionRecord>, SessionError> {
        Ok(self.history.load_history().await?)
    }

    /// Exam mode strips answer keys from what the client sees; study mode
    /// keeps them. Convenience for the presentation layer.
    #[must_use]
    pub fn reveals_answers(mode: Mode) -> bool {
        mode == Mode::Study
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
