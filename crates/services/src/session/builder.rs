use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use std::collections::HashMap;

use exam_core::model::{
    merged_pool, Difficulty, Domain, Mode, Question, QuestionBank, QuestionId, QuestionType,
    SessionId,
};

use super::presentation::Presentation;
use super::service::QuizSession;
use crate::error::SessionError;

//
// ─── SESSION BUILDER ───────────────────────────────────────────────────────────
//

/// Assembles a quiz session from one or more banks.
///
/// Filters the merged question pool by domain, difficulty, and type,
/// optionally shuffles and caps it, and fixes the per-session display
/// order for ordering and matching questions.
pub struct SessionBuilder {
    mode: Mode,
    time_limit_minutes: u32,
    count: Option<usize>,
    domains: Option<Vec<Domain>>,
    difficulties: Option<Vec<Difficulty>>,
    question_types: Option<Vec<QuestionType>>,
    randomize: bool,
}

impl SessionBuilder {
    #[must_use]
    pub fn new(mode: Mode) -> Self {
        Self {
            mode,
            time_limit_minutes: 0,
            count: None,
            domains: None,
            difficulties: None,
            question_types: None,
            randomize: true,
        }
    }

    /// Time limit in minutes; 0 means unlimited.
    #[must_use]
    pub fn with_time_limit_minutes(mut self, minutes: u32) -> Self {
        self.time_limit_minutes = minutes;
        self
    }

    /// Cap the session at this many questions.
    #[must_use]
    pub fn with_count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    /// Keep only questions from these domains.
    #[must_use]
    pub fn with_domains(mut self, domains: Vec<Domain>) -> Self {
        self.domains = Some(domains);
        self
    }

    /// Keep only questions of these difficulties.
    #[must_use]
    pub fn with_difficulties(mut self, difficulties: Vec<Difficulty>) -> Self {
        self.difficulties = Some(difficulties);
        self
    }

    /// Keep only questions of these types.
    #[must_use]
    pub fn with_question_types(mut self, question_types: Vec<QuestionType>) -> Self {
        self.question_types = Some(question_types);
        self
    }

    /// Enable or disable shuffling of question order and display order.
    #[must_use]
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Build a session from the given banks.
    ///
    /// `started_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions survive the filters,
    /// or a validation error if bank ids collide.
    pub fn build(
        self,
        banks: &[QuestionBank],
        started_at: DateTime<Utc>,
    ) -> Result<QuizSession, SessionError> {
        let pool = merged_pool(banks)?;

        let mut selected: Vec<Question> = pool
            .into_iter()
            .filter(|q| {
                self.domains
                    .as_ref()
                    .is_none_or(|domains| domains.contains(&q.domain))
            })
            .filter(|q| {
                self.difficulties
                    .as_ref()
                    .is_none_or(|difficulties| difficulties.contains(&q.difficulty))
            })
            .filter(|q| {
                self.question_types
                    .as_ref()
                    .is_none_or(|types| types.contains(&q.question_type()))
            })
            .collect();

        let mut rng = rand::rng();
        if self.randomize {
            selected.shuffle(&mut rng);
        }
        if let Some(count) = self.count {
            selected.truncate(count);
        }

        let mut presentations: HashMap<QuestionId, Presentation> = HashMap::new();
        for question in &selected {
            if let Some(presentation) =
                Presentation::for_question(question, self.randomize, &mut rng)
            {
                presentations.insert(question.id.clone(), presentation);
            }
        }

        QuizSession::new(
            SessionId::generate(),
            self.mode,
            self.time_limit_minutes,
            banks.iter().map(|b| b.id().clone()).collect(),
            selected,
            presentations,
            started_at,
        )
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
