use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::{BankId, QuestionId};
use crate::model::question::{Domain, Question, QuestionType, QuestionValidationError};

//
// ─── QUESTION BANK ─────────────────────────────────────────────────────────────
//

/// A named, validated collection of questions.
///
/// Constructing a bank runs every question's invariant checks and enforces
/// id uniqueness, so downstream consumers can treat the question sequence
/// as immutable and well-formed. How banks are discovered and parsed is the
/// loader collaborator's concern, not this crate's.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionBank {
    id: BankId,
    title: String,
    description: String,
    version: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Validate and assemble a bank from already-deserialized questions.
    ///
    /// # Errors
    ///
    /// Returns the first [`QuestionValidationError`] found: a variant
    /// invariant violation or a duplicate question id.
    pub fn new(
        id: BankId,
        title: impl Into<String>,
        description: impl Into<String>,
        version: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, QuestionValidationError> {
        let mut seen = BTreeSet::new();
        for question in &questions {
            question.validate()?;
            if !seen.insert(question.id.clone()) {
                return Err(QuestionValidationError::DuplicateQuestionId {
                    id: question.id.clone(),
                });
            }
        }
        Ok(Self {
            id,
            title: title.into(),
            description: description.into(),
            version: version.into(),
            questions,
        })
    }

    #[must_use]
    pub fn id(&self) -> &BankId {
        &self.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Per-type and per-domain counts for bank listings.
    #[must_use]
    pub fn summary(&self) -> BankSummary {
        let mut type_counts: BTreeMap<QuestionType, usize> = BTreeMap::new();
        let mut domain_counts: BTreeMap<Domain, usize> = BTreeMap::new();
        for question in &self.questions {
            *type_counts.entry(question.question_type()).or_default() += 1;
            *domain_counts.entry(question.domain).or_default() += 1;
        }
        BankSummary {
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            version: self.version.clone(),
            question_count: self.questions.len(),
            type_counts,
            domain_counts,
        }
    }
}

/// Metadata about a bank, for listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankSummary {
    pub id: BankId,
    pub title: String,
    pub description: String,
    pub version: String,
    pub question_count: usize,
    pub type_counts: BTreeMap<QuestionType, usize>,
    pub domain_counts: BTreeMap<Domain, usize>,
}

/// Merge several banks into one question pool, enforcing that question ids
/// stay unique across all of them.
///
/// # Errors
///
/// Returns `QuestionValidationError::DuplicateQuestionId` if two banks
/// share a question id.
pub fn merged_pool(banks: &[QuestionBank]) -> Result<Vec<Question>, QuestionValidationError> {
    let mut seen: BTreeSet<QuestionId> = BTreeSet::new();
    let mut pool = Vec::new();
    for bank in banks {
        for question in bank.questions() {
            if !seen.insert(question.id.clone()) {
                return Err(QuestionValidationError::DuplicateQuestionId {
                    id: question.id.clone(),
                });
            }
            pool.push(question.clone());
        }
    }
    Ok(pool)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
