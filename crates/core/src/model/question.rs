use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use thiserror::Error;

use crate::model::ids::{PartId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// A question payload violates its variant invariant.
///
/// Banks are expected to be validated at load time; evaluation additionally
/// fails closed if a malformed question is ever seen live.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionValidationError {
    #[error("question {id} has no options")]
    NoOptions { id: QuestionId },

    #[error("question {id}: correct key {key:?} is not among the options")]
    UnknownCorrectKey { id: QuestionId, key: String },

    #[error("question {id}: select_count {select_count} exceeds option count {options}")]
    SelectCountTooLarge {
        id: QuestionId,
        select_count: usize,
        options: usize,
    },

    #[error("question {id}: answer key has {correct} keys but select_count is {select_count}")]
    SelectCountMismatch {
        id: QuestionId,
        select_count: usize,
        correct: usize,
    },

    #[error("question {id} has no pairs")]
    NoPairs { id: QuestionId },

    #[error("question {id}: correct_order is not a permutation of items")]
    NotAPermutation { id: QuestionId },

    #[error("question {id} declares no categories")]
    NoCategories { id: QuestionId },

    #[error("question {id}: item {item:?} targets undeclared category {category:?}")]
    UndeclaredCategory {
        id: QuestionId,
        item: String,
        category: String,
    },

    #[error("question {id} accepts no answer forms")]
    NoAcceptedAnswers { id: QuestionId },

    #[error("question {id} has no parts")]
    NoParts { id: QuestionId },

    #[error("question {id}: duplicate part id {part}")]
    DuplicatePartId { id: QuestionId, part: PartId },

    #[error("duplicate question id {id}")]
    DuplicateQuestionId { id: QuestionId },
}

//
// ─── DOMAIN & DIFFICULTY ───────────────────────────────────────────────────────
//

/// Top-level exam content category, used for weighting and breakdown reporting.
///
/// The four PK0-005 domains, serialized by their exam blueprint number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Domain {
    #[serde(rename = "1")]
    ProjectManagementConcepts,
    #[serde(rename = "2")]
    ProjectLifeCyclePhases,
    #[serde(rename = "3")]
    ToolsAndDocumentation,
    #[serde(rename = "4")]
    BasicsOfItAndGovernance,
}

impl Domain {
    /// All domains in blueprint order.
    pub const ALL: [Domain; 4] = [
        Domain::ProjectManagementConcepts,
        Domain::ProjectLifeCyclePhases,
        Domain::ToolsAndDocumentation,
        Domain::BasicsOfItAndGovernance,
    ];

    /// Human-readable domain name from the exam blueprint.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Domain::ProjectManagementConcepts => "Project Management Concepts",
            Domain::ProjectLifeCyclePhases => "Project Life Cycle Phases",
            Domain::ToolsAndDocumentation => "Tools and Documentation",
            Domain::BasicsOfItAndGovernance => "Basics of IT and Governance",
        }
    }

    /// Blueprint weight of this domain in the overall exam.
    #[must_use]
    pub fn weight(self) -> f64 {
        match self {
            Domain::ProjectManagementConcepts => 0.33,
            Domain::ProjectLifeCyclePhases => 0.30,
            Domain::ToolsAndDocumentation => 0.19,
            Domain::BasicsOfItAndGovernance => 0.18,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Author-assigned difficulty of a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

//
// ─── QUESTION VARIANTS ─────────────────────────────────────────────────────────
//

/// One selectable option of a choice-style question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub key: String,
    pub text: String,
}

/// One left/right pair of a matching question; the answer key is the
/// implicit left-to-right mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchPair {
    pub left: String,
    pub right: String,
}

/// One draggable item and the category it belongs in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragItem {
    pub text: String,
    pub correct_category: String,
}

/// Variant payload of a question, tagged by its `type` field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
        correct: String,
    },
    MultipleSelect {
        options: Vec<ChoiceOption>,
        select_count: usize,
        correct: BTreeSet<String>,
    },
    Matching {
        pairs: Vec<MatchPair>,
    },
    Ordering {
        items: Vec<String>,
        correct_order: Vec<String>,
    },
    DragDrop {
        categories: Vec<String>,
        items: Vec<DragItem>,
    },
    FillIn {
        correct_answers: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
    Scenario {
        scenario: String,
        parts: Vec<Part>,
    },
}

/// Discriminant of [`QuestionKind`], used for filtering and reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    MultipleSelect,
    Matching,
    Ordering,
    DragDrop,
    FillIn,
    Scenario,
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            QuestionType::MultipleChoice => "Multiple Choice",
            QuestionType::MultipleSelect => "Multiple Select",
            QuestionType::Matching => "Matching",
            QuestionType::Ordering => "Ordering / Sequencing",
            QuestionType::DragDrop => "Drag and Drop",
            QuestionType::FillIn => "Fill in the Blank",
            QuestionType::Scenario => "Scenario-Based",
        };
        f.write_str(label)
    }
}

//
// ─── SCENARIO PARTS ────────────────────────────────────────────────────────────
//

/// Variant payload of a scenario part. Parts are restricted to the simple
/// answer shapes; nested scenarios are impossible by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PartKind {
    MultipleChoice {
        options: Vec<ChoiceOption>,
        correct: String,
    },
    MultipleSelect {
        options: Vec<ChoiceOption>,
        select_count: usize,
        correct: BTreeSet<String>,
    },
    FillIn {
        correct_answers: Vec<String>,
        #[serde(default)]
        case_sensitive: bool,
    },
}

/// One independently graded sub-question of a scenario, scoped under the
/// parent question id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    pub id: PartId,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub kind: PartKind,
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

/// A single exam question: common metadata plus its variant payload.
///
/// Questions are immutable once loaded and shared read-only across every
/// session that references the same bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub domain: Domain,
    pub objective: String,
    pub difficulty: Difficulty,
    #[serde(rename = "question")]
    pub prompt: String,
    #[serde(default)]
    pub explanation: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
}

impl Question {
    /// Discriminant of this question's variant.
    #[must_use]
    pub fn question_type(&self) -> QuestionType {
        match &self.kind {
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
            QuestionKind::MultipleSelect { .. } => QuestionType::MultipleSelect,
            QuestionKind::Matching { .. } => QuestionType::Matching,
            QuestionKind::Ordering { .. } => QuestionType::Ordering,
            QuestionKind::DragDrop { .. } => QuestionType::DragDrop,
            QuestionKind::FillIn { .. } => QuestionType::FillIn,
            QuestionKind::Scenario { .. } => QuestionType::Scenario,
        }
    }

    /// Check every variant invariant of this question.
    ///
    /// Called by the bank collaborator at load time; the evaluation engine
    /// assumes validated questions but re-checks defensively where a
    /// violation would corrupt a score.
    ///
    /// # Errors
    ///
    /// Returns the first [`QuestionValidationError`] found.
    pub fn validate(&self) -> Result<(), QuestionValidationError> {
        match &self.kind {
            QuestionKind::MultipleChoice { options, correct } => {
                validate_single_choice(&self.id, options, correct)
            }
            QuestionKind::MultipleSelect {
                options,
                select_count,
                correct,
            } => validate_multi_select(&self.id, options, *select_count, correct),
            QuestionKind::Matching { pairs } => {
                if pairs.is_empty() {
                    return Err(QuestionValidationError::NoPairs {
                        id: self.id.clone(),
                    });
                }
                Ok(())
            }
            QuestionKind::Ordering {
                items,
                correct_order,
            } => {
                if !is_permutation(items, correct_order) {
                    return Err(QuestionValidationError::NotAPermutation {
                        id: self.id.clone(),
                    });
                }
                Ok(())
            }
            QuestionKind::DragDrop { categories, items } => {
                if categories.is_empty() {
                    return Err(QuestionValidationError::NoCategories {
                        id: self.id.clone(),
                    });
                }
                for item in items {
                    if !categories.contains(&item.correct_category) {
                        return Err(QuestionValidationError::UndeclaredCategory {
                            id: self.id.clone(),
                            item: item.text.clone(),
                            category: item.correct_category.clone(),
                        });
                    }
                }
                Ok(())
            }
            QuestionKind::FillIn {
                correct_answers, ..
            } => {
                if correct_answers.is_empty() {
                    return Err(QuestionValidationError::NoAcceptedAnswers {
                        id: self.id.clone(),
                    });
                }
                Ok(())
            }
            QuestionKind::Scenario { parts, .. } => {
                if parts.is_empty() {
                    return Err(QuestionValidationError::NoParts {
                        id: self.id.clone(),
                    });
                }
                let mut seen = BTreeSet::new();
                for part in parts {
                    if !seen.insert(part.id.clone()) {
                        return Err(QuestionValidationError::DuplicatePartId {
                            id: self.id.clone(),
                            part: part.id.clone(),
                        });
                    }
                    match &part.kind {
                        PartKind::MultipleChoice { options, correct } => {
                            validate_single_choice(&self.id, options, correct)?;
                        }
                        PartKind::MultipleSelect {
                            options,
                            select_count,
                            correct,
                        } => {
                            validate_multi_select(&self.id, options, *select_count, correct)?;
                        }
                        PartKind::FillIn {
                            correct_answers, ..
                        } => {
                            if correct_answers.is_empty() {
                                return Err(QuestionValidationError::NoAcceptedAnswers {
                                    id: self.id.clone(),
                                });
                            }
                        }
                    }
                }
                Ok(())
            }
        }
    }
}

fn validate_single_choice(
    id: &QuestionId,
    options: &[ChoiceOption],
    correct: &str,
) -> Result<(), QuestionValidationError> {
    if options.is_empty() {
        return Err(QuestionValidationError::NoOptions { id: id.clone() });
    }
    if !options.iter().any(|o| o.key == correct) {
        return Err(QuestionValidationError::UnknownCorrectKey {
            id: id.clone(),
            key: correct.to_string(),
        });
    }
    Ok(())
}

fn validate_multi_select(
    id: &QuestionId,
    options: &[ChoiceOption],
    select_count: usize,
    correct: &BTreeSet<String>,
) -> Result<(), QuestionValidationError> {
    if options.is_empty() {
        return Err(QuestionValidationError::NoOptions { id: id.clone() });
    }
    if select_count == 0 || select_count > options.len() {
        return Err(QuestionValidationError::SelectCountTooLarge {
            id: id.clone(),
            select_count,
            options: options.len(),
        });
    }
    if correct.len() != select_count {
        return Err(QuestionValidationError::SelectCountMismatch {
            id: id.clone(),
            select_count,
            correct: correct.len(),
        });
    }
    for key in correct {
        if !options.iter().any(|o| &o.key == key) {
            return Err(QuestionValidationError::UnknownCorrectKey {
                id: id.clone(),
                key: key.clone(),
            });
        }
    }
    Ok(())
}

fn is_permutation(items: &[String], correct_order: &[String]) -> bool {
    if items.len() != correct_order.len() {
        return false;
    }
    let mut a: Vec<&String> = items.iter().collect();
    let mut b: Vec<&String> = correct_order.iter().collect();
    a.sort();
    b.sort();
    a == b
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
