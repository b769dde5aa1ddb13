use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::ids::PartId;

//
// ─── SUBMITTED ANSWERS ─────────────────────────────────────────────────────────
//

/// A candidate's answer to one question, shaped by the question type.
///
/// An unanswered question is represented as the absence of a
/// `SubmittedAnswer` (`None` at call sites), which is distinct from an
/// empty or wrong-shaped answer. Evaluators never error on a shape
/// mismatch; they grade it as incorrect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmittedAnswer {
    /// Single option key (multiple_choice).
    Choice(String),
    /// Set of option keys (multiple_select).
    Selection(BTreeSet<String>),
    /// Left item to chosen right item (matching).
    Matches(BTreeMap<String, String>),
    /// Items in the candidate's order (ordering).
    Sequence(Vec<String>),
    /// Item text to chosen category (drag_drop).
    Placement(BTreeMap<String, String>),
    /// Free text (fill_in).
    Text(String),
    /// Part id to sub-answer (scenario).
    Parts(BTreeMap<PartId, SubmittedAnswer>),
}

//
// ─── ANSWER KEYS ───────────────────────────────────────────────────────────────
//

/// Echo of a question's answer key, returned with every evaluation for
/// feedback rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKey {
    /// The correct option key.
    Choice(String),
    /// The correct set of option keys.
    Selection(BTreeSet<String>),
    /// The full left-to-right mapping.
    Matches(BTreeMap<String, String>),
    /// The correct order.
    Sequence(Vec<String>),
    /// Item text to its category.
    Placement(BTreeMap<String, String>),
    /// All accepted free-text forms.
    Text(Vec<String>),
    /// Per-part answer keys, in part order.
    Parts(Vec<(PartId, AnswerKey)>),
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_answers_compare_as_sets() {
        let a = SubmittedAnswer::Selection(["b", "a"].iter().map(|s| (*s).to_string()).collect());
        let b = SubmittedAnswer::Selection(["a", "b"].iter().map(|s| (*s).to_string()).collect());
        assert_eq!(a, b);
    }

    #[test]
    fn answers_roundtrip_through_json() {
        let answer = SubmittedAnswer::Parts(
            [(
                PartId::new("p1"),
                SubmittedAnswer::Text("0.83".to_string()),
            )]
            .into_iter()
            .collect(),
        );
        let json = serde_json::to_string(&answer).unwrap();
        let back: SubmittedAnswer = serde_json::from_str(&json).unwrap();
        assert_eq!(answer, back);
    }
}
