//! Per-type answer evaluation.
//!
//! One rule per question variant, each a pure function from (question,
//! submitted answer) to an [`EvaluationResult`]. A missing, empty, or
//! wrong-shaped answer always grades as incorrect with score 0 — grading
//! must never take down an in-progress session, so malformed input fails
//! closed instead of erroring.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::model::{
    AnswerKey, DragItem, MatchPair, Part, PartId, PartKind, Question, QuestionKind, SubmittedAnswer,
};
use crate::normalize::normalize;

//
// ─── EVALUATION RESULT ─────────────────────────────────────────────────────────
//

/// Outcome of grading one question (or one scenario part).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub is_correct: bool,
    /// Fraction of credit earned, in `[0, 1]`. Fractional only for the
    /// performance-based types (matching, ordering, drag_drop, scenario).
    pub score: f64,
    /// Echo of the answer key, for feedback rendering.
    pub correct_answer: AnswerKey,
    pub feedback: String,
    /// Per-part results, in part order. Scenario questions only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part_results: Option<Vec<PartResult>>,
}

/// One scenario part's grade, labeled with its part id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartResult {
    pub part_id: PartId,
    pub result: EvaluationResult,
}

impl EvaluationResult {
    fn binary(is_correct: bool, correct_answer: AnswerKey, feedback: &str) -> Self {
        Self {
            is_correct,
            score: if is_correct { 1.0 } else { 0.0 },
            correct_answer,
            feedback: feedback.to_string(),
            part_results: None,
        }
    }

    fn partial(correct: usize, total: usize, correct_answer: AnswerKey, feedback: &str) -> Self {
        // total == 0 only for a malformed question; fail closed.
        let score = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };
        Self {
            is_correct: total > 0 && correct == total,
            score,
            correct_answer,
            feedback: feedback.to_string(),
            part_results: None,
        }
    }
}

//
// ─── EVALUATORS ────────────────────────────────────────────────────────────────
//

/// Grade a question against a submitted answer.
///
/// `None` means the question was left unanswered and scores 0. Callable
/// for any single question with no session state attached.
#[must_use]
pub fn evaluate(question: &Question, answer: Option<&SubmittedAnswer>) -> EvaluationResult {
    let feedback = question.explanation.as_str();
    match &question.kind {
        QuestionKind::MultipleChoice { correct, .. } => {
            grade_multiple_choice(correct, answer, feedback)
        }
        QuestionKind::MultipleSelect {
            select_count,
            correct,
            ..
        } => grade_multiple_select(*select_count, correct, answer, feedback),
        QuestionKind::Matching { pairs } => grade_matching(pairs, answer, feedback),
        QuestionKind::Ordering { correct_order, .. } => {
            grade_ordering(correct_order, answer, feedback)
        }
        QuestionKind::DragDrop { items, .. } => grade_drag_drop(items, answer, feedback),
        QuestionKind::FillIn {
            correct_answers,
            case_sensitive,
        } => grade_fill_in(correct_answers, *case_sensitive, answer, feedback),
        QuestionKind::Scenario { parts, .. } => grade_scenario(parts, answer, feedback),
    }
}

/// Grade one scenario part with the rule for its own type.
#[must_use]
pub fn evaluate_part(part: &Part, answer: Option<&SubmittedAnswer>) -> EvaluationResult {
    let feedback = part.explanation.as_str();
    match &part.kind {
        PartKind::MultipleChoice { correct, .. } => {
            grade_multiple_choice(correct, answer, feedback)
        }
        PartKind::MultipleSelect {
            select_count,
            correct,
            ..
        } => grade_multiple_select(*select_count, correct, answer, feedback),
        PartKind::FillIn {
            correct_answers,
            case_sensitive,
        } => grade_fill_in(correct_answers, *case_sensitive, answer, feedback),
    }
}

fn grade_multiple_choice(
    correct: &str,
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Choice(correct.to_string());
    let is_correct = matches!(answer, Some(SubmittedAnswer::Choice(k)) if k == correct);
    EvaluationResult::binary(is_correct, key, feedback)
}

fn grade_multiple_select(
    select_count: usize,
    correct: &BTreeSet<String>,
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Selection(correct.clone());
    // A selection of the wrong size is rejected outright; there is no
    // partial credit for partial overlap.
    let is_correct = match answer {
        Some(SubmittedAnswer::Selection(selected)) => {
            select_count > 0
                && !correct.is_empty()
                && selected.len() == select_count
                && selected == correct
        }
        _ => false,
    };
    EvaluationResult::binary(is_correct, key, feedback)
}

fn grade_matching(
    pairs: &[MatchPair],
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Matches(
        pairs
            .iter()
            .map(|p| (p.left.clone(), p.right.clone()))
            .collect(),
    );
    let submitted: Option<&BTreeMap<String, String>> = match answer {
        Some(SubmittedAnswer::Matches(map)) => Some(map),
        _ => None,
    };
    let correct = pairs
        .iter()
        .filter(|p| submitted.and_then(|m| m.get(&p.left)) == Some(&p.right))
        .count();
    EvaluationResult::partial(correct, pairs.len(), key, feedback)
}

fn grade_ordering(
    correct_order: &[String],
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Sequence(correct_order.to_vec());
    let submitted: &[String] = match answer {
        Some(SubmittedAnswer::Sequence(seq)) => seq,
        _ => &[],
    };
    // Positions past the submitted length count as incorrect; extra
    // submitted entries earn nothing.
    let correct = correct_order
        .iter()
        .enumerate()
        .filter(|(i, item)| submitted.get(*i) == Some(*item))
        .count();
    EvaluationResult::partial(correct, correct_order.len(), key, feedback)
}

fn grade_drag_drop(
    items: &[DragItem],
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Placement(
        items
            .iter()
            .map(|i| (i.text.clone(), i.correct_category.clone()))
            .collect(),
    );
    let submitted: Option<&BTreeMap<String, String>> = match answer {
        Some(SubmittedAnswer::Placement(map)) => Some(map),
        _ => None,
    };
    let correct = items
        .iter()
        .filter(|i| submitted.and_then(|m| m.get(&i.text)) == Some(&i.correct_category))
        .count();
    EvaluationResult::partial(correct, items.len(), key, feedback)
}

fn grade_fill_in(
    correct_answers: &[String],
    case_sensitive: bool,
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let key = AnswerKey::Text(correct_answers.to_vec());
    let is_correct = match answer {
        Some(SubmittedAnswer::Text(text)) => {
            let submitted = normalize(text, case_sensitive);
            correct_answers
                .iter()
                .any(|accepted| normalize(accepted, case_sensitive) == submitted)
        }
        _ => false,
    };
    EvaluationResult::binary(is_correct, key, feedback)
}

fn grade_scenario(
    parts: &[Part],
    answer: Option<&SubmittedAnswer>,
    feedback: &str,
) -> EvaluationResult {
    let sub_answers: Option<&BTreeMap<PartId, SubmittedAnswer>> = match answer {
        Some(SubmittedAnswer::Parts(map)) => Some(map),
        _ => None,
    };

    let mut part_results = Vec::with_capacity(parts.len());
    let mut total_score = 0.0;
    let mut all_correct = !parts.is_empty();
    for part in parts {
        let part_answer = sub_answers.and_then(|m| m.get(&part.id));
        let result = evaluate_part(part, part_answer);
        total_score += result.score;
        all_correct &= result.is_correct;
        part_results.push(PartResult {
            part_id: part.id.clone(),
            result,
        });
    }

    let score = if parts.is_empty() {
        0.0
    } else {
        total_score / parts.len() as f64
    };
    let key = AnswerKey::Parts(
        part_results
            .iter()
            .map(|p| (p.part_id.clone(), p.result.correct_answer.clone()))
            .collect(),
    );

    EvaluationResult {
        is_correct: all_correct,
        score,
        correct_answer: key,
        feedback: feedback.to_string(),
        part_results: Some(part_results),
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
