//! Aggregation of per-question results into a session score.
//!
//! Raw percentage, the mapping onto the standardized 100–900 scale, the
//! pass/fail decision, and the per-domain breakdown.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::eval::EvaluationResult;
use crate::model::{Domain, Question};

//
// ─── SCORE POLICY ──────────────────────────────────────────────────────────────
//

/// Scale mapping and passing threshold.
///
/// The slope and intercept of the raw-to-scaled mapping are policy, not
/// constants: the authoritative exam scale is not fully published, so a
/// caller can install a different range or cut score without touching the
/// aggregation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScorePolicy {
    pub scale_min: u32,
    pub scale_max: u32,
    pub passing_score: u32,
}

impl ScorePolicy {
    /// Map a raw percentage onto the scaled range, clamped to the
    /// endpoints: 0% maps to `scale_min`, 100% to `scale_max`.
    #[must_use]
    pub fn scale(&self, raw_percentage: f64) -> u32 {
        let span = f64::from(self.scale_max - self.scale_min);
        let scaled = f64::from(self.scale_min) + raw_percentage / 100.0 * span;
        let rounded = scaled.round();
        if rounded <= f64::from(self.scale_min) {
            self.scale_min
        } else if rounded >= f64::from(self.scale_max) {
            self.scale_max
        } else {
            rounded as u32
        }
    }

    #[must_use]
    pub fn is_passing(&self, scaled_score: u32) -> bool {
        scaled_score >= self.passing_score
    }
}

impl Default for ScorePolicy {
    /// The PK0-005 scale: 100–900 with a 710 cut score.
    fn default() -> Self {
        Self {
            scale_min: 100,
            scale_max: 900,
            passing_score: 710,
        }
    }
}

//
// ─── SCORE SUMMARY ─────────────────────────────────────────────────────────────
//

/// Per-domain slice of a session score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    /// Questions in this domain.
    pub total: usize,
    /// Questions answered fully correctly.
    pub correct: usize,
    /// Sum of per-question scores, partial credit included.
    pub earned: f64,
    /// `100 × earned / total`, rounded to one decimal place.
    pub percentage: f64,
}

/// Aggregate outcome of a graded session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub total_questions: usize,
    pub correct_count: usize,
    pub earned_points: f64,
    pub raw_percentage: f64,
    pub scaled_score: u32,
    pub passed: bool,
    pub elapsed_seconds: u32,
    /// One entry per domain present in the question set, in blueprint
    /// order. Fully unanswered domains still appear, at 0%.
    pub domain_breakdown: Vec<DomainScore>,
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Combine per-question results into a [`ScoreSummary`].
///
/// Every question counts toward the denominator; unanswered questions
/// were already graded as score 0 by the evaluators.
#[must_use]
pub fn aggregate(
    results: &[(Question, EvaluationResult)],
    policy: &ScorePolicy,
    elapsed_seconds: u32,
) -> ScoreSummary {
    let total_questions = results.len();
    let earned_points: f64 = results.iter().map(|(_, r)| r.score).sum();
    let correct_count = results.iter().filter(|(_, r)| r.is_correct).count();

    let raw_percentage = if total_questions == 0 {
        0.0
    } else {
        100.0 * earned_points / total_questions as f64
    };
    let scaled_score = policy.scale(raw_percentage);

    let mut per_domain: BTreeMap<Domain, (usize, usize, f64)> = BTreeMap::new();
    for (question, result) in results {
        let entry = per_domain.entry(question.domain).or_insert((0, 0, 0.0));
        entry.0 += 1;
        if result.is_correct {
            entry.1 += 1;
        }
        entry.2 += result.score;
    }
    let domain_breakdown = per_domain
        .into_iter()
        .map(|(domain, (total, correct, earned))| DomainScore {
            domain,
            total,
            correct,
            earned,
            percentage: round1(100.0 * earned / total as f64),
        })
        .collect();

    ScoreSummary {
        total_questions,
        correct_count,
        earned_points,
        raw_percentage: round1(raw_percentage),
        scaled_score,
        passed: policy.is_passing(scaled_score),
        elapsed_seconds,
        domain_breakdown,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::evaluate;
    use crate::model::{
        ChoiceOption, Difficulty, QuestionId, QuestionKind, SubmittedAnswer,
    };

    fn mc_question(id: &str, domain: Domain) -> Question {
        Question {
            id: QuestionId::new(id),
            domain,
            objective: "x".to_string(),
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

    fn graded(id: &str, domain: Domain, correct: bool) -> (Question, EvaluationResult) {
        let q = mc_question(id, domain);
        let answer = SubmittedAnswer::Choice(if correct { "a" } else { "b" }.to_string());
        let result = evaluate(&q, Some(&answer));
        (q, result)
    }

    #[test]
    fn scale_preserves_endpoints() {
        let policy = ScorePolicy::default();
        assert_eq!(policy.scale(0.0), 100);
        assert_eq!(policy.scale(100.0), 900);
    }

    #[test]
    fn scale_clamps_out_of_range_input() {
        let policy = ScorePolicy::default();
        assert_eq!(policy.scale(-5.0), 100);
        assert_eq!(policy.scale(150.0), 900);
    }

    #[test]
    fn seventy_five_percent_falls_just_short() {
        let policy = ScorePolicy::default();
        let scaled = policy.scale(75.0);
        assert_eq!(scaled, 700);
        assert!(!policy.is_passing(scaled));
    }

    #[test]
    fn seventy_seven_percent_passes() {
        let policy = ScorePolicy::default();
        let scaled = policy.scale(77.0);
        assert!(scaled >= 710);
        assert!(policy.is_passing(scaled));
    }

    #[test]
    fn all_correct_scores_scaled_max() {
        let results = vec![
            graded("q1", Domain::ProjectManagementConcepts, true),
            graded("q2", Domain::ToolsAndDocumentation, true),
        ];
        let summary = aggregate(&results, &ScorePolicy::default(), 90);
        assert_eq!(summary.raw_percentage, 100.0);
        assert_eq!(summary.scaled_score, 900);
        assert!(summary.passed);
        assert_eq!(summary.correct_count, 2);
        assert_eq!(summary.elapsed_seconds, 90);
    }

    #[test]
    fn unanswered_questions_count_toward_denominator() {
        let q = mc_question("q1", Domain::ProjectManagementConcepts);
        let unanswered = evaluate(&q, None);
        let results = vec![
            (q, unanswered),
            graded("q2", Domain::ProjectManagementConcepts, true),
        ];
        let summary = aggregate(&results, &ScorePolicy::default(), 0);
        assert_eq!(summary.total_questions, 2);
        assert_eq!(summary.raw_percentage, 50.0);
        assert_eq!(summary.scaled_score, 500);
        assert!(!summary.passed);
    }

    #[test]
    fn breakdown_includes_fully_unanswered_domains() {
        let q = mc_question("q1", Domain::BasicsOfItAndGovernance);
        let unanswered = evaluate(&q, None);
        let results = vec![
            graded("q2", Domain::ProjectManagementConcepts, true),
            (q, unanswered),
        ];
        let summary = aggregate(&results, &ScorePolicy::default(), 0);

        assert_eq!(summary.domain_breakdown.len(), 2);
        let governance = summary
            .domain_breakdown
            .iter()
            .find(|d| d.domain == Domain::BasicsOfItAndGovernance)
            .unwrap();
        assert_eq!(governance.total, 1);
        assert_eq!(governance.percentage, 0.0);
    }

    #[test]
    fn empty_result_set_scores_scaled_min() {
        let summary = aggregate(&[], &ScorePolicy::default(), 0);
        assert_eq!(summary.raw_percentage, 0.0);
        assert_eq!(summary.scaled_score, 100);
        assert!(!summary.passed);
        assert!(summary.domain_breakdown.is_empty());
    }

    #[test]
    fn custom_policy_shifts_the_cut_score() {
        let policy = ScorePolicy {
            scale_min: 200,
            scale_max: 800,
            passing_score: 500,
        };
        assert_eq!(policy.scale(0.0), 200);
        assert_eq!(policy.scale(100.0), 800);
        assert_eq!(policy.scale(50.0), 500);
        assert!(policy.is_passing(policy.scale(50.0)));
    }
}
