use std::collections::BTreeMap;
use std::sync::Arc;

use exam_core::model::{
    BankId, ChoiceOption, Difficulty, Domain, MatchPair, Mode, Part, PartId, PartKind, Question,
    QuestionBank, QuestionId, QuestionKind, SubmittedAnswer,
};
use exam_core::time::fixed_clock;
use services::{QuizService, SessionBuilder};
use storage::repository::{HistoryRepository, InMemoryRepository};

fn bank() -> QuestionBank {
    let mc = Question {
        id: QuestionId::new("pm-001"),
        domain: Domain::ProjectManagementConcepts,
        objective: "1.2".to_string(),
        difficulty: Difficulty::Easy,
        prompt: "Which document authorizes the project?".to_string(),
        explanation: "The charter formally authorizes the project.".to_string(),
        kind: QuestionKind::MultipleChoice {
            options: vec![
                ChoiceOption {
                    key: "a".to_string(),
                    text: "Project charter".to_string(),
                },
                ChoiceOption {
                    key: "b".to_string(),
                    text: "Scope statement".to_string(),
                },
            ],
            correct: "a".to_string(),
        },
    };

    let matching = Question {
        id: QuestionId::new("lc-001"),
        domain: Domain::ProjectLifeCyclePhases,
        objective: "2.3".to_string(),
        difficulty: Difficulty::Medium,
        prompt: "Match each phase to its output.".to_string(),
        explanation: String::new(),
        kind: QuestionKind::Matching {
            pairs: vec![
                MatchPair {
                    left: "Initiation".to_string(),
                    right: "Charter".to_string(),
                },
                MatchPair {
                    left: "Planning".to_string(),
                    right: "WBS".to_string(),
                },
            ],
        },
    };

    let scenario = Question {
        id: QuestionId::new("td-001"),
        domain: Domain::ToolsAndDocumentation,
        objective: "3.2".to_string(),
        difficulty: Difficulty::Hard,
        prompt: "Work through the budget review.".to_string(),
        explanation: String::new(),
        kind: QuestionKind::Scenario {
            scenario: "EV is $500 and AC is $600.".to_string(),
            parts: vec![
                Part {
                    id: PartId::new("p1"),
                    prompt: "What is the CPI?".to_string(),
                    explanation: String::new(),
                    kind: PartKind::FillIn {
                        correct_answers: vec!["0.83".to_string(), ".83".to_string()],
                        case_sensitive: false,
                    },
                },
                Part {
                    id: PartId::new("p2"),
                    prompt: "Is the project over budget?".to_string(),
                    explanation: String::new(),
                    kind: PartKind::MultipleChoice {
                        options: vec![
                            ChoiceOption {
                                key: "yes".to_string(),
                                text: "Yes".to_string(),
                            },
                            ChoiceOption {
                                key: "no".to_string(),
                                text: "No".to_string(),
                            },
                        ],
                        correct: "yes".to_string(),
                    },
                },
            ],
        },
    };

    QuestionBank::new(
        BankId::new("pk0-005-core"),
        "PK0-005 Core",
        "Practice questions",
        "1.0",
        vec![mc, matching, scenario],
    )
    .unwrap()
}

#[tokio::test]
async fn full_attempt_grades_aggregates_and_persists() {
    let repo = InMemoryRepository::new();
    let svc = QuizService::new(fixed_clock(), Arc::new(repo.clone()));

    let id = svc
        .start(
            SessionBuilder::new(Mode::Exam)
                .with_time_limit_minutes(100)
                .with_randomize(false),
            &[bank()],
        )
        .unwrap();

    svc.record_answer(
        &id,
        &QuestionId::new("pm-001"),
        SubmittedAnswer::Choice("a".to_string()),
    )
    .await
    .unwrap();

    let matches: BTreeMap<String, String> = [
        ("Initiation", "Charter"),
        ("Planning", "Charter"),
    ]
    .iter()
    .map(|(l, r)| ((*l).to_string(), (*r).to_string()))
    .collect();
    svc.record_answer(
        &id,
        &QuestionId::new("lc-001"),
        SubmittedAnswer::Matches(matches),
    )
    .await
    .unwrap();

    let parts: BTreeMap<PartId, SubmittedAnswer> = [
        (
            PartId::new("p1"),
            SubmittedAnswer::Text("$0.83".to_string()),
        ),
        (
            PartId::new("p2"),
            SubmittedAnswer::Choice("yes".to_string()),
        ),
    ]
    .into_iter()
    .collect();
    svc.record_answer(&id, &QuestionId::new("td-001"), SubmittedAnswer::Parts(parts))
        .await
        .unwrap();

    let outcome = svc.submit(&id, 4_500).await.unwrap();

    // 1 + 0.5 + 1 out of 3 questions.
    let summary = &outcome.summary;
    assert_eq!(summary.total_questions, 3);
    assert_eq!(summary.correct_count, 2);
    assert!((summary.earned_points - 2.5).abs() < 1e-9);
    assert_eq!(summary.raw_percentage, 83.3);
    assert!(summary.passed);
    assert_eq!(summary.domain_breakdown.len(), 3);

    let record = repo.get_record(&outcome.record_id).await.unwrap();
    assert_eq!(record.mode(), Mode::Exam);
    assert_eq!(record.responses().len(), 3);
    assert_eq!(record.summary(), summary);

    let history = repo.load_history().await.unwrap();
    assert_eq!(history.len(), 1);
}

#[tokio::test]
async fn study_attempt_checks_then_submits_without_regrade_drift() {
    let repo = InMemoryRepository::new();
    let svc = QuizService::new(fixed_clock(), Arc::new(repo.clone()));

    let id = svc
        .start(
            SessionBuilder::new(Mode::Study).with_randomize(false),
            &[bank()],
        )
        .unwrap();

    svc.record_answer(
        &id,
        &QuestionId::new("pm-001"),
        SubmittedAnswer::Choice("b".to_string()),
    )
    .await
    .unwrap();

    let checked = svc.check(&id, &QuestionId::new("pm-001")).await.unwrap();
    assert!(!checked.is_correct);

    // Checked questions are locked, so the wrong answer stands at submit.
    let outcome = svc.submit(&id, 60).await.unwrap();
    assert_eq!(outcome.summary.correct_count, 0);

    svc.archive(&id).await.unwrap();
    assert!(svc.store().is_empty().unwrap());
}
