//! Conversions between domain values and their column representations.

use exam_core::model::{Domain, Mode, QuestionType};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::repository::StorageError;

pub(super) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(super) fn to_json<T: Serialize>(value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(ser)
}

pub(super) fn from_json<T: DeserializeOwned>(raw: &str) -> Result<T, StorageError> {
    serde_json::from_str(raw).map_err(ser)
}

pub(super) fn usize_from_i64(field: &'static str, v: i64) -> Result<usize, StorageError> {
    usize::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

pub(super) fn mode_to_str(mode: Mode) -> &'static str {
    mode.as_str()
}

pub(super) fn mode_from_str(raw: &str) -> Result<Mode, StorageError> {
    match raw {
        "study" => Ok(Mode::Study),
        "exam" => Ok(Mode::Exam),
        other => Err(StorageError::Serialization(format!("invalid mode: {other}"))),
    }
}

/// Domains are stored by their blueprint number, matching the bank format.
pub(super) fn domain_to_str(domain: Domain) -> &'static str {
    match domain {
        Domain::ProjectManagementConcepts => "1",
        Domain::ProjectLifeCyclePhases => "2",
        Domain::ToolsAndDocumentation => "3",
        Domain::BasicsOfItAndGovernance => "4",
    }
}

pub(super) fn domain_from_str(raw: &str) -> Result<Domain, StorageError> {
    match raw {
        "1" => Ok(Domain::ProjectManagementConcepts),
        "2" => Ok(Domain::ProjectLifeCyclePhases),
        "3" => Ok(Domain::ToolsAndDocumentation),
        "4" => Ok(Domain::BasicsOfItAndGovernance),
        other => Err(StorageError::Serialization(format!(
            "invalid domain: {other}"
        ))),
    }
}

pub(super) fn question_type_to_str(question_type: QuestionType) -> &'static str {
    match question_type {
        QuestionType::MultipleChoice => "multiple_choice",
        QuestionType::MultipleSelect => "multiple_select",
        QuestionType::Matching => "matching",
        QuestionType::Ordering => "ordering",
        QuestionType::DragDrop => "drag_drop",
        QuestionType::FillIn => "fill_in",
        QuestionType::Scenario => "scenario",
    }
}

pub(super) fn question_type_from_str(raw: &str) -> Result<QuestionType, StorageError> {
    match raw {
        "multiple_choice" => Ok(QuestionType::MultipleChoice),
        "multiple_select" => Ok(QuestionType::MultipleSelect),
        "matching" => Ok(QuestionType::Matching),
        "ordering" => Ok(QuestionType::Ordering),
        "drag_drop" => Ok(QuestionType::DragDrop),
        "fill_in" => Ok(QuestionType::FillIn),
        "scenario" => Ok(QuestionType::Scenario),
        other => Err(StorageError::Serialization(format!(
            "invalid question type: {other}"
        ))),
    }
}
