use async_trait::async_trait;
use exam_core::model::{Mode, RecordId, SubmissionRecord};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Aggregate statistics across all persisted submissions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct OverallStats {
    pub total_attempts: usize,
    pub study_attempts: usize,
    pub exam_attempts: usize,
    pub pass_count: usize,
    pub average_percentage: f64,
    pub best_percentage: f64,
}

/// Persistence contract for submission history.
///
/// The engine depends only on these operations; the concrete storage
/// mechanism behind them is interchangeable.
#[async_trait]
pub trait HistoryRepository: Send + Sync {
    /// Persist a submission record, returning its opaque identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if a record for the same session
    /// already exists, or other storage errors.
    async fn save(&self, record: &SubmissionRecord) -> Result<RecordId, StorageError>;

    /// All persisted records, most recently completed first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if history cannot be read.
    async fn load_history(&self) -> Result<Vec<SubmissionRecord>, StorageError>;

    /// Fetch one record by its identifier.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_record(&self, id: &RecordId) -> Result<SubmissionRecord, StorageError>;

    /// Delete one record and its responses.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn delete_record(&self, id: &RecordId) -> Result<(), StorageError>;

    /// Aggregate statistics over all persisted submissions.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if history cannot be read.
    async fn overall_stats(&self) -> Result<OverallStats, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    records: Arc<Mutex<Vec<(RecordId, SubmissionRecord)>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of records currently held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.len())
    }

    /// Returns true when no records are held.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl HistoryRepository for InMemoryRepository {
    async fn save(&self, record: &SubmissionRecord) -> Result<RecordId, StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        if guard
            .iter()
            .any(|(_, r)| r.session_id() == record.session_id())
        {
            return Err(StorageError::Conflict);
        }
        let id = RecordId::generate();
        guard.push((id.clone(), record.clone()));
        Ok(id)
    }

    async fn load_history(&self) -> Result<Vec<SubmissionRecord>, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut records: Vec<SubmissionRecord> =
            guard.iter().map(|(_, r)| r.clone()).collect();
        records.sort_by_key(|r| std::cmp::Reverse(r.completed_at()));
        Ok(records)
    }

    async fn get_record(&self, id: &RecordId) -> Result<SubmissionRecord, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|(record_id, _)| record_id == id)
            .map(|(_, r)| r.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn delete_record(&self, id: &RecordId) -> Result<(), StorageError> {
        let mut guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|(record_id, _)| record_id != id);
        if guard.len() == before {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn overall_stats(&self) -> Result<OverallStats, StorageError> {
        let guard = self
            .records
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut stats = OverallStats::default();
        for (_, record) in guard.iter() {
            stats.total_attempts += 1;
            match record.mode() {
                Mode::Study => stats.study_attempts += 1,
                Mode::Exam => stats.exam_attempts += 1,
            }
            let summary = record.summary();
            if summary.passed {
                stats.pass_count += 1;
            }
            stats.average_percentage += summary.raw_percentage;
            stats.best_percentage = stats.best_percentage.max(summary.raw_percentage);
        }
        if stats.total_attempts > 0 {
            stats.average_percentage /= stats.total_attempts as f64;
        }
        Ok(stats)
    }
}

/// History storage behind a trait object for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub history: Arc<dyn HistoryRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            history: Arc::new(InMemoryRepository::new()),
        }
    }
}
