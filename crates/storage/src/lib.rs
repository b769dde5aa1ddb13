#![forbid(unsafe_code)]

//! Persistence for submission history: the repository contract the engine
//! depends on, an in-memory implementation for tests and prototyping, and
//! the `SQLite` adapter used in production.

pub mod repository;
pub mod sqlite;

pub use repository::{HistoryRepository, InMemoryRepository, OverallStats, Storage, StorageError};
pub use sqlite::{SqliteInitError, SqliteRepository};
