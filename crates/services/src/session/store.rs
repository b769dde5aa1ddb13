use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use exam_core::model::SessionId;
use storage::repository::StorageError;
use tokio::sync::Mutex as AsyncMutex;

use super::service::QuizSession;
use crate::error::SessionError;

/// Keyed store of in-progress sessions: the concurrency boundary of the
/// engine.
///
/// Each session lives behind its own async lock, so one attempt's submit
/// can hold its session across the persistence await without blocking
/// other sessions. A near-simultaneous duplicate submit queues on that
/// lock and then observes the already-stored outcome.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<Mutex<HashMap<SessionId, Arc<AsyncMutex<QuizSession>>>>>,
}

impl SessionStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Add a freshly built session to the store.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::DuplicateSession` if the id is already
    /// present.
    pub fn insert(&self, session: QuizSession) -> Result<SessionId, SessionError> {
        let id = session.id().clone();
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
            .map_err(SessionError::Storage)?;
        if guard.contains_key(&id) {
            return Err(SessionError::DuplicateSession(id));
        }
        guard.insert(id.clone(), Arc::new(AsyncMutex::new(session)));
        Ok(id)
    }

    /// Fetch the lock handle for a session.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` if the id is unknown.
    pub fn get(&self, id: &SessionId) -> Result<Arc<AsyncMutex<QuizSession>>, SessionError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
            .map_err(SessionError::Storage)?;
        guard
            .get(id)
            .cloned()
            .ok_or_else(|| SessionError::SessionNotFound(id.clone()))
    }

    /// Remove a session from the store, returning its lock handle.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::SessionNotFound` if the id is unknown.
    pub fn remove(&self, id: &SessionId) -> Result<Arc<AsyncMutex<QuizSession>>, SessionError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
            .map_err(SessionError::Storage)?;
        guard
            .remove(id)
            .ok_or_else(|| SessionError::SessionNotFound(id.clone()))
    }

    /// Number of sessions currently held.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, SessionError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
            .map_err(SessionError::Storage)?;
        Ok(guard.len())
    }

    /// Returns true when no sessions are held.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.len()? == 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exam_core::model::{
        BankId, ChoiceOption, Difficulty, Domain, Mode, Question, QuestionId, QuestionKind,
    };
    use exam_core::time::fixed_now;

    fn build_session(id: &str) -> QuizSession {
        let question = Question {
            id: QuestionId::new("q1"),
            domain: Domain::ProjectManagementConcepts,
            objective: "1.1".to_string(),
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
        };
        QuizSession::new(
            SessionId::new(id),
            Mode::Study,
            0,
            vec![BankId::new("b1")],
            vec![question],
            HashMap::new(),
            fixed_now(),
        )
        .unwrap()
    }

    #[test]
    fn insert_then_get_round_trips() {
        let store = SessionStore::new();
        let id = store.insert(build_session("s1")).unwrap();
        assert!(store.get(&id).is_ok());
        assert_eq!(store.len().unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let store = SessionStore::new();
        store.insert(build_session("s1")).unwrap();
        let err = store.insert(build_session("s1")).unwrap_err();
        assert!(matches!(err, SessionError::DuplicateSession(_)));
    }

    #[test]
    fn remove_evicts_the_session() {
        let store = SessionStore::new();
        let id = store.insert(build_session("s1")).unwrap();
        store.remove(&id).unwrap();
        assert!(store.is_empty().unwrap());
        assert!(matches!(
            store.get(&id),
            Err(SessionError::SessionNotFound(_))
        ));
    }
}
