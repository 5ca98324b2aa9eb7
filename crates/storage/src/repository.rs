use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quiz_core::model::{QuizSession, Registration, RegistrationId, SessionId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Per-browser quiz state, keyed by the session cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Fetch the session state, if one was started.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read or the stored state is corrupt.
    async fn load(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError>;

    /// Insert or overwrite the session state.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the state cannot be stored.
    async fn save(&self, id: SessionId, session: &QuizSession) -> Result<(), StorageError>;

    /// Drop the session state. Removing an unknown id is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn remove(&self, id: SessionId) -> Result<(), StorageError>;

    /// Evict every session whose last activity is before `cutoff`.
    ///
    /// Returns how many sessions were dropped.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be reached.
    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError>;
}

/// Optional destination for registration details.
#[async_trait]
pub trait RegistrationSink: Send + Sync {
    /// Record a registration and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the registration cannot be stored.
    async fn record(&self, registration: &Registration) -> Result<RegistrationId, StorageError>;
}

/// Simple in-memory implementation for tests and single-process deployments.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    sessions: Arc<Mutex<HashMap<SessionId, QuizSession>>>,
    registrations: Arc<Mutex<Vec<Registration>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every recorded registration, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Connection` if the lock is poisoned.
    pub fn registrations(&self) -> Result<Vec<Registration>, StorageError> {
        let guard = self
            .registrations
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.clone())
    }
}

#[async_trait]
impl SessionStore for InMemoryRepository {
    async fn load(&self, id: SessionId) -> Result<Option<QuizSession>, StorageError> {
        let guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(guard.get(&id).cloned())
    }

    async fn save(&self, id: SessionId, session: &QuizSession) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.insert(id, session.clone());
        Ok(())
    }

    async fn remove(&self, id: SessionId) -> Result<(), StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.remove(&id);
        Ok(())
    }

    async fn prune(&self, cutoff: DateTime<Utc>) -> Result<usize, StorageError> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let before = guard.len();
        guard.retain(|_, session| session.updated_at() >= cutoff);
        Ok(before - guard.len())
    }
}

#[async_trait]
impl RegistrationSink for InMemoryRepository {
    async fn record(&self, registration: &Registration) -> Result<RegistrationId, StorageError> {
        let mut guard = self
            .registrations
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard.push(registration.clone());
        Ok(RegistrationId::new(guard.len() as u64))
    }
}

/// Aggregates the session store and registration sink behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub sessions: Arc<dyn SessionStore>,
    pub registrations: Arc<dyn RegistrationSink>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let sessions: Arc<dyn SessionStore> = Arc::new(repo.clone());
        let registrations: Arc<dyn RegistrationSink> = Arc::new(repo);
        Self {
            sessions,
            registrations,
        }
    }
}
