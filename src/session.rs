//! Bounded, expiring registry of debug sessions.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::protocol::ErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Waiting,
    Active,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub port: u16,
    pub wait_for_client: bool,
    pub state: SessionState,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session '{0}' already exists")]
    Duplicate(String),

    #[error("Maximum sessions reached ({0})")]
    CapacityReached(usize),

    #[error("session '{0}' not found")]
    NotFound(String),
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Duplicate(_) => ErrorKind::ValidationError,
            Self::CapacityReached(_) => ErrorKind::ExecutionError,
            Self::NotFound(_) => ErrorKind::NotFound,
        }
    }
}

struct Entry {
    record: SessionRecord,
    born: Instant,
}

/// Sessions keyed by caller-chosen id.
///
/// Entries older than the TTL are dropped at the start of every operation.
pub struct SessionRegistry {
    entries: Mutex<HashMap<String, Entry>>,
    max_sessions: usize,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize, ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            max_sessions,
            ttl,
        }
    }

    /// Lock and purge expired entries.
    fn live(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        let ttl = self.ttl;
        entries.retain(|id, entry| {
            let keep = entry.born.elapsed() < ttl;
            if !keep {
                tracing::info!(session_id = %id, "session expired");
            }
            keep
        });
        entries
    }

    pub fn create(
        &self,
        session_id: &str,
        port: u16,
        wait_for_client: bool,
    ) -> Result<SessionRecord, SessionError> {
        let mut entries = self.live();
        if entries.contains_key(session_id) {
            return Err(SessionError::Duplicate(session_id.to_string()));
        }
        if entries.len() >= self.max_sessions {
            return Err(SessionError::CapacityReached(self.max_sessions));
        }
        let record = SessionRecord {
            session_id: session_id.to_string(),
            port,
            wait_for_client,
            state: if wait_for_client {
                SessionState::Waiting
            } else {
                SessionState::Active
            },
            created_at: Utc::now(),
        };
        entries.insert(
            session_id.to_string(),
            Entry {
                record: record.clone(),
                born: Instant::now(),
            },
        );
        Ok(record)
    }

    pub fn get(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        self.live()
            .get(session_id)
            .map(|e| e.record.clone())
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    pub fn update_state(
        &self,
        session_id: &str,
        state: SessionState,
    ) -> Result<SessionRecord, SessionError> {
        let mut entries = self.live();
        let entry = entries
            .get_mut(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        entry.record.state = state;
        Ok(entry.record.clone())
    }

    pub fn delete(&self, session_id: &str) -> Result<SessionRecord, SessionError> {
        self.live()
            .remove(session_id)
            .map(|e| e.record)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))
    }

    /// Live sessions sorted by id.
    pub fn list(&self) -> Vec<SessionRecord> {
        let mut records: Vec<SessionRecord> =
            self.live().values().map(|e| e.record.clone()).collect();
        records.sort_by(|a, b| a.session_id.cmp(&b.session_id));
        records
    }
}
