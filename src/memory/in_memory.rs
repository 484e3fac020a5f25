//! Process-local session store

use crate::error::{AssistantError, Result};
use crate::memory::{RetentionPolicy, SessionRecord, SessionStore};
use crate::providers::Message;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// Appends between two sweeps of expired sessions
pub const SWEEP_INTERVAL: usize = 64;

#[derive(Debug, Default)]
struct Sessions {
    records: HashMap<String, SessionRecord>,
    appends_since_sweep: usize,
}

impl Sessions {
    fn sweep(&mut self, now: DateTime<Utc>) {
        let before = self.records.len();
        self.records.retain(|_, record| !record.is_expired(now));
        self.appends_since_sweep = 0;

        let swept = before - self.records.len();
        if swept > 0 {
            tracing::debug!(swept, "Swept expired sessions");
        }
    }
}

/// Session store backed by a mutex-guarded map
///
/// Contents are lost when the process exits. Expired sessions are swept
/// every [`SWEEP_INTERVAL`] appends, so one-shot sessions that are never
/// read again do not accumulate.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    sessions: Mutex<Sessions>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, expired or not
    pub fn len(&self) -> Result<usize> {
        Ok(self.sessions()?.records.len())
    }

    /// Whether no record is stored
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn sessions(&self) -> Result<MutexGuard<'_, Sessions>> {
        self.sessions
            .lock()
            .map_err(|_| AssistantError::Storage("In-memory session map is poisoned".to_string()).into())
    }
}

impl SessionStore for InMemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(self.sessions()?.records.get(session_id).cloned())
    }

    fn append(&self, session_id: &str, message: &Message, policy: &RetentionPolicy) -> Result<()> {
        let now = Utc::now();
        let mut sessions = self.sessions()?;
        let existing = sessions.records.remove(session_id);
        let record = SessionRecord::appended(existing, message, policy, now);
        sessions.records.insert(session_id.to_string(), record);

        sessions.appends_since_sweep += 1;
        if sessions.appends_since_sweep >= SWEEP_INTERVAL {
            sessions.sweep(now);
        }
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<()> {
        self.sessions()?.records.remove(session_id);
        Ok(())
    }

    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let mut sessions = self.sessions()?;
        let expired = sessions
            .records
            .get(session_id)
            .map(|record| record.is_expired(now))
            .unwrap_or(false);
        if expired {
            sessions.records.remove(session_id);
        }
        Ok(expired)
    }

    fn session_ids(&self) -> Result<Vec<String>> {
        let mut sessions = self.sessions()?;
        sessions.sweep(Utc::now());
        Ok(sessions.records.keys().cloned().collect())
    }
}
