//! Degraded session store that remembers nothing

use crate::error::Result;
use crate::memory::{RetentionPolicy, SessionRecord, SessionStore};
use crate::providers::Message;
use chrono::{DateTime, Utc};

/// Session store used when no backend is available
///
/// Reads are always empty and writes are discarded.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopStore;

impl SessionStore for NoopStore {
    fn name(&self) -> &'static str {
        "none"
    }

    fn load(&self, _session_id: &str) -> Result<Option<SessionRecord>> {
        Ok(None)
    }

    fn append(&self, _session_id: &str, _message: &Message, _policy: &RetentionPolicy) -> Result<()> {
        Ok(())
    }

    fn remove(&self, _session_id: &str) -> Result<()> {
        Ok(())
    }

    fn remove_if_expired(&self, _session_id: &str, _now: DateTime<Utc>) -> Result<bool> {
        Ok(false)
    }

    fn session_ids(&self) -> Result<Vec<String>> {
        Ok(Vec::new())
    }
}
