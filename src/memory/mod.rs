//! Session memory
//!
//! Stores the user and assistant messages of each session with a rolling
//! expiry and a bounded length. Backends implement the fallible
//! [`SessionStore`] contract; the rest of the crate talks to the infallible
//! [`SessionMemory`] wrapper, which logs backend failures and degrades to
//! empty history instead of failing the conversation.

pub mod in_memory;
pub mod locks;
pub mod noop;
pub mod sled_store;

pub use in_memory::InMemoryStore;
pub use locks::{SessionGuard, SessionLocks};
pub use noop::NoopStore;
pub use sled_store::SledStore;

use crate::config::{MemoryBackend, MemoryConfig};
use crate::error::Result;
use crate::providers::Message;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

/// Ten years; larger TTLs are clamped so expiry arithmetic cannot overflow
const MAX_TTL_SECONDS: u64 = 10 * 365 * 24 * 60 * 60;

/// Retention limits applied on every write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    /// Maximum number of stored messages per session
    pub max_messages: usize,
    /// Expiry window, refreshed on every write
    pub ttl: Duration,
}

impl RetentionPolicy {
    /// Build a policy from the memory configuration
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            max_messages: config.max_messages,
            ttl: Duration::seconds(config.ttl_seconds.min(MAX_TTL_SECONDS) as i64),
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&MemoryConfig::default())
    }
}

/// Stored form of one session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Persisted messages, oldest first
    pub messages: Vec<Message>,
    /// Moment after which the session reads as empty
    pub expires_at: DateTime<Utc>,
}

impl SessionRecord {
    /// Whether the session has expired at `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Apply one append to an existing (possibly absent or expired) record
    ///
    /// Expired history is discarded before the append, the oldest messages
    /// are evicted past `max_messages`, and the expiry is pushed forward.
    pub fn appended(
        existing: Option<SessionRecord>,
        message: &Message,
        policy: &RetentionPolicy,
        now: DateTime<Utc>,
    ) -> SessionRecord {
        let mut messages = match existing {
            Some(record) if !record.is_expired(now) => record.messages,
            _ => Vec::new(),
        };

        messages.push(message.clone());
        if messages.len() > policy.max_messages {
            let overflow = messages.len() - policy.max_messages;
            messages.drain(..overflow);
        }

        SessionRecord {
            messages,
            expires_at: now + policy.ttl,
        }
    }
}

/// Fallible session storage backend
///
/// Each operation on one session id is atomic with respect to other
/// operations on the same id.
#[cfg_attr(test, mockall::automock)]
pub trait SessionStore: Send + Sync {
    /// Short backend name for logs and health output
    fn name(&self) -> &'static str;

    /// Load a session record, expired or not
    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>>;

    /// Append one message under the retention policy
    fn append(&self, session_id: &str, message: &Message, policy: &RetentionPolicy) -> Result<()>;

    /// Delete a session
    fn remove(&self, session_id: &str) -> Result<()>;

    /// Delete a session only if it is still expired at `now`
    ///
    /// The check and the delete happen as one step, so an append that lands
    /// after the caller saw the expired record is kept. Returns whether a
    /// record was removed.
    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) -> Result<bool>;

    /// Ids of sessions that have not expired
    ///
    /// Expired records met along the way are removed with the same
    /// check-and-delete step as [`SessionStore::remove_if_expired`].
    fn session_ids(&self) -> Result<Vec<String>>;
}

/// Infallible session memory used by the assistant
///
/// # Examples
///
/// ```
/// use retail_assistant::memory::SessionMemory;
/// use retail_assistant::providers::Message;
///
/// let memory = SessionMemory::in_memory();
/// memory.append("s1", &Message::user("show me TVs"));
/// memory.append("s1", &Message::tool("c1", "search_products", "[]"));
///
/// assert_eq!(memory.get("s1").len(), 1);
/// ```
#[derive(Clone)]
pub struct SessionMemory {
    store: Arc<dyn SessionStore>,
    policy: RetentionPolicy,
    persistent: bool,
}

impl SessionMemory {
    /// Select a backend from configuration
    ///
    /// The configured backend is opened once. When it cannot be opened the
    /// no-op backend is selected and a warning is logged, so callers never
    /// branch on availability.
    pub fn connect(config: &MemoryConfig) -> Self {
        let policy = RetentionPolicy::from_config(config);

        match config.backend {
            MemoryBackend::Memory => Self::with_store(Arc::new(InMemoryStore::new()), policy),
            MemoryBackend::None => {
                tracing::info!("Session memory disabled; conversations will not be remembered");
                Self::disabled()
            }
            MemoryBackend::Sled => {
                let opened = match &config.path {
                    Some(path) => SledStore::open(path),
                    None => SledStore::open_default(),
                };
                match opened {
                    Ok(store) => Self::with_store(Arc::new(store), policy),
                    Err(e) => {
                        tracing::warn!(
                            error = %e,
                            "Session memory unavailable; running without persistent conversations"
                        );
                        Self::disabled()
                    }
                }
            }
        }
    }

    /// Wrap an explicit backend
    pub fn with_store(store: Arc<dyn SessionStore>, policy: RetentionPolicy) -> Self {
        tracing::info!(backend = store.name(), "Session memory ready");
        Self {
            store,
            policy,
            persistent: true,
        }
    }

    /// Process-local memory with default retention
    pub fn in_memory() -> Self {
        Self::with_store(Arc::new(InMemoryStore::new()), RetentionPolicy::default())
    }

    /// Memory that remembers nothing
    pub fn disabled() -> Self {
        Self {
            store: Arc::new(NoopStore),
            policy: RetentionPolicy::default(),
            persistent: false,
        }
    }

    /// Whether conversations are remembered between calls
    pub fn is_persistent(&self) -> bool {
        self.persistent
    }

    /// Name of the selected backend
    pub fn backend_name(&self) -> &'static str {
        self.store.name()
    }

    /// Retention limits in effect
    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Stored messages of a session, oldest first
    ///
    /// Expired sessions are removed and read as empty. Backend errors are
    /// logged and read as empty.
    pub fn get(&self, session_id: &str) -> Vec<Message> {
        let now = Utc::now();
        match self.store.load(session_id) {
            Ok(Some(record)) if record.is_expired(now) => {
                match self.store.remove_if_expired(session_id, now) {
                    Ok(removed) => tracing::debug!(session_id, removed, "Session expired"),
                    Err(e) => {
                        tracing::warn!(session_id, error = %e, "Failed to purge expired session")
                    }
                }
                Vec::new()
            }
            Ok(Some(record)) => record.messages,
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Failed to load session history");
                Vec::new()
            }
        }
    }

    /// Persist one message
    ///
    /// Only user and assistant messages are stored; anything else is
    /// silently dropped. Backend errors are logged.
    pub fn append(&self, session_id: &str, message: &Message) {
        if !message.is_persistable() {
            return;
        }

        if let Err(e) = self.store.append(session_id, message, &self.policy) {
            tracing::warn!(session_id, error = %e, "Failed to persist message");
        }
    }

    /// Remove a session immediately
    pub fn clear(&self, session_id: &str) {
        if let Err(e) = self.store.remove(session_id) {
            tracing::warn!(session_id, error = %e, "Failed to clear session");
        }
    }

    /// Ids of sessions that have not expired
    ///
    /// Best effort: the backend purges expired sessions found along the way,
    /// and a backend error yields an empty set.
    pub fn list_active_sessions(&self) -> BTreeSet<String> {
        match self.store.session_ids() {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to list sessions");
                BTreeSet::new()
            }
        }
    }
}

impl std::fmt::Debug for SessionMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionMemory")
            .field("backend", &self.store.name())
            .field("policy", &self.policy)
            .field("persistent", &self.persistent)
            .finish()
    }
}
