//! Per-session serialization
//!
//! Requests for the same session id run one at a time; requests for
//! different ids never wait on each other. A lock entry lives only while
//! someone holds or waits for it; entries left behind by a cancelled waiter
//! are swept on the next acquire or release.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<String, Arc<AsyncMutex<()>>>;

/// Map of per-session async locks
#[derive(Debug, Default)]
pub struct SessionLocks {
    locks: Mutex<LockMap>,
}

/// Exclusive access to one session, released on drop
#[derive(Debug)]
pub struct SessionGuard<'a> {
    owner: &'a SessionLocks,
    session_id: String,
    guard: Option<OwnedMutexGuard<()>>,
}

impl SessionLocks {
    /// Create an empty lock map
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self) -> MutexGuard<'_, LockMap> {
        // The map is only touched in short non-panicking sections
        self.locks.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Drop entries nobody holds or awaits
    ///
    /// Clones are only taken under the map lock, so a count of one means
    /// the map holds the sole reference.
    fn sweep_idle(map: &mut LockMap) {
        map.retain(|_, lock| Arc::strong_count(lock) > 1);
    }

    /// Wait for exclusive access to `session_id`
    pub async fn acquire(&self, session_id: &str) -> SessionGuard<'_> {
        let lock = self
            .map()
            .entry(session_id.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone();

        let guard = lock.lock_owned().await;
        Self::sweep_idle(&mut self.map());

        SessionGuard {
            owner: self,
            session_id: session_id.to_string(),
            guard: Some(guard),
        }
    }

    /// Number of sessions currently held or awaited
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// Whether no session is held or awaited
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }
}

impl Drop for SessionGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        tracing::trace!(session_id = %self.session_id, "Session lock released");
        SessionLocks::sweep_idle(&mut self.owner.map());
    }
}
