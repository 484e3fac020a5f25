//! Embedded on-disk session store
//!
//! Each session is one key in a `sled` database, holding the JSON-encoded
//! [`SessionRecord`]. Appends use `update_and_fetch`, so concurrent writers
//! to the same session never lose each other's messages. Expired records
//! are only ever deleted with `compare_and_swap` against the exact bytes
//! that were found expired.

use crate::error::{AssistantError, Result};
use crate::memory::{RetentionPolicy, SessionRecord, SessionStore};
use crate::providers::Message;
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use sled::{Db, IVec};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Appends between two sweeps of expired sessions
pub const SWEEP_INTERVAL: usize = 64;

/// Session store backed by sled
pub struct SledStore {
    db: Db,
    path: PathBuf,
    appends_since_sweep: AtomicUsize,
}

impl SledStore {
    /// Open (or create) a store at `path`
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Storage` if the database cannot be opened
    ///
    /// # Examples
    ///
    /// ```
    /// use retail_assistant::memory::SledStore;
    ///
    /// let dir = tempfile::tempdir().unwrap();
    /// let store = SledStore::open(dir.path().join("sessions")).unwrap();
    /// ```
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = sled::open(&path)
            .map_err(|e| AssistantError::Storage(format!("Failed to open database: {}", e)))?;

        tracing::debug!(path = %path.display(), "Opened session database");
        Ok(Self {
            db,
            path,
            appends_since_sweep: AtomicUsize::new(0),
        })
    }

    /// Open the store in the user's data directory
    ///
    /// # Errors
    ///
    /// Returns error if the data directory cannot be determined or opened
    pub fn open_default() -> Result<Self> {
        Self::open(Self::default_path()?)
    }

    /// Default database location under the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "retail-assistant", "retail-assistant").ok_or_else(
            || AssistantError::Storage("Could not determine data directory".to_string()),
        )?;
        Ok(dirs.data_dir().join("sessions"))
    }

    /// Database directory
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of stored records, expired or not
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Whether no record is stored
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    /// Delete every record that has expired at `now`
    ///
    /// Returns the number of records removed.
    ///
    /// # Errors
    ///
    /// Returns `AssistantError::Storage` if iteration or a delete fails
    pub fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for entry in self.db.iter() {
            let (key, bytes) =
                entry.map_err(|e| AssistantError::Storage(format!("Iteration failed: {}", e)))?;
            if self.delete_if_expired(&key, bytes, now)? {
                removed += 1;
            }
        }

        if removed > 0 {
            self.flush()?;
            tracing::debug!(removed, "Swept expired sessions");
        }
        Ok(removed)
    }

    fn decode(bytes: &[u8]) -> Result<SessionRecord> {
        serde_json::from_slice(bytes)
            .map_err(|e| AssistantError::Storage(format!("Deserialization failed: {}", e)).into())
    }

    fn flush(&self) -> Result<()> {
        self.db
            .flush()
            .map_err(|e| AssistantError::Storage(format!("Flush failed: {}", e)))?;
        Ok(())
    }

    /// Delete `key` if it still holds `current` and `current` has expired
    ///
    /// A record that changed in between is re-read and checked again.
    /// Unreadable records are left for the next append to replace.
    fn delete_if_expired(&self, key: &[u8], current: IVec, now: DateTime<Utc>) -> Result<bool> {
        let mut current = current;
        loop {
            match Self::decode(&current) {
                Ok(record) if record.is_expired(now) => {}
                _ => return Ok(false),
            }

            let swapped = self
                .db
                .compare_and_swap(key, Some(&current), None::<IVec>)
                .map_err(|e| AssistantError::Storage(format!("Compare-and-swap failed: {}", e)))?;
            match swapped {
                Ok(()) => return Ok(true),
                Err(conflict) => match conflict.current {
                    Some(newer) => current = newer,
                    None => return Ok(false),
                },
            }
        }
    }
}

impl SessionStore for SledStore {
    fn name(&self) -> &'static str {
        "sled"
    }

    fn load(&self, session_id: &str) -> Result<Option<SessionRecord>> {
        self.db
            .get(session_id.as_bytes())
            .map_err(|e| AssistantError::Storage(format!("Get failed: {}", e)))?
            .map(|bytes| Self::decode(&bytes))
            .transpose()
    }

    fn append(&self, session_id: &str, message: &Message, policy: &RetentionPolicy) -> Result<()> {
        let mut encode_error = None;

        self.db
            .update_and_fetch(session_id.as_bytes(), |old| {
                let existing = old.and_then(|bytes| match Self::decode(bytes) {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::warn!(error = %e, "Discarding unreadable session record");
                        None
                    }
                });
                let record = SessionRecord::appended(existing, message, policy, Utc::now());
                match serde_json::to_vec(&record) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        encode_error = Some(e);
                        old.map(|bytes| bytes.to_vec())
                    }
                }
            })
            .map_err(|e| AssistantError::Storage(format!("Update failed: {}", e)))?;

        if let Some(e) = encode_error {
            return Err(AssistantError::Storage(format!("Serialization failed: {}", e)).into());
        }

        self.flush()?;

        if self.appends_since_sweep.fetch_add(1, Ordering::Relaxed) + 1 >= SWEEP_INTERVAL {
            self.appends_since_sweep.store(0, Ordering::Relaxed);
            if let Err(e) = self.purge_expired(Utc::now()) {
                tracing::warn!(error = %e, "Failed to sweep expired sessions");
            }
        }
        Ok(())
    }

    fn remove(&self, session_id: &str) -> Result<()> {
        self.db
            .remove(session_id.as_bytes())
            .map_err(|e| AssistantError::Storage(format!("Remove failed: {}", e)))?;
        self.flush()
    }

    fn remove_if_expired(&self, session_id: &str, now: DateTime<Utc>) -> Result<bool> {
        let current = self
            .db
            .get(session_id.as_bytes())
            .map_err(|e| AssistantError::Storage(format!("Get failed: {}", e)))?;
        let Some(current) = current else {
            return Ok(false);
        };

        let removed = self.delete_if_expired(session_id.as_bytes(), current, now)?;
        if removed {
            self.flush()?;
        }
        Ok(removed)
    }

    fn session_ids(&self) -> Result<Vec<String>> {
        let now = Utc::now();
        let mut ids = Vec::new();
        let mut removed = false;

        for entry in self.db.iter() {
            let (key, bytes) =
                entry.map_err(|e| AssistantError::Storage(format!("Iteration failed: {}", e)))?;
            match Self::decode(&bytes) {
                Ok(record) if !record.is_expired(now) => {
                    ids.push(String::from_utf8_lossy(&key).into_owned());
                }
                Ok(_) => removed |= self.delete_if_expired(&key, bytes, now)?,
                Err(e) => {
                    tracing::warn!(
                        session_id = %String::from_utf8_lossy(&key),
                        error = %e,
                        "Skipping unreadable session record"
                    );
                }
            }
        }

        if removed {
            self.flush()?;
        }
        Ok(ids)
    }
}
