//! Durable storage for the admin session credential.
//!
//! A single credential record exists at a time. It is written after a
//! successful login, read on every authenticated request, and removed on
//! logout or when the server rejects the token.

use std::io;
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Credential file name in the state directory
const AUTH_FILE: &str = "auth.json";

#[derive(Debug, Error)]
pub enum StoreError {
    /// The underlying storage cannot be read or written.
    #[error("credential storage unavailable: {source}")]
    Unavailable {
        #[from]
        source: io::Error,
    },

    /// A record is present but does not have the expected shape.
    /// Distinct from "absent" because it triggers a destructive clear.
    #[error("stored credential record is malformed: {reason}")]
    Malformed { reason: String },
}

/// The admin identity returned by the login endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    pub name: String,
}

/// The persisted login result: an opaque bearer token plus the admin's
/// identity. No expiry is tracked client-side; a stale token is caught
/// reactively when the server rejects it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialRecord {
    pub token: String,
    pub user: UserIdentity,
}

/// On-disk envelope, matching the shape the login endpoint responds with:
/// `{"data":{"token":"...","user":{"id":"...","name":"..."}}}`.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    data: CredentialRecord,
}

/// Storage for the single active credential record.
///
/// Injectable so the file-backed implementation can be swapped for
/// [`MemoryCredentialStore`] in tests and embedded use.
pub trait CredentialStore: Send + Sync {
    /// Persist the record, replacing any existing one.
    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError>;

    /// Read the record. `Ok(None)` when absent; `Malformed` when present
    /// but not parseable as the expected shape.
    fn load(&self) -> Result<Option<CredentialRecord>, StoreError>;

    /// Remove the record. Clearing an absent record is not an error.
    fn clear(&self) -> Result<(), StoreError>;
}

/// File-backed store: one `auth.json` under the application state directory.
pub struct FileCredentialStore {
    dir: PathBuf,
}

impl FileCredentialStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn auth_path(&self) -> PathBuf {
        self.dir.join(AUTH_FILE)
    }
}

impl CredentialStore for FileCredentialStore {
    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let stored = StoredRecord {
            data: record.clone(),
        };
        let contents = serde_json::to_string_pretty(&stored)
            .map_err(|e| StoreError::Unavailable {
                source: io::Error::new(io::ErrorKind::InvalidData, e),
            })?;
        std::fs::write(self.auth_path(), contents)?;
        debug!(path = %self.auth_path().display(), "credential record saved");
        Ok(())
    }

    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        let path = self.auth_path();
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)?;
        let stored: StoredRecord =
            serde_json::from_str(&contents).map_err(|e| StoreError::Malformed {
                reason: e.to_string(),
            })?;

        if stored.data.token.is_empty() {
            return Err(StoreError::Malformed {
                reason: "empty token".to_string(),
            });
        }

        Ok(Some(stored.data))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let path = self.auth_path();
        if path.exists() {
            std::fs::remove_file(path)?;
        }
        Ok(())
    }
}

/// In-memory store for tests and embedded use. Same contract, no disk.
#[derive(Default)]
pub struct MemoryCredentialStore {
    slot: Mutex<Option<CredentialRecord>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn save(&self, record: &CredentialRecord) -> Result<(), StoreError> {
        *self.slot.lock().unwrap() = Some(record.clone());
        Ok(())
    }

    fn load(&self) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.slot.lock().unwrap().clone())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.slot.lock().unwrap() = None;
        Ok(())
    }
}
