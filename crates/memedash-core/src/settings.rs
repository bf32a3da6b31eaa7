//! Persistence for Telegram credentials.

use crate::notify::Notifier;
use crate::storage::{KeyValueStorage, StorageError};
use log::{info, warn};
use memedash_protocol::{CREDENTIALS_STORAGE_KEY, Credentials};
use parking_lot::RwLock;
use std::sync::Arc;

/// Shown after credentials are written.
pub const CREDENTIALS_SAVED_MESSAGE: &str = "Your Telegram credentials have been saved.";

/// Reads and writes the report destination credentials.
pub struct SettingsStore {
    storage: Arc<dyn KeyValueStorage>,
    notifier: Notifier,
    current: RwLock<Credentials>,
}

impl SettingsStore {
    /// Create a store and prime the in-memory copy from storage.
    pub fn new(storage: Arc<dyn KeyValueStorage>, notifier: Notifier) -> Self {
        let current = read_credentials(storage.as_ref());
        Self {
            storage,
            notifier,
            current: RwLock::new(current),
        }
    }

    /// Re-read credentials from storage.
    ///
    /// Absent or malformed values yield empty credentials.
    pub fn load(&self) -> Credentials {
        let credentials = read_credentials(self.storage.as_ref());
        *self.current.write() = credentials.clone();
        credentials
    }

    /// Persist `credentials`, replacing any earlier value.
    pub fn save(&self, credentials: Credentials) -> Result<(), StorageError> {
        let serialized = serde_json::to_string(&credentials)?;
        self.storage.set(CREDENTIALS_STORAGE_KEY, &serialized)?;
        info!(
            "saved telegram credentials (complete={})",
            credentials.is_complete()
        );
        *self.current.write() = credentials;
        self.notifier.success(CREDENTIALS_SAVED_MESSAGE);
        Ok(())
    }

    /// Credentials as of the last load or save.
    pub fn credentials(&self) -> Credentials {
        self.current.read().clone()
    }
}

fn read_credentials(storage: &dyn KeyValueStorage) -> Credentials {
    let raw = match storage.get(CREDENTIALS_STORAGE_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Credentials::default(),
        Err(err) => {
            warn!("failed to read stored credentials: {err}");
            return Credentials::default();
        }
    };
    match serde_json::from_str::<Credentials>(&raw) {
        Ok(credentials) => credentials,
        Err(err) => {
            warn!("malformed stored credentials ignored: {err}");
            Credentials::default()
        }
    }
}
