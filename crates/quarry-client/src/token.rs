//! Shared bearer-credential cell with pluggable persistence.
//!
//! The store is the only holder of session state in the process. Writes
//! are visible to every subsequent read immediately; the persistence
//! seam exists so the credential survives process restarts without the
//! store ever becoming fallible.

use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::{fs, io::ErrorKind};

/// Durable backing for the credential: a single string value under one
/// well-known location.
pub trait TokenPersistence: Send + Sync {
    /// Read the persisted credential, if any.
    fn load(&self) -> Option<String>;
    /// Persist the credential.
    fn store(&self, token: &str);
    /// Remove any persisted credential.
    fn remove(&self);
}

/// File-backed persistence: the token is the entire file contents.
#[derive(Debug, Clone)]
pub struct FileTokenPersistence {
    path: PathBuf,
}

impl FileTokenPersistence {
    /// Persist under the given file path.
    #[must_use]
    pub const fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl TokenPersistence for FileTokenPersistence {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "failed to read token file");
                None
            }
        }
    }

    fn store(&self, token: &str) {
        if let Some(parent) = self.path.parent() {
            let _ = fs::create_dir_all(parent);
        }
        if let Err(err) = fs::write(&self.path, token) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to write token file");
        }
    }

    fn remove(&self) {
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != ErrorKind::NotFound
        {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to remove token file");
        }
    }
}

/// In-memory persistence for tests and ephemeral sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct EphemeralPersistence;

impl TokenPersistence for EphemeralPersistence {
    fn load(&self) -> Option<String> {
        None
    }

    fn store(&self, _token: &str) {}

    fn remove(&self) {}
}

/// Process-wide holder of the current bearer credential.
///
/// All operations are total: persistence failures degrade to log lines
/// and never surface to callers.
pub struct TokenStore {
    cell: Mutex<Option<String>>,
    backing: Box<dyn TokenPersistence>,
}

impl TokenStore {
    /// Create a store initialized from the backing's persisted value.
    #[must_use]
    pub fn new(backing: impl TokenPersistence + 'static) -> Self {
        let initial = backing.load();
        Self {
            cell: Mutex::new(initial),
            backing: Box::new(backing),
        }
    }

    /// Create a store with no persistence, for tests.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new(EphemeralPersistence)
    }

    fn guard(&self) -> MutexGuard<'_, Option<String>> {
        self.cell.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current credential, if one is held.
    #[must_use]
    pub fn get(&self) -> Option<String> {
        self.guard().clone()
    }

    /// Replace the credential and persist it.
    pub fn set(&self, token: impl Into<String>) {
        let token = token.into();
        self.backing.store(&token);
        *self.guard() = Some(token);
    }

    /// Drop the credential and its persisted copy.
    pub fn clear(&self) {
        self.backing.remove();
        *self.guard() = None;
    }
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("TokenStore")
            .field("present", &self.guard().is_some())
            .finish()
    }
}
