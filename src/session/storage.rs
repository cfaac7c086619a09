//! Durable token storage.
//!
//! Tokens live in `<state_dir>/tokens.json` with restricted permissions
//! (0600 on unix). They are never logged.

#[cfg(test)]
#[path = "storage_test.rs"]
mod storage_test;

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use super::SessionError;

/// The two credentials that survive a restart.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredTokens {
    pub access_token: String,
    pub refresh_token: String,
}

impl std::fmt::Debug for StoredTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoredTokens")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Key-value persistence for session tokens.
pub trait TokenStore: Send + Sync {
    /// Read persisted tokens. `Ok(None)` when nothing usable is stored.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the backing store cannot be read.
    fn load(&self) -> Result<Option<StoredTokens>, SessionError>;

    /// Replace persisted tokens.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the backing store cannot be written.
    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError>;

    /// Remove persisted tokens. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Storage`] if the backing store cannot be written.
    fn clear(&self) -> Result<(), SessionError>;
}

// =============================================================================
// FILE STORE
// =============================================================================

/// JSON file token store.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn storage_err(action: &str, path: &Path, err: impl std::fmt::Display) -> SessionError {
    SessionError::Storage(format!("failed to {action} {}: {err}", path.display()))
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, SessionError> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(storage_err("read", &self.path, e)),
        };
        if contents.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| storage_err("parse", &self.path, e))
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| storage_err("create", parent, e))?;
        }
        let contents = serde_json::to_string_pretty(tokens).map_err(|e| storage_err("serialize", &self.path, e))?;

        let mut options = OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }
        let mut file = options.open(&self.path).map_err(|e| storage_err("open", &self.path, e))?;
        // `mode` only applies on create; tighten a pre-existing file too.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))
                .map_err(|e| storage_err("restrict", &self.path, e))?;
        }
        file.write_all(contents.as_bytes())
            .map_err(|e| storage_err("write", &self.path, e))
    }

    fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(storage_err("remove", &self.path, e)),
        }
    }
}

// =============================================================================
// MEMORY STORE
// =============================================================================

/// Process-local store, for embedders that manage persistence themselves.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: Mutex<Option<StoredTokens>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn with_tokens(tokens: StoredTokens) -> Self {
        Self { tokens: Mutex::new(Some(tokens)) }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<StoredTokens>, SessionError> {
        Ok(self
            .tokens
            .lock()
            .map_err(|_| SessionError::Storage("token store poisoned".into()))?
            .clone())
    }

    fn save(&self, tokens: &StoredTokens) -> Result<(), SessionError> {
        *self
            .tokens
            .lock()
            .map_err(|_| SessionError::Storage("token store poisoned".into()))? = Some(tokens.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self
            .tokens
            .lock()
            .map_err(|_| SessionError::Storage("token store poisoned".into()))? = None;
        Ok(())
    }
}
