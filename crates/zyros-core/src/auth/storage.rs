//! Token storage
//!
//! The session store and the transport share one storage; the transport
//! writes the token after login and the session store reads it back.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Token storage interface
pub trait TokenStorage: Send + Sync {
    /// Read a named token
    fn get(&self, name: &str) -> Result<Option<String>, TokenStorageError>;

    /// Store a named token, replacing any previous value
    fn set(&self, name: &str, token: &str) -> Result<(), TokenStorageError>;

    /// Remove a named token; removing a missing token is not an error
    fn remove(&self, name: &str) -> Result<(), TokenStorageError>;
}

/// Token storage errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum TokenStorageError {
    #[error("IO error: {message}")]
    Io {
        message: String,
        path: Option<String>,
    },

    #[error("Storage error: {0}")]
    Storage(String),
}

impl TokenStorageError {
    fn io(error: std::io::Error, path: &Path) -> Self {
        Self::Io {
            message: error.to_string(),
            path: Some(path.display().to_string()),
        }
    }
}

/// In-process storage, the default for tests and short-lived clients
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    tokens: Mutex<HashMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with one token
    pub fn with_token(name: &str, token: impl Into<String>) -> Self {
        let storage = Self::new();
        storage.tokens.lock().insert(name.to_string(), token.into());
        storage
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self, name: &str) -> Result<Option<String>, TokenStorageError> {
        Ok(self.tokens.lock().get(name).cloned())
    }

    fn set(&self, name: &str, token: &str) -> Result<(), TokenStorageError> {
        self.tokens.lock().insert(name.to_string(), token.to_string());
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), TokenStorageError> {
        self.tokens.lock().remove(name);
        Ok(())
    }
}

/// File-based storage: one file per token under a private directory
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    base_path: PathBuf,
}

impl FileTokenStorage {
    /// Create new file-based storage
    pub fn new(base_path: impl Into<PathBuf>) -> Self {
        Self {
            base_path: base_path.into(),
        }
    }

    /// `~/.zyros/tokens`
    pub fn default_location() -> Result<Self, TokenStorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| TokenStorageError::Storage("Cannot find home directory".into()))?;
        Ok(Self::new(home.join(".zyros").join("tokens")))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn ensure_dir(&self) -> Result<(), TokenStorageError> {
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            let mut builder = std::fs::DirBuilder::new();
            builder.recursive(true).mode(0o700);
            builder
                .create(&self.base_path)
                .map_err(|e| TokenStorageError::io(e, &self.base_path))?;
        }

        #[cfg(not(unix))]
        {
            std::fs::create_dir_all(&self.base_path)
                .map_err(|e| TokenStorageError::io(e, &self.base_path))?;
        }

        Ok(())
    }

    fn token_path(&self, name: &str) -> PathBuf {
        // Sanitize name to prevent path traversal
        let safe_name = name.replace(['/', '\\'], "_").replace("..", "_");
        self.base_path.join(format!("{}.token", safe_name))
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self, name: &str) -> Result<Option<String>, TokenStorageError> {
        let path = self.token_path(name);
        match std::fs::read_to_string(&path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(TokenStorageError::io(e, &path)),
        }
    }

    fn set(&self, name: &str, token: &str) -> Result<(), TokenStorageError> {
        self.ensure_dir()?;
        let path = self.token_path(name);
        std::fs::write(&path, token).map_err(|e| TokenStorageError::io(e, &path))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            std::fs::set_permissions(&path, perms).map_err(|e| TokenStorageError::io(e, &path))?;
        }

        tracing::debug!(path = %path.display(), "stored token");
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), TokenStorageError> {
        let path = self.token_path(name);
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TokenStorageError::io(e, &path)),
        }
    }
}
