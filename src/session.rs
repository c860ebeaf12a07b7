//! Bearer-token ownership and persistence.
//!
//! The token is the only piece of client state that survives a restart.
//! It lives in memory for request signing and in a [`TokenStore`] for the
//! next process.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, RwLock};

use tracing::warn;

use crate::error::SyncResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthState {
    Unauthenticated,
    Authenticated,
}

pub trait TokenStore: Send + Sync {
    fn load(&self) -> SyncResult<Option<String>>;
    fn save(&self, token: &str) -> SyncResult<()>;
    fn clear(&self) -> SyncResult<()>;
}

/// Keeps the token in a single file, creating parent directories on save.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> SyncResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => {
                let token = content.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, token: &str) -> SyncResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, token)?;
        Ok(())
    }

    fn clear(&self) -> SyncResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-process store. Clones share the same slot, so a test can keep one
/// handle and inspect what the session persisted.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.to_string()))),
        }
    }

    pub fn stored(&self) -> Option<String> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> SyncResult<Option<String>> {
        Ok(self.stored())
    }

    fn save(&self, token: &str) -> SyncResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> SyncResult<()> {
        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

pub struct SessionManager {
    token: RwLock<Option<String>>,
    store: Box<dyn TokenStore>,
}

impl SessionManager {
    pub fn new(store: impl TokenStore + 'static) -> Self {
        Self {
            token: RwLock::new(None),
            store: Box::new(store),
        }
    }

    /// Pick up a token persisted by an earlier run.
    pub fn restore(&self) -> SyncResult<AuthState> {
        let token = self.store.load()?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = token;
        Ok(self.state())
    }

    pub fn set_token(&self, token: &str) -> SyncResult<()> {
        self.store.save(token)?;
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(token.to_string());
        Ok(())
    }

    pub fn token(&self) -> Option<String> {
        self.token.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn state(&self) -> AuthState {
        if self.token.read().unwrap_or_else(|e| e.into_inner()).is_some() {
            AuthState::Authenticated
        } else {
            AuthState::Unauthenticated
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Forget the token in memory and on disk. The in-memory session is
    /// always dropped; a persistence failure is only logged.
    pub fn clear(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to remove persisted token");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested/token"));

        assert_eq!(store.load().unwrap(), None);
        store.save("abc.def").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def"));
        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn test_file_store_ignores_blank_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();
        assert_eq!(FileTokenStore::new(path).load().unwrap(), None);
    }

    #[test]
    fn test_token_survives_new_session() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");

        let first = SessionManager::new(FileTokenStore::new(&path));
        first.set_token("tok-1").unwrap();

        let second = SessionManager::new(FileTokenStore::new(&path));
        assert_eq!(second.state(), AuthState::Unauthenticated);
        assert_eq!(second.restore().unwrap(), AuthState::Authenticated);
        assert_eq!(second.token().as_deref(), Some("tok-1"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let store = MemoryTokenStore::with_token("tok");
        let session = SessionManager::new(store.clone());
        session.restore().unwrap();
        assert!(session.is_authenticated());

        session.clear();
        session.clear();

        assert_eq!(session.state(), AuthState::Unauthenticated);
        assert!(session.token().is_none());
        assert!(store.stored().is_none());
    }
}
