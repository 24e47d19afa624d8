//! Auth state holder
//!
//! [`AuthStore`] owns the current [`Credential`], the auth status and the
//! `is_refreshing` flag. Every change is published on a `watch` channel so UI
//! code can react to logins and logouts. Persistence goes through a
//! [`CredentialBackend`]; a backend failure is logged and never blocks the
//! in-memory update.
//!
//! Inside a tokio runtime, writes run on the blocking pool, one after another
//! in the order they were issued; [`AuthStore::flush`] waits for them. Outside
//! a runtime they run inline.

use super::types::{
    AuthSnapshot, AuthStatus, Credential, PersistedAuth, PersistedState, AUTH_STORAGE_KEY,
};
use etcetera::{choose_base_strategy, BaseStrategy};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tracing::{debug, warn};

/// Credential persistence errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to determine data directory: {0}")]
    DataDir(String),
}

/// Key-value persistence for the auth state
pub trait CredentialBackend: Send + Sync + fmt::Debug {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn save(&self, key: &str, value: &str) -> Result<(), StoreError>;
    fn delete(&self, key: &str) -> Result<(), StoreError>;
}

/// Process-local backend; nothing survives a restart
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CredentialBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}

/// One JSON file per key under a directory
#[derive(Debug, Clone)]
pub struct FileBackend {
    dir: PathBuf,
}

impl FileBackend {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Backend rooted at the platform data directory
    pub fn in_data_dir() -> Result<Self, StoreError> {
        Ok(Self::new(default_data_dir()?))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl CredentialBackend for FileBackend {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        match std::fs::read_to_string(self.path_for(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.path_for(key);
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        match std::fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Platform data directory for AniStream (e.g. `~/.local/share/anistream`)
pub fn default_data_dir() -> Result<PathBuf, StoreError> {
    let strategy = choose_base_strategy().map_err(|e| StoreError::DataDir(e.to_string()))?;
    Ok(strategy.data_dir().join("anistream"))
}

type PendingWrite = Shared<BoxFuture<'static, ()>>;

/// Holder of the current credential
pub struct AuthStore {
    state: watch::Sender<AuthSnapshot>,
    backend: Arc<dyn CredentialBackend>,
    last_write: Mutex<Option<PendingWrite>>,
}

impl fmt::Debug for AuthStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let snapshot = self.state.borrow();
        f.debug_struct("AuthStore")
            .field("status", &snapshot.status)
            .field("is_refreshing", &snapshot.is_refreshing)
            .field("backend", &self.backend)
            .finish()
    }
}

impl AuthStore {
    /// New store in the `Unknown` state; call [`AuthStore::hydrate`] before use
    pub fn new(backend: Arc<dyn CredentialBackend>) -> Self {
        let (state, _) = watch::channel(AuthSnapshot::default());
        Self {
            state,
            backend,
            last_write: Mutex::new(None),
        }
    }

    /// Hydrated, memory-only store
    pub fn in_memory() -> Self {
        let store = Self::new(Arc::new(MemoryBackend::new()));
        store.mark_hydrated(None);
        store
    }

    /// Hydrated, memory-only store already holding `credential`
    pub fn with_credential(credential: Credential) -> Self {
        let store = Self::new(Arc::new(MemoryBackend::new()));
        store.mark_hydrated(Some(credential));
        store
    }

    /// Load the persisted credential and settle the status.
    ///
    /// A corrupt entry is discarded rather than reported; the user simply
    /// appears signed out.
    pub fn hydrate(&self) -> Result<AuthStatus, StoreError> {
        let auth = match self.backend.load(AUTH_STORAGE_KEY)? {
            Some(raw) => match serde_json::from_str::<PersistedAuth>(&raw) {
                Ok(persisted) => persisted.state.auth,
                Err(e) => {
                    warn!("Discarding unreadable persisted auth state: {}", e);
                    None
                }
            },
            None => None,
        };

        debug!("Auth state hydrated (authenticated: {})", auth.is_some());
        Ok(self.mark_hydrated(auth))
    }

    fn mark_hydrated(&self, auth: Option<Credential>) -> AuthStatus {
        let status = AuthStatus::resolve(auth.as_ref());
        self.state.send_modify(|state| {
            state.auth = auth;
            state.status = status;
        });
        status
    }

    pub fn is_hydrated(&self) -> bool {
        self.status() != AuthStatus::Unknown
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.state.borrow().clone()
    }

    pub fn auth(&self) -> Option<Credential> {
        self.state.borrow().auth.clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.state.borrow().status
    }

    /// Current access token; `None` until hydrated
    pub fn access_token(&self) -> Option<String> {
        let state = self.state.borrow();
        match state.status {
            AuthStatus::Unknown => None,
            _ => state.auth.as_ref().map(|a| a.access_token.clone()),
        }
    }

    /// Current refresh token; `None` until hydrated
    pub fn refresh_token(&self) -> Option<String> {
        let state = self.state.borrow();
        match state.status {
            AuthStatus::Unknown => None,
            _ => state
                .auth
                .as_ref()
                .map(|a| a.refresh_token.clone())
                .filter(|t| !t.is_empty()),
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.state.borrow().is_refreshing
    }

    pub fn set_refreshing(&self, refreshing: bool) {
        self.state.send_if_modified(|state| {
            let changed = state.is_refreshing != refreshing;
            state.is_refreshing = refreshing;
            changed
        });
    }

    /// Replace the credential wholesale
    pub fn set_auth(&self, credential: Credential) {
        self.persist(Some(&credential));
        self.state.send_modify(|state| {
            state.auth = Some(credential);
            state.status = AuthStatus::Authenticated;
        });
    }

    /// Drop the credential
    pub fn clear_auth(&self) {
        self.persist(None);
        self.state.send_modify(|state| {
            state.auth = None;
            state.status = AuthStatus::Unauthenticated;
        });
    }

    /// Receive every subsequent change
    pub fn subscribe(&self) -> watch::Receiver<AuthSnapshot> {
        self.state.subscribe()
    }

    /// Wait until every write issued so far has reached the backend
    pub async fn flush(&self) {
        let pending = self.last_write.lock().clone();
        if let Some(pending) = pending {
            pending.await;
        }
    }

    fn persist(&self, credential: Option<&Credential>) {
        let entry = match credential {
            Some(credential) => match serde_json::to_string(&PersistedAuth {
                state: PersistedState {
                    auth: Some(credential.clone()),
                },
                version: 0,
            }) {
                Ok(raw) => Some(raw),
                Err(e) => {
                    warn!("Failed to persist auth state: {}", e);
                    return;
                }
            },
            None => None,
        };

        let Ok(runtime) = Handle::try_current() else {
            write_entry(self.backend.as_ref(), entry.as_deref());
            return;
        };

        let backend = Arc::clone(&self.backend);
        let mut last_write = self.last_write.lock();
        let previous = last_write.take();
        let write = runtime.spawn(async move {
            if let Some(previous) = previous {
                previous.await;
            }
            let written = tokio::task::spawn_blocking(move || {
                write_entry(backend.as_ref(), entry.as_deref());
            })
            .await;
            if let Err(e) = written {
                warn!("Auth state write did not complete: {}", e);
            }
        });
        *last_write = Some(
            async move {
                let _ = write.await;
            }
            .boxed()
            .shared(),
        );
    }
}

fn write_entry(backend: &dyn CredentialBackend, entry: Option<&str>) {
    let result = match entry {
        Some(raw) => backend.save(AUTH_STORAGE_KEY, raw),
        None => backend.delete(AUTH_STORAGE_KEY),
    };
    if let Err(e) = result {
        warn!("Failed to persist auth state: {}", e);
    }
}
