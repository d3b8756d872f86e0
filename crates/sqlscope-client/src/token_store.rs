//! Process-wide holder of the current access token.
//!
//! The store is the single source of truth for "is there a session". It is
//! lazily hydrated from a [`TokenPersistence`] backend on first access,
//! mirrors every `set` back into that backend, and notifies subscribers
//! synchronously before `set` returns.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Once, Weak};

use parking_lot::{Mutex, ReentrantMutex};
use sqlscope_types::AccessToken;

/// Callback invoked with the new token on every [`TokenStore::set`].
pub type TokenListener = Arc<dyn Fn(Option<&AccessToken>) + Send + Sync>;

// ─────────────────────────────────────────────────────────────────────────────
// Persistence
// ─────────────────────────────────────────────────────────────────────────────

/// Storage that outlives a single [`TokenStore`].
pub trait TokenPersistence: Send + Sync {
    /// Read the persisted token, if any.
    fn load(&self) -> std::io::Result<Option<AccessToken>>;

    /// Persist `token`, or remove the stored value when `None`.
    fn store(&self, token: Option<&AccessToken>) -> std::io::Result<()>;
}

/// In-memory persistence; useful for tests and for sharing a token between
/// stores in one process.
#[derive(Debug, Default)]
pub struct MemoryPersistence {
    slot: Mutex<Option<AccessToken>>,
}

impl MemoryPersistence {
    /// Create an empty persistence slot.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a slot pre-seeded with `token`.
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            slot: Mutex::new(Some(token)),
        }
    }
}

impl TokenPersistence for MemoryPersistence {
    fn load(&self) -> std::io::Result<Option<AccessToken>> {
        Ok(self.slot.lock().clone())
    }

    fn store(&self, token: Option<&AccessToken>) -> std::io::Result<()> {
        *self.slot.lock() = token.cloned();
        Ok(())
    }
}

/// File-backed persistence. The file holds the raw token and nothing else.
#[derive(Debug, Clone)]
pub struct FilePersistence {
    path: PathBuf,
}

impl FilePersistence {
    /// Persist to `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenPersistence for FilePersistence {
    fn load(&self) -> std::io::Result<Option<AccessToken>> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| AccessToken::new(token)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn store(&self, token: Option<&AccessToken>) -> std::io::Result<()> {
        match token {
            Some(token) => {
                if let Some(parent) = self.path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(&self.path, token.as_str())?;
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))?;
                }
                Ok(())
            }
            None => match std::fs::remove_file(&self.path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
                _ => Ok(()),
            },
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Store
// ─────────────────────────────────────────────────────────────────────────────

struct Listeners {
    next_id: u64,
    entries: Vec<(u64, TokenListener)>,
}

struct StoreInner {
    current: Mutex<Option<AccessToken>>,
    listeners: Mutex<Listeners>,
    persistence: Option<Arc<dyn TokenPersistence>>,
    hydrate: Once,
    /// Serializes `set` so listeners observe writes in order. Reentrant so a
    /// listener may itself call `set`.
    write_order: ReentrantMutex<()>,
}

/// Shared, cloneable access-token holder.
#[derive(Clone)]
pub struct TokenStore {
    inner: Arc<StoreInner>,
}

impl std::fmt::Debug for TokenStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenStore")
            .field("has_token", &self.inner.current.lock().is_some())
            .field("persistent", &self.inner.persistence.is_some())
            .finish()
    }
}

impl Default for TokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore {
    /// A store with no persistence.
    pub fn new() -> Self {
        Self::build(None)
    }

    /// A store mirrored into `persistence`.
    pub fn with_persistence(persistence: Arc<dyn TokenPersistence>) -> Self {
        Self::build(Some(persistence))
    }

    fn build(persistence: Option<Arc<dyn TokenPersistence>>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                current: Mutex::new(None),
                listeners: Mutex::new(Listeners {
                    next_id: 0,
                    entries: Vec::new(),
                }),
                persistence,
                hydrate: Once::new(),
                write_order: ReentrantMutex::new(()),
            }),
        }
    }

    /// Current access token.
    pub fn get(&self) -> Option<AccessToken> {
        self.hydrate();
        self.inner.current.lock().clone()
    }

    /// Whether a token is currently held.
    pub fn is_authenticated(&self) -> bool {
        self.get().is_some()
    }

    /// Replace the token, persist it, and notify subscribers before returning.
    pub fn set(&self, token: Option<AccessToken>) {
        self.hydrate();
        let _order = self.inner.write_order.lock();

        *self.inner.current.lock() = token.clone();

        if let Some(persistence) = &self.inner.persistence
            && let Err(e) = persistence.store(token.as_ref())
        {
            tracing::warn!(error = %e, "Failed to persist access token");
        }

        let listeners: Vec<TokenListener> = self
            .inner
            .listeners
            .lock()
            .entries
            .iter()
            .map(|(_, l)| Arc::clone(l))
            .collect();

        for listener in listeners {
            listener(token.as_ref());
        }
    }

    /// Drop the token. Equivalent to `set(None)`.
    pub fn clear(&self) {
        self.set(None);
    }

    /// Register `listener`; it stays registered until the returned handle is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(Option<&AccessToken>) + Send + Sync + 'static,
    {
        let mut listeners = self.inner.listeners.lock();
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, Arc::new(listener)));

        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Whether the persistence backend currently holds a token.
    pub fn has_persisted_token(&self) -> bool {
        match &self.inner.persistence {
            Some(p) => matches!(p.load(), Ok(Some(_))),
            None => false,
        }
    }

    fn hydrate(&self) {
        self.inner.hydrate.call_once(|| {
            let Some(persistence) = &self.inner.persistence else {
                return;
            };
            match persistence.load() {
                Ok(Some(token)) => {
                    tracing::debug!("Restored access token from persistence");
                    *self.inner.current.lock() = Some(token);
                }
                Ok(None) => {}
                Err(e) => tracing::warn!(error = %e, "Failed to read persisted access token"),
            }
        });
    }
}

/// Handle for a registered listener. Unsubscribes on drop.
#[must_use = "dropping a Subscription unsubscribes the listener"]
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    /// Remove the listener now.
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.store.upgrade() {
            inner.listeners.lock().entries.retain(|(id, _)| *id != self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
