//! Auth failure broadcaster
//!
//! Terminal authentication failures end up here. The broadcaster clears the
//! credential and tells the UI shell where to go next, either through the
//! registered handlers or, when nobody listens, by driving a [`Navigator`]
//! back to [`HOME_ROUTE`].
//!
//! Two guards keep a burst of failing requests from producing a burst of
//! logouts: each failure instance is handled at most once, and a
//! notification raised while another one is running is dropped.

use super::store::AuthStore;
use super::types::HOME_ROUTE;
use crate::error::ApiError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Callback receiving the redirect target
pub type AuthFailureHandler = Arc<dyn Fn(&str) + Send + Sync>;

type HandlerRegistry = Arc<Mutex<BTreeMap<u64, AuthFailureHandler>>>;

/// Fallback navigation used when no handler is registered
pub trait Navigator: Send + Sync {
    fn current_location(&self) -> String;
    fn replace(&self, location: &str);
}

/// Navigator that only tracks the location it was sent to
#[derive(Debug)]
pub struct MemoryNavigator {
    location: Mutex<String>,
}

impl MemoryNavigator {
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
        }
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(HOME_ROUTE)
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> String {
        self.location.lock().clone()
    }

    fn replace(&self, location: &str) {
        info!("Navigating to {}", location);
        *self.location.lock() = location.to_string();
    }
}

/// Registration returned by [`AuthFailureBroadcaster::subscribe`]
#[derive(Debug)]
#[must_use = "dropping the subscription keeps the handler registered; call unsubscribe() to remove it"]
pub struct AuthFailureSubscription {
    id: u64,
    registry: Weak<Mutex<BTreeMap<u64, AuthFailureHandler>>>,
}

impl AuthFailureSubscription {
    /// Remove the handler; a no-op once the broadcaster is gone
    pub fn unsubscribe(self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().remove(&self.id);
        }
    }
}

/// Observer set for terminal auth failures
pub struct AuthFailureBroadcaster {
    store: Arc<AuthStore>,
    navigator: Arc<dyn Navigator>,
    handlers: HandlerRegistry,
    next_id: AtomicU64,
    handling: AtomicBool,
}

impl fmt::Debug for AuthFailureBroadcaster {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthFailureBroadcaster")
            .field("handlers", &self.handler_count())
            .field("handling", &self.handling.load(Ordering::Acquire))
            .finish()
    }
}

/// Clears the re-entrancy flag however the handler run ends
struct HandlingGuard<'a>(&'a AtomicBool);

impl Drop for HandlingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AuthFailureBroadcaster {
    pub fn new(store: Arc<AuthStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            store,
            navigator,
            handlers: Arc::new(Mutex::new(BTreeMap::new())),
            next_id: AtomicU64::new(0),
            handling: AtomicBool::new(false),
        }
    }

    /// Register a handler; it receives the redirect target on every terminal failure
    pub fn subscribe<F>(&self, handler: F) -> AuthFailureSubscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.handlers.lock().insert(id, Arc::new(handler));
        AuthFailureSubscription {
            id,
            registry: Arc::downgrade(&self.handlers),
        }
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.lock().len()
    }

    /// Broadcast `error` if it is an auth failure not seen before.
    ///
    /// Returns `true` when this call ran the failure handling.
    pub fn notify(&self, error: &ApiError) -> bool {
        if !error.is_auth_failure() {
            return false;
        }
        if !error.mark_handled() {
            debug!("Auth failure already handled, skipping broadcast");
            return false;
        }
        self.handle_failure()
    }

    fn handle_failure(&self) -> bool {
        if self.handling.swap(true, Ordering::AcqRel) {
            debug!("Auth failure handling already in progress");
            return false;
        }
        let _guard = HandlingGuard(&self.handling);

        self.store.clear_auth();

        // Snapshot so handlers may (un)subscribe without deadlocking
        let handlers: Vec<AuthFailureHandler> = self.handlers.lock().values().cloned().collect();
        if !handlers.is_empty() {
            info!("Session ended, notifying {} handler(s)", handlers.len());
            for handler in handlers {
                handler(HOME_ROUTE);
            }
            return true;
        }

        if self.navigator.current_location() != HOME_ROUTE {
            self.navigator.replace(HOME_ROUTE);
        }
        true
    }
}
