//! Auth context
//!
//! Owns the pieces the request pipeline coordinates: the [`AuthStore`], the
//! [`AuthFailureBroadcaster`] and the [`RefreshCoordinator`]. One context is
//! one session scope; single-flight refresh holds within it.

use super::broadcaster::{AuthFailureBroadcaster, AuthFailureSubscription, Navigator};
use super::refresh::RefreshCoordinator;
use super::store::AuthStore;
use crate::error::{normalize, ApiError, Failure};
use std::sync::Arc;
use tracing::debug;

#[derive(Debug)]
pub struct AuthContext {
    store: Arc<AuthStore>,
    broadcaster: Arc<AuthFailureBroadcaster>,
    coordinator: Arc<RefreshCoordinator>,
}

impl AuthContext {
    /// Wire up a context.
    ///
    /// `auth_client` is used for the refresh and logout exchanges and must
    /// be a plain client, not one that goes through the request pipeline.
    pub fn new(
        base_url: impl Into<String>,
        auth_client: reqwest::Client,
        store: Arc<AuthStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let broadcaster = Arc::new(AuthFailureBroadcaster::new(Arc::clone(&store), navigator));
        let coordinator = Arc::new(RefreshCoordinator::new(
            auth_client,
            base_url,
            Arc::clone(&store),
            Arc::clone(&broadcaster),
        ));

        Self {
            store,
            broadcaster,
            coordinator,
        }
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        &self.store
    }

    pub fn broadcaster(&self) -> &Arc<AuthFailureBroadcaster> {
        &self.broadcaster
    }

    pub fn coordinator(&self) -> &Arc<RefreshCoordinator> {
        &self.coordinator
    }

    /// Register a handler for terminal auth failures
    pub fn subscribe<F>(&self, handler: F) -> AuthFailureSubscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.broadcaster.subscribe(handler)
    }

    /// Normalize a failure that will not be retried.
    ///
    /// Auth failures (401/403) end the session; anything else is returned
    /// as-is with no side effects.
    pub fn reject(&self, failure: impl Into<Failure>) -> ApiError {
        let err = normalize(failure);
        if self.broadcaster.notify(&err) {
            debug!("Terminal auth failure ({}), session cleared", err.code());
        }
        err
    }
}
