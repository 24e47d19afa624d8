//! Token refresh coordination
//!
//! Any number of requests can fail with 401 at once; only one
//! `POST /auth/refresh` goes out. The first caller spawns the exchange and
//! parks a shared handle to its result in the coordinator; everyone arriving
//! while it runs awaits the same handle and observes the same outcome.
//!
//! ```text
//! Idle ──401──► Refreshing ──► Succeeded ─┐
//!                   │                     ├──► Idle
//!                   └────────► Failed ────┘
//! ```

use super::broadcaster::AuthFailureBroadcaster;
use super::store::AuthStore;
use super::types::TokenPayload;
use crate::error::{normalize, ApiError, Failure, Result};
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Path of the refresh exchange, relative to the API base URL
pub const REFRESH_PATH: &str = "/auth/refresh";

/// Path of the logout call, relative to the API base URL
pub const LOGOUT_PATH: &str = "/auth/logout";

type RefreshOutcome = Result<String>;
type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Single-flight refresh of the access token
pub struct RefreshCoordinator {
    http_client: reqwest::Client,
    base_url: String,
    store: Arc<AuthStore>,
    broadcaster: Arc<AuthFailureBroadcaster>,
    pending: Mutex<Option<PendingRefresh>>,
    exchanges: AtomicU64,
}

impl fmt::Debug for RefreshCoordinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshCoordinator")
            .field("base_url", &self.base_url)
            .field("in_flight", &self.pending.lock().is_some())
            .field("exchanges", &self.exchanges.load(Ordering::Relaxed))
            .finish()
    }
}

impl RefreshCoordinator {
    /// `http_client` must not route through the authenticated pipeline
    pub fn new(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        store: Arc<AuthStore>,
        broadcaster: Arc<AuthFailureBroadcaster>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            store,
            broadcaster,
            pending: Mutex::new(None),
            exchanges: AtomicU64::new(0),
        }
    }

    /// Whether an exchange is currently running
    pub fn is_refreshing(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Number of exchanges started over the coordinator's lifetime
    pub fn exchange_count(&self) -> u64 {
        self.exchanges.load(Ordering::Relaxed)
    }

    /// Obtain a fresh access token, joining an in-flight exchange if there is one
    pub async fn refresh(self: &Arc<Self>) -> Result<String> {
        let pending = {
            let mut slot = self.pending.lock();
            match slot.as_ref() {
                Some(pending) => {
                    debug!("Refresh already in flight, waiting on it");
                    pending.clone()
                }
                None => {
                    let Some(refresh_token) = self.store.refresh_token() else {
                        drop(slot);
                        return Err(self.fail_without_refresh_token());
                    };
                    let pending = self.start_exchange(refresh_token);
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Called with the slot lock held; nothing here may await
    fn start_exchange(self: &Arc<Self>, refresh_token: String) -> PendingRefresh {
        self.exchanges.fetch_add(1, Ordering::Relaxed);
        self.store.set_refreshing(true);

        let coordinator = Arc::clone(self);
        let exchange = tokio::spawn(async move {
            // Dropped on completion or unwind; waiters wake only after this
            let _idle = ReturnToIdle(Arc::clone(&coordinator));
            let outcome = coordinator.exchange(&refresh_token).await;
            coordinator.settle(outcome)
        });

        async move {
            exchange.await.unwrap_or_else(|e| {
                warn!("Refresh task did not complete: {}", e);
                Err(ApiError::session_expired())
            })
        }
        .boxed()
        .shared()
    }

    async fn exchange(&self, refresh_token: &str) -> std::result::Result<String, String> {
        debug!("Refreshing access token");

        let url = format!("{}{}", self.base_url, REFRESH_PATH);
        let response = self
            .http_client
            .post(&url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| format!("Token refresh request failed: {e}"))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(format!(
                "Token refresh failed with status {status}: {error_text}"
            ));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse token response: {e}"))?;
        let tokens = TokenPayload::from_value(&payload);

        let current = self.store.auth();
        let access_token = match tokens.access_token {
            Some(token) => token,
            None => {
                let fallback = current
                    .as_ref()
                    .map(|auth| auth.access_token.clone())
                    .filter(|token| !token.is_empty())
                    .ok_or_else(|| "Refresh response carried no access token".to_string())?;
                warn!("Using existing access token because refresh returned none");
                fallback
            }
        };

        // A concurrent logout wins; the token is still handed to waiters
        if let Some(current) = current {
            let refresh_token = tokens
                .refresh_token
                .unwrap_or_else(|| current.refresh_token.clone());
            self.store
                .set_auth(current.rotated(access_token.clone(), refresh_token));
        }

        Ok(access_token)
    }

    /// Runs once per exchange, inside the spawned task
    fn settle(&self, outcome: std::result::Result<String, String>) -> RefreshOutcome {
        match outcome {
            Ok(token) => {
                info!("Token refresh completed successfully");
                Ok(token)
            }
            Err(reason) => {
                warn!("{}", reason);
                let err = ApiError::session_expired();
                self.broadcaster.notify(&err);
                self.store.clear_auth();
                Err(err)
            }
        }
    }

    fn fail_without_refresh_token(&self) -> ApiError {
        debug!("No refresh token held, ending session");
        let err = ApiError::session_expired();
        self.store.clear_auth();
        self.broadcaster.notify(&err);
        err
    }

    /// Best-effort server-side revocation; every failure is swallowed
    pub async fn revoke(&self, refresh_token: &str) {
        let url = format!("{}{}", self.base_url, LOGOUT_PATH);
        let result = self
            .http_client
            .post(&url)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!("Refresh token revoked");
            }
            Ok(response) => {
                let err = normalize(Failure::from_response(response).await);
                debug!("Ignoring logout failure: {}", err);
            }
            Err(e) => debug!("Ignoring logout failure: {}", e),
        }
    }
}

/// Frees the slot and the store flag when the exchange task ends, however it ends
struct ReturnToIdle(Arc<RefreshCoordinator>);

impl Drop for ReturnToIdle {
    fn drop(&mut self) {
        *self.0.pending.lock() = None;
        self.0.store.set_refreshing(false);
    }
}
