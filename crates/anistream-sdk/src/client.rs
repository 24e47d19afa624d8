//! HTTP client for the AniStream API
//!
//! Every call goes through one request pipeline:
//!
//! - the current access token, if any, is sent as `Authorization: Bearer {token}`
//! - a `401` triggers a single coordinated refresh and one replay of the request
//! - a `403`, or a `401` that cannot be recovered, ends the session and notifies
//!   subscribers registered with [`AniStreamClient::subscribe`]
//! - every other failure comes back as a normalized [`ApiError`]
//!
//! # Usage Examples
//!
//! ```rust,no_run
//! use anistream_sdk::{AniStreamClient, ClientBuilder};
//!
//! # async fn example() -> anistream_sdk::Result<()> {
//! let client = ClientBuilder::default()
//!     .base_url("http://localhost:8000")
//!     .with_tokens("access_token", "refresh_token")
//!     .build()
//!     .expect("valid configuration");
//!
//! let _subscription = client.subscribe(|route| println!("signed out, go to {route}"));
//! let favorites = client.list_favorites().await?;
//! # Ok(())
//! # }
//! ```

use crate::{
    auth::{
        AuthContext, AuthFailureSubscription, AuthStatus, AuthStore,
        Credential, CredentialBackend, FileBackend, MemoryBackend, MemoryNavigator, Navigator,
        StoreError, TokenPayload,
    },
    config::{ClientConfig, DEFAULT_API_URL, DEFAULT_TIMEOUT_SECS},
    error::{normalize, ApiError, ErrorCode, Failure, Result},
    types::{
        Anime, AnimeListItem, EpisodeListItem, Favorite, FavoriteCreate, LoginRequest, Page,
        UserProfile, WatchProgress, WatchProgressUpdate,
    },
};
use reqwest::{header::AUTHORIZATION, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Shortest query the search endpoint accepts
pub const MIN_SEARCH_QUERY_LEN: usize = 2;

/// Errors raised while assembling a client
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Failed to load persisted credentials: {0}")]
    Store(#[from] StoreError),
}

/// One outbound call, kept so it can be replayed after a refresh
#[derive(Debug, Clone)]
struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(&'static str, String)>,
    body: Option<Value>,
}

impl ApiRequest {
    fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    fn query(mut self, key: &'static str, value: impl ToString) -> Self {
        self.query.push((key, value.to_string()));
        self
    }

    fn json<B: Serialize>(mut self, body: &B) -> Result<Self> {
        let body = serde_json::to_value(body).map_err(|e| {
            ApiError::new(
                ErrorCode::RequestFailed,
                format!("Failed to encode request body: {e}"),
            )
        })?;
        self.body = Some(body);
        Ok(self)
    }
}

/// HTTP client for interacting with the AniStream API
#[derive(Debug)]
pub struct AniStreamClient {
    http_client: reqwest::Client,
    base_url: String,
    context: Arc<AuthContext>,
}

impl AniStreamClient {
    /// Client sharing an existing auth context
    pub fn with_context(
        http_client: reqwest::Client,
        base_url: impl Into<String>,
        context: Arc<AuthContext>,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            context,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn context(&self) -> &Arc<AuthContext> {
        &self.context
    }

    pub fn store(&self) -> &Arc<AuthStore> {
        self.context.store()
    }

    /// Register a handler called with the home route when the session ends
    pub fn subscribe<F>(&self, handler: F) -> AuthFailureSubscription
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        self.context.subscribe(handler)
    }

    /// Reload the persisted credential
    pub fn hydrate(&self) -> std::result::Result<AuthStatus, StoreError> {
        self.context.store().hydrate()
    }

    /// Wait for pending credential writes, e.g. a token rotated by a refresh
    pub async fn flush(&self) {
        self.context.store().flush().await;
    }

    // ===== Authentication =====

    /// Sign in and keep the issued credential
    pub async fn login(&self, email: &str, password: &str) -> Result<Credential> {
        self.authenticate("/auth/login", email, password).await
    }

    /// Create an account and sign in with it
    pub async fn register(&self, email: &str, password: &str) -> Result<Credential> {
        self.authenticate("/auth/register", email, password).await
    }

    /// Revoke the refresh token server-side, best effort, then forget it
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.context.store().refresh_token() {
            self.context.coordinator().revoke(&refresh_token).await;
        }
        self.context.store().clear_auth();
        self.flush().await;
        info!("Signed out");
    }

    /// Profile of the signed-in user
    pub async fn me(&self) -> Result<UserProfile> {
        self.fetch(ApiRequest::new(Method::GET, "/users/me")).await
    }

    // ===== Catalog =====

    pub async fn list_anime(&self, page: Page) -> Result<Vec<AnimeListItem>> {
        let request = ApiRequest::new(Method::GET, "/anime/")
            .query("limit", page.limit)
            .query("offset", page.offset);
        self.fetch(request).await
    }

    pub async fn get_anime(&self, anime_id: Uuid) -> Result<Anime> {
        self.fetch(ApiRequest::new(Method::GET, format!("/anime/{anime_id}")))
            .await
    }

    /// Search the catalog by title
    ///
    /// Queries shorter than [`MIN_SEARCH_QUERY_LEN`] characters are rejected
    /// without a network call.
    pub async fn search_anime(&self, query: &str, page: Page) -> Result<Vec<AnimeListItem>> {
        let query = query.trim();
        if query.chars().count() < MIN_SEARCH_QUERY_LEN {
            return Err(ApiError::new(
                ErrorCode::RequestFailed,
                format!("Search query must be at least {MIN_SEARCH_QUERY_LEN} characters"),
            ));
        }

        let request = ApiRequest::new(Method::GET, "/search/anime")
            .query("q", query)
            .query("limit", page.limit)
            .query("offset", page.offset);
        self.fetch(request).await
    }

    pub async fn list_episodes(&self, anime_id: Uuid) -> Result<Vec<EpisodeListItem>> {
        let request = ApiRequest::new(Method::GET, "/episodes/").query("anime_id", anime_id);
        self.fetch(request).await
    }

    // ===== Favorites =====

    pub async fn list_favorites(&self) -> Result<Vec<Favorite>> {
        self.fetch(ApiRequest::new(Method::GET, "/favorites/")).await
    }

    pub async fn add_favorite(&self, anime_id: Uuid) -> Result<Favorite> {
        let request =
            ApiRequest::new(Method::POST, "/favorites/").json(&FavoriteCreate { anime_id })?;
        self.fetch(request).await
    }

    pub async fn remove_favorite(&self, anime_id: Uuid) -> Result<()> {
        self.execute(ApiRequest::new(
            Method::DELETE,
            format!("/favorites/{anime_id}"),
        ))
        .await?;
        Ok(())
    }

    // ===== Watch history =====

    /// Record the playback position of an episode
    pub async fn update_watch_progress(
        &self,
        update: &WatchProgressUpdate,
    ) -> Result<WatchProgress> {
        let request = ApiRequest::new(Method::POST, "/watch/progress").json(update)?;
        self.fetch(request).await
    }

    /// Most recently watched titles
    pub async fn continue_watching(&self) -> Result<Vec<WatchProgress>> {
        self.fetch(ApiRequest::new(Method::GET, "/watch/continue"))
            .await
    }

    // ===== Private Helper Methods =====

    /// Login and register bypass the pipeline: a 401 here means bad
    /// credentials, not an expired session.
    async fn authenticate(&self, path: &str, email: &str, password: &str) -> Result<Credential> {
        let url = format!("{}{}", self.base_url, path);
        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };

        let response = self.http_client.post(&url).json(&request).send().await?;
        if !response.status().is_success() {
            return Err(normalize(Failure::from_response(response).await));
        }

        let payload: Value = response.json().await?;
        let tokens = TokenPayload::from_value(&payload);
        let (Some(access_token), Some(refresh_token)) = (tokens.access_token, tokens.refresh_token)
        else {
            return Err(ApiError::new(
                ErrorCode::UnknownError,
                "Sign-in response carried no credential",
            ));
        };

        let mut credential = Credential::new(access_token, refresh_token);
        credential.email = Some(email.to_string());
        self.context.store().set_auth(credential.clone());

        match self.me().await {
            Ok(profile) => {
                if let Some(mut current) = self.context.store().auth() {
                    current.id = Some(profile.id.to_string());
                    current.email = Some(profile.email);
                    current.avatar = profile.avatar;
                    self.context.store().set_auth(current.clone());
                    credential = current;
                }
            }
            Err(e) => debug!("Could not load profile after sign-in: {}", e),
        }
        self.flush().await;

        info!("Signed in as {}", email);
        Ok(credential)
    }

    /// Send a request through the pipeline and decode the JSON body
    async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T> {
        let response = self.execute(request).await?;
        Ok(response.json().await?)
    }

    /// The request pipeline
    async fn execute(&self, request: ApiRequest) -> Result<Response> {
        let mut token = self.current_token();
        let mut retried = false;

        loop {
            let response = self.send(&request, token.as_deref()).await?;
            let status = response.status();
            if status.is_success() {
                return Ok(response);
            }

            let failure = Failure::from_response(response).await;

            if status == StatusCode::UNAUTHORIZED
                && !retried
                && self.context.store().refresh_token().is_some()
            {
                debug!(
                    "{} {} returned 401, refreshing access token",
                    request.method, request.path
                );
                retried = true;
                token = Some(self.context.coordinator().refresh().await?);
                continue;
            }

            return Err(self.context.reject(failure));
        }
    }

    /// Transport failures are normalized here with no auth side effects
    async fn send(&self, request: &ApiRequest, token: Option<&str>) -> Result<Response> {
        let url = format!("{}{}", self.base_url, request.path);
        let mut builder = self.http_client.request(request.method.clone(), &url);

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        if let Some(token) = token {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", request.method, request.path, e);
            normalize(e)
        })
    }

    fn current_token(&self) -> Option<String> {
        self.context
            .store()
            .access_token()
            .filter(|token| !token.is_empty())
    }
}

/// Builder for constructing an AniStreamClient with custom configuration
#[derive(Default)]
pub struct ClientBuilder {
    base_url: Option<String>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    backend: Option<Arc<dyn CredentialBackend>>,
    navigator: Option<Arc<dyn Navigator>>,
}

impl ClientBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder preloaded from a [`ClientConfig`]; credentials persist to
    /// the configured data dir when one is set
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::new()
            .base_url(config.api.base_url.clone())
            .timeout(config.request_timeout());
        if let Some(connect_timeout) = config.connect_timeout() {
            builder = builder.connect_timeout(connect_timeout);
        }
        if let Some(dir) = &config.storage.data_dir {
            builder = builder.credential_backend(Arc::new(FileBackend::new(dir)));
        }
        builder
    }

    /// Set the base URL for the API
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Start signed in with the given tokens
    pub fn with_tokens(
        mut self,
        access_token: impl Into<String>,
        refresh_token: impl Into<String>,
    ) -> Self {
        self.access_token = Some(access_token.into());
        self.refresh_token = Some(refresh_token.into());
        self
    }

    /// Set the request timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the connection timeout
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Where the credential is persisted; memory only by default
    pub fn credential_backend(mut self, backend: Arc<dyn CredentialBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Navigation target used when a session ends with no subscribers
    pub fn navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Build the client, loading any persisted credential
    pub fn build(self) -> std::result::Result<AniStreamClient, BuildError> {
        let base_url = self.base_url.unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let base_url = base_url.trim_end_matches('/').to_string();
        url::Url::parse(&base_url)?;

        let mut http_client = reqwest::Client::builder().timeout(
            self.timeout
                .unwrap_or(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
        );
        if let Some(connect_timeout) = self.connect_timeout {
            http_client = http_client.connect_timeout(connect_timeout);
        }
        let http_client = http_client.build()?;

        let backend = self
            .backend
            .unwrap_or_else(|| Arc::new(MemoryBackend::new()));
        let store = Arc::new(AuthStore::new(backend));
        store.hydrate()?;

        if let (Some(access_token), Some(refresh_token)) = (self.access_token, self.refresh_token)
        {
            store.set_auth(Credential::new(access_token, refresh_token));
        }

        let navigator = self
            .navigator
            .unwrap_or_else(|| Arc::new(MemoryNavigator::default()));

        // The refresh exchange shares the connection pool but not the pipeline
        let context = Arc::new(AuthContext::new(
            base_url.clone(),
            http_client.clone(),
            store,
            navigator,
        ));

        Ok(AniStreamClient::with_context(http_client, base_url, context))
    }
}
