//! AniStream SDK
//!
//! Authenticated HTTP client for the AniStream catalog API. Requests carry the
//! current bearer token; an expired access token is refreshed once for all
//! concurrent callers and the failed requests are replayed; every failure is
//! normalized into an [`ApiError`] with a code from a closed set.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod types;

pub use auth::{
    AuthContext, AuthFailureSubscription, AuthSnapshot, AuthStatus, AuthStore, Credential,
    CredentialBackend, FileBackend, MemoryBackend, MemoryNavigator, Navigator, StoreError,
};
pub use client::{AniStreamClient, BuildError, ClientBuilder};
pub use config::ClientConfig;
pub use error::{normalize, ApiError, ErrorCode, Failure, Result};
pub use types::*;
