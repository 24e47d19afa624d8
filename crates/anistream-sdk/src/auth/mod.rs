//! Authentication module for the AniStream SDK
//!
//! - Credential holder with persistence and change notification
//! - Auth failure broadcast to the UI shell
//! - Single-flight refresh-token exchange

pub mod broadcaster;
pub mod context;
pub mod refresh;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use broadcaster::{
    AuthFailureBroadcaster, AuthFailureHandler, AuthFailureSubscription, MemoryNavigator,
    Navigator,
};
pub use context::AuthContext;
pub use refresh::RefreshCoordinator;
pub use store::{AuthStore, CredentialBackend, FileBackend, MemoryBackend, StoreError};
pub use types::{AuthSnapshot, AuthStatus, Credential, TokenPayload, HOME_ROUTE};
