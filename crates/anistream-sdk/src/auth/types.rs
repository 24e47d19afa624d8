//! Credential and auth-state types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Storage key the credential is persisted under
pub const AUTH_STORAGE_KEY: &str = "auth";

/// Location terminal auth failures redirect to
pub const HOME_ROUTE: &str = "/";

/// Credential pair plus the profile fields that travel with it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_skip: Option<bool>,
}

impl Credential {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            id: None,
            avatar: None,
            email: None,
            username: None,
            collection_id: None,
            collection_name: None,
            auto_skip: None,
        }
    }

    /// Same profile, rotated tokens
    pub fn rotated(&self, access_token: String, refresh_token: String) -> Self {
        Self {
            access_token,
            refresh_token,
            ..self.clone()
        }
    }
}

/// Whether a credential is known to be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    /// Persisted state not loaded yet
    Unknown,
    Authenticated,
    Unauthenticated,
}

impl AuthStatus {
    pub(crate) fn resolve(auth: Option<&Credential>) -> Self {
        if auth.is_some() {
            AuthStatus::Authenticated
        } else {
            AuthStatus::Unauthenticated
        }
    }
}

/// Point-in-time view of the auth state, as seen by subscribers
#[derive(Debug, Clone, PartialEq)]
pub struct AuthSnapshot {
    pub auth: Option<Credential>,
    pub status: AuthStatus,
    pub is_refreshing: bool,
}

impl Default for AuthSnapshot {
    fn default() -> Self {
        Self {
            auth: None,
            status: AuthStatus::Unknown,
            is_refreshing: false,
        }
    }
}

/// Field-name variants accepted for the access token, tried in order
pub const ACCESS_TOKEN_FIELDS: &[&str] = &["access_token", "accessToken", "token"];

/// Field-name variants accepted for the refresh token, tried in order
pub const REFRESH_TOKEN_FIELDS: &[&str] = &["refresh_token", "refreshToken"];

/// Tokens found in a login or refresh response
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenPayload {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
}

impl TokenPayload {
    /// Extract tokens from a loosely shaped response body
    pub fn from_value(payload: &Value) -> Self {
        Self {
            access_token: first_non_empty(payload, ACCESS_TOKEN_FIELDS),
            refresh_token: first_non_empty(payload, REFRESH_TOKEN_FIELDS),
        }
    }
}

fn first_non_empty(payload: &Value, fields: &[&str]) -> Option<String> {
    fields
        .iter()
        .filter_map(|field| payload.get(*field).and_then(Value::as_str))
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

/// On-disk envelope for the persisted auth state
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedAuth {
    pub state: PersistedState,
    #[serde(default)]
    pub version: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct PersistedState {
    #[serde(default)]
    pub auth: Option<Credential>,
}
