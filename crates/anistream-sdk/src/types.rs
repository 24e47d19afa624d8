//! Type definitions for the AniStream API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Email/password pair for login and registration
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authenticated user's profile
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub is_active: bool,
    #[serde(default)]
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Pagination for list endpoints
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct Page {
    pub limit: u32,
    pub offset: u32,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: 20,
            offset: 0,
        }
    }
}

/// Catalog entry as returned by list and search endpoints
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnimeListItem {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
}

/// Full anime record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Anime {
    pub id: Uuid,
    pub title: String,
    #[serde(default)]
    pub title_original: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub status: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EpisodeListItem {
    pub id: Uuid,
    pub number: u32,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Favorite {
    pub id: Uuid,
    pub anime_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FavoriteCreate {
    pub anime_id: Uuid,
}

/// Playback position report
#[derive(Debug, Clone, Serialize)]
pub struct WatchProgressUpdate {
    pub anime_id: Uuid,
    pub episode: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position_seconds: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress_percent: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchProgress {
    pub id: Uuid,
    pub anime_id: Uuid,
    pub episode: u32,
    #[serde(default)]
    pub position_seconds: Option<u32>,
    #[serde(default)]
    pub progress_percent: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub last_watched_at: DateTime<Utc>,
}
