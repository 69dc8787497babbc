//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! Field names follow the wire contract the session client relies on.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::{FoodRecord, LoggedEntry, NutritionProfile};

/// `GET /api/search` query parameters
#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
}

/// `GET /api/search` response
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    #[serde(rename = "searchResults")]
    pub search_results: Vec<FoodRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// `GET /api/nutrition` query parameters
#[derive(Debug, Deserialize)]
pub struct NutritionParams {
    #[serde(default)]
    pub id: Option<String>,
}

/// `GET /api/nutrition` response
#[derive(Debug, Serialize)]
pub struct NutritionResponse {
    pub nutrition: NutritionProfile,
}

/// A logged entry as kept by the server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEntry {
    #[serde(flatten)]
    pub entry: LoggedEntry,
    pub timestamp: DateTime<Utc>,
}

/// `POST /api/log-food` response
#[derive(Debug, Serialize)]
pub struct LogFoodResponse {
    pub message: String,
    pub food: StoredEntry,
}

/// Full health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Overall status: healthy, degraded
    pub status: String,
    /// Provider status: configured, missing_api_key
    pub provider: String,
    /// Entries received this process lifetime
    pub logged_entries: usize,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
