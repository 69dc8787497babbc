//! Remote Clients
//!
//! Seams between the session and the backend:
//!
//! - **CatalogSearch**: `GET /api/search?query=` → candidate food records
//! - **NutritionLookup**: `GET /api/nutrition?id=` → nutrition profile
//! - **LogPersistence**: `POST /api/log-food` → acknowledgement
//!
//! `HttpClient` implements all three over reqwest. The coordinator only sees
//! the traits, so tests swap in in-memory fakes.

mod http;

pub use http::HttpClient;

use crate::error::TrackerResult;
use crate::model::{FoodId, FoodRecord, LoggedEntry, NutritionProfile};
use async_trait::async_trait;

/// Food catalog search
#[async_trait]
pub trait CatalogSearch: Send + Sync {
    /// Search the catalog; the query is passed through as given
    async fn search(&self, query: &str) -> TrackerResult<Vec<FoodRecord>>;
}

/// Nutrition lookup for a single food
#[async_trait]
pub trait NutritionLookup: Send + Sync {
    async fn resolve(&self, food_id: &FoodId) -> TrackerResult<NutritionProfile>;
}

/// Remote append of a committed log entry
#[async_trait]
pub trait LogPersistence: Send + Sync {
    async fn persist(&self, entry: &LoggedEntry) -> TrackerResult<()>;
}
