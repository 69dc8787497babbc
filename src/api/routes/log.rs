//! Log Routes
//!
//! - POST /api/log-food - Append an entry to the server's log
//! - GET /api/daily-log - Entries received so far

use axum::{extract::State, Json};
use chrono::Utc;
use std::sync::Arc;

use crate::api::dto::{LogFoodResponse, StoredEntry};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::model::LoggedEntry;

/// POST /api/log-food
pub async fn log_food(
    State(state): State<Arc<AppState>>,
    Json(entry): Json<LoggedEntry>,
) -> ApiResult<Json<LogFoodResponse>> {
    entry.nutrition.validate().map_err(ApiError::Validation)?;

    let stored = StoredEntry {
        entry,
        timestamp: Utc::now(),
    };

    let count = {
        let mut log = state.food_log.write().await;
        log.push(stored.clone());
        log.len()
    };

    tracing::info!(
        food_id = %stored.entry.id(),
        title = stored.entry.title(),
        entries = count,
        "Food logged"
    );

    Ok(Json(LogFoodResponse {
        message: "Food logged successfully".to_string(),
        food: stored,
    }))
}

/// GET /api/daily-log
pub async fn daily_log(State(state): State<Arc<AppState>>) -> Json<Vec<StoredEntry>> {
    Json(state.food_log.read().await.clone())
}
