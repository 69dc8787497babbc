//! Food Routes
//!
//! Catalog search and nutrition lookup, proxied to Spoonacular.
//!
//! - GET /api/search?query= - Search foods
//! - GET /api/nutrition?id= - Nutrition for one food

use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::api::dto::{NutritionParams, NutritionResponse, SearchParams, SearchResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;
use crate::provider::SpoonacularClient;

/// GET /api/search
///
/// A missing or empty query is rejected; anything else, whitespace included,
/// goes upstream as given. Zero matches is a 200 with an empty list.
pub async fn search_food(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<SearchResponse>> {
    let query = params.query.unwrap_or_default();
    let query = query.as_str();
    if query.is_empty() {
        return Err(ApiError::Validation("Query parameter is required".to_string()));
    }

    let provider = provider(&state)?;
    let results = provider.search(query).await?;

    tracing::info!(query, results = results.len(), "Food search");

    let message = results.is_empty().then(|| "No results found".to_string());
    Ok(Json(SearchResponse {
        search_results: results,
        message,
    }))
}

/// GET /api/nutrition
pub async fn get_nutrition(
    State(state): State<Arc<AppState>>,
    Query(params): Query<NutritionParams>,
) -> ApiResult<Json<NutritionResponse>> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::Validation("Food ID is required".to_string()))?;

    let provider = provider(&state)?;
    let nutrition = provider.nutrition(id.trim()).await?;

    tracing::debug!(food_id = %id, calories = nutrition.calories(), "Nutrition lookup");

    Ok(Json(NutritionResponse { nutrition }))
}

fn provider(state: &AppState) -> ApiResult<&SpoonacularClient> {
    state
        .provider
        .as_deref()
        .ok_or_else(|| ApiError::ServiceUnavailable("SPOONACULAR_API_KEY is not set".to_string()))
}
