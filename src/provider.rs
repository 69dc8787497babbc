//! Spoonacular Provider
//!
//! Upstream catalog and nutrition source for the backend server.
//! Recipes stand in for foods; their nutrient lists are boiled down to the
//! four values the log tracks.

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::config::ServerConfig;
use crate::model::{FoodId, FoodRecord, NutritionProfile};

/// Spoonacular REST client
pub struct SpoonacularClient {
    client: Client,
    base_url: String,
    api_key: String,
    search_limit: u32,
}

impl SpoonacularClient {
    /// Build a client; `None` when no API key is configured
    pub fn from_config(config: &ServerConfig) -> Result<Option<Self>, ProviderError> {
        let api_key = match config.spoonacular_api_key.as_deref() {
            Some(key) if !key.is_empty() => key.to_string(),
            _ => return Ok(None),
        };

        let client = Client::builder()
            .timeout(Duration::from_millis(config.upstream_timeout_ms))
            .build()
            .map_err(ProviderError::Request)?;

        Ok(Some(Self {
            client,
            base_url: config.spoonacular_base_url.trim_end_matches('/').to_string(),
            api_key,
            search_limit: config.search_limit,
        }))
    }

    /// Search recipes by free text
    pub async fn search(&self, query: &str) -> Result<Vec<FoodRecord>, ProviderError> {
        let url = format!("{}/recipes/complexSearch", self.base_url);
        let limit = self.search_limit.to_string();

        let response = self
            .client
            .get(&url)
            .query(&[
                ("apiKey", self.api_key.as_str()),
                ("query", query),
                ("number", limit.as_str()),
                ("addNutrition", "true"),
            ])
            .send()
            .await
            .map_err(map_request_error)?;

        let body: ComplexSearchResponse = read_json(response).await?;

        Ok(body
            .results
            .into_iter()
            .map(|item| FoodRecord {
                id: item.id,
                title: item.title,
                image: item.image,
            })
            .collect())
    }

    /// Fetch nutrition for one recipe
    pub async fn nutrition(&self, id: &str) -> Result<NutritionProfile, ProviderError> {
        let url = format!(
            "{}/recipes/{}/information",
            self.base_url,
            urlencoding::encode(id)
        );

        let response = self
            .client
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str()), ("includeNutrition", "true")])
            .send()
            .await
            .map_err(map_request_error)?;

        let body: RecipeInformation = read_json(response).await?;
        let nutrition = body
            .nutrition
            .ok_or_else(|| ProviderError::Malformed("recipe has no nutrition block".to_string()))?;

        if nutrition.nutrients.is_empty() {
            return Err(ProviderError::Malformed("recipe lists no nutrients".to_string()));
        }

        Ok(profile_from_nutrients(&nutrition.nutrients))
    }
}

/// Reduce a Spoonacular nutrient list to calories/protein/carbs/fat
///
/// Calories fall back to the first listed nutrient, which Spoonacular
/// always reports as calories.
pub fn profile_from_nutrients(nutrients: &[Nutrient]) -> NutritionProfile {
    let find = |name: &str| {
        nutrients
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
            .map(|n| n.amount)
    };

    NutritionProfile {
        calories: find("Calories").or_else(|| nutrients.first().map(|n| n.amount)),
        protein: Some(find("Protein").unwrap_or(0.0)),
        carbs: Some(find("Carbohydrates").unwrap_or(0.0)),
        fat: Some(find("Fat").unwrap_or(0.0)),
    }
}

async fn read_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, ProviderError> {
    let status = response.status();
    let text = response.text().await.map_err(map_request_error)?;

    if !status.is_success() {
        return Err(ProviderError::Upstream {
            status: status.as_u16(),
            message: text,
        });
    }

    serde_json::from_str(&text).map_err(|e| ProviderError::Malformed(e.to_string()))
}

fn map_request_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::Unavailable
    } else {
        ProviderError::Request(e)
    }
}

#[derive(Debug, Deserialize)]
struct ComplexSearchResponse {
    #[serde(default)]
    results: Vec<RecipeSummary>,
}

#[derive(Debug, Deserialize)]
struct RecipeSummary {
    id: FoodId,
    #[serde(default)]
    title: String,
    #[serde(default)]
    image: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RecipeInformation {
    #[serde(default)]
    nutrition: Option<NutritionBlock>,
}

#[derive(Debug, Deserialize)]
struct NutritionBlock {
    #[serde(default)]
    nutrients: Vec<Nutrient>,
}

/// One entry of a Spoonacular nutrient list
#[derive(Debug, Clone, Deserialize)]
pub struct Nutrient {
    pub name: String,
    pub amount: f64,
    #[serde(default)]
    pub unit: Option<String>,
}

/// Errors talking to Spoonacular
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Spoonacular unavailable")]
    Unavailable,

    #[error("Request timeout")]
    Timeout,

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Spoonacular error {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Unexpected Spoonacular response: {0}")]
    Malformed(String),
}
