//! HTTP client for the nutrilog backend
//!
//! Every failure mode (connect error, timeout, non-2xx, bad JSON) becomes a
//! `TrackerError` for the endpoint that produced it. Nothing here panics on
//! a bad response.

use async_trait::async_trait;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::time::Duration;

use super::{CatalogSearch, LogPersistence, NutritionLookup};
use crate::config::ClientConfig;
use crate::error::{Endpoint, TrackerError, TrackerResult};
use crate::model::{FoodId, FoodRecord, LoggedEntry, NutritionProfile};

/// reqwest-backed implementation of the three backend seams
pub struct HttpClient {
    client: Client,
    config: ClientConfig,
}

impl HttpClient {
    pub fn new(config: ClientConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    /// Send a GET and hand back the body of a 2xx response
    async fn get_text(&self, url: &str) -> Result<String, String> {
        let response = self.client.get(url).send().await.map_err(describe)?;
        read_success(response).await
    }

    /// Quadratic backoff: 1x, 4x, 9x the base delay
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = u64::from(attempt).saturating_pow(2);
        Duration::from_millis(self.config.retry_backoff_ms.saturating_mul(factor))
    }

    /// POST with retry on transport errors and 429/5xx responses
    async fn post_with_retry(&self, url: &str, entry: &LoggedEntry) -> Result<(), String> {
        let attempts = self.config.max_retries.max(1);
        let mut last_error = String::from("no attempt made");

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.backoff(attempt)).await;
            }

            match self.client.post(url).json(entry).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        return Ok(());
                    }

                    let text = response.text().await.unwrap_or_default();
                    last_error = format!("status {}: {}", status.as_u16(), text);

                    if status.as_u16() != 429 && !status.is_server_error() {
                        return Err(last_error);
                    }
                }
                Err(e) => {
                    last_error = describe(e);
                }
            }

            tracing::debug!(attempt = attempt + 1, error = %last_error, "Log persist attempt failed");
        }

        Err(last_error)
    }
}

#[async_trait]
impl CatalogSearch for HttpClient {
    async fn search(&self, query: &str) -> TrackerResult<Vec<FoodRecord>> {
        let url = format!(
            "{}?query={}",
            self.url("/api/search"),
            urlencoding::encode(query.trim())
        );

        let body = self.get_text(&url).await.map_err(TrackerError::SearchFailed)?;

        let parsed: SearchResponse = serde_json::from_str(&body)
            .map_err(|e| TrackerError::malformed(Endpoint::Search, e.to_string()))?;

        Ok(parsed.search_results)
    }
}

#[async_trait]
impl NutritionLookup for HttpClient {
    async fn resolve(&self, food_id: &FoodId) -> TrackerResult<NutritionProfile> {
        let url = format!(
            "{}?id={}",
            self.url("/api/nutrition"),
            urlencoding::encode(&food_id.to_string())
        );

        let body = self
            .get_text(&url)
            .await
            .map_err(|reason| TrackerError::ResolutionFailed {
                food_id: food_id.to_string(),
                reason,
            })?;

        let parsed: NutritionResponse = serde_json::from_str(&body)
            .map_err(|e| TrackerError::malformed(Endpoint::Nutrition, e.to_string()))?;

        let profile = parsed
            .nutrition
            .filter(|n| !n.is_empty())
            .ok_or_else(|| TrackerError::malformed(Endpoint::Nutrition, "no nutrition values"))?;

        profile
            .validate()
            .map_err(|reason| TrackerError::malformed(Endpoint::Nutrition, reason))?;

        Ok(profile)
    }
}

#[async_trait]
impl LogPersistence for HttpClient {
    async fn persist(&self, entry: &LoggedEntry) -> TrackerResult<()> {
        let url = self.url("/api/log-food");
        self.post_with_retry(&url, entry)
            .await
            .map_err(TrackerError::PersistFailed)
    }
}

async fn read_success(response: Response) -> Result<String, String> {
    let status = response.status();
    let text = response.text().await.map_err(describe)?;

    if status.is_success() {
        Ok(text)
    } else {
        Err(format!("status {}: {}", status.as_u16(), text))
    }
}

fn describe(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        "backend unavailable".to_string()
    } else {
        e.to_string()
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(rename = "searchResults", default)]
    search_results: Vec<FoodRecord>,
}

#[derive(Debug, Deserialize)]
struct NutritionResponse {
    #[serde(default)]
    nutrition: Option<NutritionProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;
    use axum::{
        extract::{Query, State},
        http::StatusCode,
        routing::{get, post},
        Json, Router,
    };
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct StubState {
        log_calls: AtomicUsize,
        fail_first_logs: usize,
    }

    async fn stub_search(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        match params.get("query").map(String::as_str) {
            Some("dosa") => (
                StatusCode::OK,
                r#"{"searchResults": [{"id": 1, "title": "Masala Dosa", "image": "https://img/1.jpg"}, {"id": "x2", "title": "Rava Dosa"}]}"#.to_string(),
            ),
            Some("broken") => (StatusCode::OK, "<html>oops</html>".to_string()),
            Some("down") => (StatusCode::BAD_GATEWAY, "upstream down".to_string()),
            Some("") => (StatusCode::BAD_REQUEST, r#"{"error": "Query parameter is required"}"#.to_string()),
            _ => (StatusCode::OK, r#"{"message": "No results found"}"#.to_string()),
        }
    }

    async fn stub_nutrition(Query(params): Query<HashMap<String, String>>) -> (StatusCode, String) {
        match params.get("id").map(String::as_str) {
            Some("1") => (
                StatusCode::OK,
                r#"{"nutrition": {"calories": 168, "protein": 4, "carbs": 33, "fat": 3}}"#.to_string(),
            ),
            Some("2") => (StatusCode::OK, r#"{"nutrition": {"calories": 90}}"#.to_string()),
            Some("3") => (StatusCode::OK, r#"{"nutrition": {}}"#.to_string()),
            Some("4") => (StatusCode::OK, r#"{"nutrition": {"calories": -5}}"#.to_string()),
            Some("5") => (StatusCode::OK, "not json".to_string()),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, r#"{"error": "boom"}"#.to_string()),
        }
    }

    async fn stub_log(
        State(state): State<Arc<StubState>>,
        Json(_entry): Json<LoggedEntry>,
    ) -> StatusCode {
        let call = state.log_calls.fetch_add(1, Ordering::SeqCst);
        if call < state.fail_first_logs {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::OK
        }
    }

    async fn spawn_stub(fail_first_logs: usize) -> (String, Arc<StubState>) {
        let state = Arc::new(StubState {
            fail_first_logs,
            ..Default::default()
        });

        let app = Router::new()
            .route("/api/search", get(stub_search))
            .route("/api/nutrition", get(stub_nutrition))
            .route("/api/log-food", post(stub_log))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), state)
    }

    fn client_for(base_url: &str, max_retries: u32) -> HttpClient {
        HttpClient::new(ClientConfig {
            base_url: base_url.to_string(),
            request_timeout_ms: 2000,
            max_retries,
            retry_backoff_ms: 1,
        })
        .unwrap()
    }

    fn sample_entry() -> LoggedEntry {
        LoggedEntry::new(
            FoodRecord::new(1, "Masala Dosa"),
            NutritionProfile::new(168.0, 4.0, 33.0, 3.0),
        )
    }

    #[tokio::test]
    async fn test_search_parses_results() {
        let (base, _) = spawn_stub(0).await;
        let client = client_for(&base, 1);

        let results = client.search("  dosa ").await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].id, FoodId::Numeric(1));
        assert_eq!(results[0].image.as_deref(), Some("https://img/1.jpg"));
        assert_eq!(results[1].id, FoodId::Text("x2".to_string()));
        assert!(results[1].image.is_none());
    }

    #[tokio::test]
    async fn test_search_without_results_key_is_empty() {
        let (base, _) = spawn_stub(0).await;
        let client = client_for(&base, 1);

        assert!(client.search("zzz").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_search_failures() {
        let (base, _) = spawn_stub(0).await;
        let client = client_for(&base, 1);

        let err = client.search("down").await.unwrap_err();
        assert!(matches!(err, TrackerError::SearchFailed(ref m) if m.contains("502")));

        let err = client.search("broken").await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::SearchFailed);
        assert!(matches!(err, TrackerError::MalformedResponse { endpoint: Endpoint::Search, .. }));

        // Whitespace-only queries are sent through; the server rejects them
        let err = client.search("   ").await.unwrap_err();
        assert!(matches!(err, TrackerError::SearchFailed(_)));
    }

    #[tokio::test]
    async fn test_resolve() {
        let (base, _) = spawn_stub(0).await;
        let client = client_for(&base, 1);

        let profile = client.resolve(&FoodId::Numeric(1)).await.unwrap();
        assert_eq!(profile, NutritionProfile::new(168.0, 4.0, 33.0, 3.0));

        let partial = client.resolve(&FoodId::Numeric(2)).await.unwrap();
        assert_eq!(partial.calories(), 90.0);
        assert_eq!(partial.protein(), 0.0);
    }

    #[tokio::test]
    async fn test_resolve_failures() {
        let (base, _) = spawn_stub(0).await;
        let client = client_for(&base, 1);

        for id in [3, 4, 5] {
            let err = client.resolve(&FoodId::Numeric(id)).await.unwrap_err();
            assert!(
                matches!(err, TrackerError::MalformedResponse { endpoint: Endpoint::Nutrition, .. }),
                "id {} gave {:?}",
                id,
                err
            );
            assert_eq!(err.kind(), FailureKind::ResolutionFailed);
        }

        let err = client.resolve(&FoodId::Numeric(99)).await.unwrap_err();
        assert!(matches!(err, TrackerError::ResolutionFailed { ref food_id, .. } if food_id == "99"));
    }

    #[tokio::test]
    async fn test_unreachable_backend() {
        // Bind then drop to get a port nobody listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let client = client_for(&base, 2);
        assert!(matches!(client.search("dosa").await, Err(TrackerError::SearchFailed(_))));
        assert!(matches!(
            client.resolve(&FoodId::Numeric(1)).await,
            Err(TrackerError::ResolutionFailed { .. })
        ));
        assert!(matches!(
            client.persist(&sample_entry()).await,
            Err(TrackerError::PersistFailed(_))
        ));
    }

    /// Backend whose every endpoint answers slower than the client waits
    async fn spawn_slow_stub(delay: Duration) -> (String, Arc<StubState>) {
        let state = Arc::new(StubState::default());

        let slow = move || async move {
            tokio::time::sleep(delay).await;
            (StatusCode::OK, r#"{"searchResults": []}"#.to_string())
        };
        let slow_log = move |State(state): State<Arc<StubState>>| async move {
            state.log_calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            StatusCode::OK
        };

        let app = Router::new()
            .route("/api/search", get(slow))
            .route("/api/nutrition", get(slow))
            .route("/api/log-food", post(slow_log))
            .with_state(Arc::clone(&state));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), state)
    }

    #[tokio::test]
    async fn test_timeouts_map_to_endpoint_failures() {
        let (base, state) = spawn_slow_stub(Duration::from_secs(2)).await;
        let client = HttpClient::new(ClientConfig {
            base_url: base,
            request_timeout_ms: 100,
            max_retries: 2,
            retry_backoff_ms: 1,
        })
        .unwrap();

        let err = client.search("dosa").await.unwrap_err();
        assert_eq!(err, TrackerError::SearchFailed("request timed out".to_string()));

        let err = client.resolve(&FoodId::Numeric(1)).await.unwrap_err();
        assert!(
            matches!(err, TrackerError::ResolutionFailed { ref reason, .. } if reason == "request timed out"),
            "{:?}",
            err
        );

        let err = client.persist(&sample_entry()).await.unwrap_err();
        assert_eq!(err, TrackerError::PersistFailed("request timed out".to_string()));
        assert_eq!(state.log_calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_backoff_is_quadratic_and_saturates() {
        let client = client_for("http://127.0.0.1:1", 3);
        assert_eq!(client.backoff(1), Duration::from_millis(1));
        assert_eq!(client.backoff(3), Duration::from_millis(9));

        let client = HttpClient::new(ClientConfig {
            retry_backoff_ms: u64::MAX / 2,
            ..ClientConfig::default()
        })
        .unwrap();
        assert_eq!(client.backoff(2), Duration::from_millis(u64::MAX));
    }

    #[tokio::test]
    async fn test_persist_retries_server_errors() {
        let (base, state) = spawn_stub(2).await;

        let client = client_for(&base, 3);
        client.persist(&sample_entry()).await.unwrap();
        assert_eq!(state.log_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_persist_gives_up_after_max_retries() {
        let (base, state) = spawn_stub(10).await;

        let client = client_for(&base, 2);
        let err = client.persist(&sample_entry()).await.unwrap_err();
        assert!(matches!(err, TrackerError::PersistFailed(ref m) if m.contains("503")));
        assert_eq!(state.log_calls.load(Ordering::SeqCst), 2);
    }
}
