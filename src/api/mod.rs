//! Nutrilog REST API
//!
//! The backend the session client talks to, built with Axum.
//! Search and nutrition are proxied to Spoonacular; logged entries are kept
//! in memory for the lifetime of the process.
//!
//! # Endpoints
//!
//! ## Food
//! - `GET /api/search?query=` - Search the catalog
//! - `GET /api/nutrition?id=` - Nutrition profile for one food
//!
//! ## Log
//! - `POST /api/log-food` - Record a logged entry
//! - `GET /api/daily-log` - Entries recorded so far
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use nutrilog::api::{serve, AppState};
//! use nutrilog::config::ServerConfig;
//! use nutrilog::provider::SpoonacularClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ServerConfig::default();
//!     let provider = SpoonacularClient::from_config(&config)?;
//!
//!     let state = AppState::new(provider, config.clone());
//!     serve(state, &config).await?;
//!
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::ServerConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/search", get(routes::food::search_food))
        .route("/nutrition", get(routes::food::get_nutrition))
        .route("/log-food", post(routes::log::log_food))
        .route("/daily-log", get(routes::log::daily_log));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config.cors_origins);
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(shared_state)
}

/// CORS policy for the browser front end; no origins means any origin
fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE])
}

/// Start the API server
pub async fn serve(state: AppState, config: &ServerConfig) -> Result<(), ApiError> {
    if !state.has_provider() {
        tracing::warn!("SPOONACULAR_API_KEY is not set; search and nutrition will return 503");
    }

    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Nutrilog API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Nutrilog API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, SessionConfig};
    use crate::model::{FoodId, FoodRecord, LoggedEntry, NutritionProfile};
    use crate::provider::SpoonacularClient;
    use crate::session::Session;
    use crate::sync::RemoteStatus;
    use axum::{
        body::Body,
        extract::Path,
        http::{Request, StatusCode},
        Json,
    };
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    fn create_test_app() -> Router {
        build_router(AppState::new(None, ServerConfig::default()))
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn spawn(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    /// Minimal stand-in for the two Spoonacular endpoints we call
    async fn spawn_spoonacular() -> String {
        let router = Router::new()
            .route(
                "/recipes/complexSearch",
                get(|| async {
                    Json(json!({
                        "results": [
                            {"id": 101, "title": "Masala Dosa", "image": "https://img/101.jpg"},
                            {"id": 102, "title": "Rava Dosa"}
                        ],
                        "totalResults": 2
                    }))
                }),
            )
            .route(
                "/recipes/:id/information",
                get(|Path(id): Path<String>| async move {
                    if id == "404" {
                        return (StatusCode::NOT_FOUND, Json(json!({"message": "not found"})));
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "id": id,
                            "nutrition": {"nutrients": [
                                {"name": "Calories", "amount": 168.0, "unit": "kcal"},
                                {"name": "Fat", "amount": 3.0, "unit": "g"},
                                {"name": "Carbohydrates", "amount": 33.0, "unit": "g"},
                                {"name": "Protein", "amount": 4.0, "unit": "g"}
                            ]}
                        })),
                    )
                }),
            );
        spawn(router).await
    }

    async fn create_provider_app() -> Router {
        let config = ServerConfig {
            spoonacular_base_url: spawn_spoonacular().await,
            spoonacular_api_key: Some("test-key".to_string()),
            ..Default::default()
        };
        let provider = SpoonacularClient::from_config(&config).unwrap();
        build_router(AppState::new(provider, config))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoints() {
        for uri in ["/health/live", "/health/ready", "/health"] {
            let response = create_test_app().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_health_reports_missing_provider() {
        let response = create_test_app().oneshot(get_request("/health")).await.unwrap();
        let body = body_json(response).await;
        assert_eq!(body["status"], "degraded");
        assert_eq!(body["provider"], "missing_api_key");
    }

    #[tokio::test]
    async fn test_search_without_provider_is_unavailable() {
        let response = create_test_app()
            .oneshot(get_request("/api/search?query=dosa"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = body_json(response).await;
        assert_eq!(body["error"]["code"], "SERVICE_UNAVAILABLE");
        assert!(body["request_id"].is_string());
    }

    #[tokio::test]
    async fn test_search_requires_query() {
        for uri in ["/api/search", "/api/search?query="] {
            let response = create_test_app().oneshot(get_request(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_whitespace_query_goes_upstream() {
        // Without a provider a forwarded query hits the 503, not validation
        let response = create_test_app()
            .oneshot(get_request("/api/search?query=%20%20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let response = create_provider_app()
            .await
            .oneshot(get_request("/api/search?query=%20%20"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_nutrition_requires_id() {
        let response = create_test_app()
            .oneshot(get_request("/api/nutrition"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_search_through_provider() {
        let app = create_provider_app().await;

        let response = app.oneshot(get_request("/api/search?query=dosa")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        let results = body["searchResults"].as_array().unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["id"], 101);
        assert_eq!(results[0]["title"], "Masala Dosa");
        assert!(results[1].get("image").is_none());
    }

    #[tokio::test]
    async fn test_nutrition_through_provider() {
        let app = create_provider_app().await;

        let response = app
            .clone()
            .oneshot(get_request("/api/nutrition?id=101"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(
            body["nutrition"],
            json!({"calories": 168.0, "protein": 4.0, "carbs": 33.0, "fat": 3.0})
        );

        let response = app.oneshot(get_request("/api/nutrition?id=404")).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_log_food_then_daily_log() {
        let state = AppState::new(None, ServerConfig::default());
        let app = build_router(state.clone());

        let response = app
            .clone()
            .oneshot(post_json(
                "/api/log-food",
                r#"{"id": 101, "title": "Masala Dosa", "nutrition": {"calories": 168, "protein": 4, "carbs": 33, "fat": 3}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Food logged successfully");
        assert_eq!(body["food"]["title"], "Masala Dosa");
        assert!(body["food"]["timestamp"].is_string());

        let response = app.oneshot(get_request("/api/daily-log")).await.unwrap();
        let body = body_json(response).await;
        let entries = body.as_array().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["id"], 101);
        assert_eq!(entries[0]["nutrition"]["calories"], 168.0);

        assert_eq!(state.food_log.read().await.len(), 1);
    }

    #[tokio::test]
    async fn test_log_food_invalid_json() {
        let response = create_test_app()
            .oneshot(post_json("/api/log-food", "not json"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_log_food_rejects_negative_nutrition() {
        let response = create_test_app()
            .oneshot(post_json(
                "/api/log-food",
                r#"{"id": 1, "title": "Bad", "nutrition": {"calories": -5}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_cors_layer_skips_invalid_origins() {
        let _ = cors_layer(&[]);
        let _ = cors_layer(&["http://localhost:3000".to_string(), "bad\norigin".to_string()]);
    }

    #[tokio::test]
    async fn test_session_against_server() {
        let state = AppState::new(None, ServerConfig::default());
        let base_url = spawn(build_router(state.clone())).await;

        let mut config = Config::default();
        config.client.base_url = base_url;
        config.session = SessionConfig {
            outbox_retry_interval_secs: 0,
            ..Default::default()
        };

        let session = Session::from_config(&config).unwrap();
        let entry = LoggedEntry::new(
            FoodRecord::new(7, "Poha"),
            NutritionProfile::new(180.0, 3.0, 35.0, 4.0),
        );

        let commit = session.coordinator().log_food(entry).await;
        assert_eq!(commit.position, 0);
        assert_eq!(commit.remote, RemoteStatus::Persisted);

        let stored = state.food_log.read().await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].entry.food.id, FoodId::Numeric(7));
        assert_eq!(session.snapshot().await.len(), 1);
    }
}
