//! Application State
//!
//! Shared state accessible by all API handlers.
//! Wrapped in Arc for thread-safe sharing across async tasks.

use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

use crate::api::dto::StoredEntry;
use crate::config::ServerConfig;
use crate::provider::SpoonacularClient;

/// Shared application state for all handlers
#[derive(Clone)]
pub struct AppState {
    /// Upstream provider; `None` when no API key is configured
    pub provider: Option<Arc<SpoonacularClient>>,
    /// Entries received via `POST /api/log-food`, in arrival order
    pub food_log: Arc<RwLock<Vec<StoredEntry>>>,
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Server start time for uptime tracking
    pub start_time: Instant,
}

impl AppState {
    pub fn new(provider: Option<SpoonacularClient>, config: ServerConfig) -> Self {
        Self {
            provider: provider.map(Arc::new),
            food_log: Arc::new(RwLock::new(Vec::new())),
            config: Arc::new(config),
            start_time: Instant::now(),
        }
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }

    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }
}
