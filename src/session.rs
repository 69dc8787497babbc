//! Session
//!
//! Single owner of the daily log. Creates the log at session start, hands the
//! coordinator a handle to it, and is the only place that resets it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::client::{CatalogSearch, HttpClient, LogPersistence, NutritionLookup};
use crate::config::Config;
use crate::config::SessionConfig;
use crate::daily_log::{DailyLog, LogHandle, LogSnapshot};
use crate::model::{FoodRecord, LoggedEntry, NutritionProfile};
use crate::projection::Projection;
use crate::sync::SyncCoordinator;

/// One user session: a log plus the coordinator driving it
pub struct Session {
    log: LogHandle,
    coordinator: Arc<SyncCoordinator>,
    retry_task: Option<JoinHandle<()>>,
}

impl Session {
    /// Session talking to the configured backend over HTTP
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Arc::new(HttpClient::new(config.client.clone())?);
        Ok(Self::with_clients(
            client.clone(),
            client.clone(),
            client,
            config.session.clone(),
        ))
    }

    pub fn with_clients(
        catalog: Arc<dyn CatalogSearch>,
        resolver: Arc<dyn NutritionLookup>,
        persistence: Arc<dyn LogPersistence>,
        config: SessionConfig,
    ) -> Self {
        let log = DailyLog::shared();
        let coordinator = Arc::new(SyncCoordinator::new(
            catalog,
            resolver,
            persistence,
            Arc::clone(&log),
            config,
        ));

        Self {
            log,
            coordinator,
            retry_task: None,
        }
    }

    /// Start the outbox retry task if the config enables it
    pub fn start_background_retry(&mut self) {
        if self.retry_task.is_none() {
            self.retry_task = Arc::clone(&self.coordinator).start_background_retry();
        }
    }

    pub fn coordinator(&self) -> &Arc<SyncCoordinator> {
        &self.coordinator
    }

    pub fn log(&self) -> &LogHandle {
        &self.log
    }

    pub async fn snapshot(&self) -> LogSnapshot {
        self.log.read().await.snapshot()
    }

    /// Chart-ready views of the current log
    pub async fn projection(&self) -> Projection {
        Projection::from_entries(&self.snapshot().await)
    }

    /// Reinitialize the session's log
    pub async fn reset(&self) {
        self.log.write().await.reset();
        tracing::info!("Session log reset");
    }

    /// Reset and seed the log with a sample breakfast (local only)
    pub async fn seed_demo(&self) {
        let mut log = self.log.write().await;
        log.reset();
        for entry in demo_entries() {
            log.append(entry);
        }
        tracing::info!(entries = log.len(), "Seeded demo log");
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.retry_task.take() {
            task.abort();
        }
    }
}

/// Sample meals used for demos
pub fn demo_entries() -> Vec<LoggedEntry> {
    vec![
        LoggedEntry::new(
            FoodRecord::new("demo-dosa", "Dosa"),
            NutritionProfile::new(168.0, 4.0, 33.0, 3.0),
        ),
        LoggedEntry::new(
            FoodRecord::new("demo-idli", "Idli"),
            NutritionProfile::new(58.0, 2.0, 12.0, 1.0),
        ),
        LoggedEntry::new(
            FoodRecord::new("demo-poha", "Poha"),
            NutritionProfile::new(180.0, 3.0, 35.0, 4.0),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{TrackerError, TrackerResult};
    use crate::model::FoodId;
    use crate::projection::MacroTotals;
    use async_trait::async_trait;

    /// Backend that is always down
    struct Offline;

    #[async_trait]
    impl CatalogSearch for Offline {
        async fn search(&self, _query: &str) -> TrackerResult<Vec<FoodRecord>> {
            Err(TrackerError::SearchFailed("backend unavailable".into()))
        }
    }

    #[async_trait]
    impl NutritionLookup for Offline {
        async fn resolve(&self, food_id: &FoodId) -> TrackerResult<NutritionProfile> {
            Err(TrackerError::ResolutionFailed {
                food_id: food_id.to_string(),
                reason: "backend unavailable".into(),
            })
        }
    }

    #[async_trait]
    impl LogPersistence for Offline {
        async fn persist(&self, _entry: &LoggedEntry) -> TrackerResult<()> {
            Err(TrackerError::PersistFailed("backend unavailable".into()))
        }
    }

    fn offline_session() -> Session {
        let backend = Arc::new(Offline);
        Session::with_clients(backend.clone(), backend.clone(), backend, SessionConfig::default())
    }

    #[tokio::test]
    async fn test_demo_seed_projection() {
        let session = offline_session();
        session.seed_demo().await;

        let projection = session.projection().await;
        assert_eq!(
            projection.macro_totals,
            MacroTotals {
                protein: 9.0,
                carbs: 80.0,
                fat: 8.0
            }
        );
        assert_eq!(projection.running_series[1].calories, 226.0);

        // Seeding again starts over rather than doubling up
        session.seed_demo().await;
        assert_eq!(session.snapshot().await.len(), 3);
    }

    #[tokio::test]
    async fn test_offline_session_keeps_working() {
        let session = offline_session();
        let coordinator = session.coordinator();

        assert!(coordinator.search("dosa").await.results.is_empty());

        let commit = coordinator.log_food(demo_entries().remove(0)).await;
        assert_eq!(commit.position, 0);
        assert_eq!(session.snapshot().await.len(), 1);
        assert_eq!(session.projection().await.running_totals.calories, 168.0);
        assert_eq!(coordinator.outbox_len().await, 1);

        session.reset().await;
        assert!(session.snapshot().await.is_empty());
        assert_eq!(session.projection().await.macro_totals, MacroTotals::default());
    }

    #[tokio::test]
    async fn test_from_config_builds_http_session() {
        let session = Session::from_config(&Config::default()).unwrap();
        assert!(session.snapshot().await.is_empty());
        assert!(!session.coordinator().config().auto_commit_on_select);
    }
}
