//! Sync Coordinator
//!
//! Drives one selection cycle: search → select (resolve) → log (commit).
//!
//! The local log is the source of truth for the session. `log_food` appends
//! locally before it talks to the backend and never rolls that append back;
//! a failed remote write is reported and parked in the outbox.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, Mutex, RwLock};
use tokio::task::JoinHandle;

use super::outbox::Outbox;
use crate::client::{CatalogSearch, LogPersistence, NutritionLookup};
use crate::config::SessionConfig;
use crate::daily_log::{LogHandle, Rollup};
use crate::error::{FailureKind, TrackerError};
use crate::model::{FoodRecord, LoggedEntry};

/// Coordinator phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Searching,
    Resolving,
    Committing,
    /// Transient; reported in `Notification::Failed`, never held
    Failed,
}

/// Events pushed to subscribers (the presentation layer)
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// An operation failed and the coordinator went back to idle
    Failed {
        from: Phase,
        kind: FailureKind,
        message: String,
    },
    /// An entry was appended to the local log
    Committed { position: usize, title: String },
    /// Queued entries reached the backend on retry
    OutboxDelivered { delivered: usize, remaining: usize },
}

/// Result of a search call
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Candidates; empty on failure
    pub results: Vec<FoodRecord>,
    /// Set when the search failed
    pub failure: Option<TrackerError>,
    /// A newer search was issued before this one finished
    pub stale: bool,
}

/// Whether the remote persist of a commit went through
#[derive(Debug, Clone, PartialEq)]
pub enum RemoteStatus {
    Persisted,
    /// Persist failed; entry kept locally and queued for retry
    Queued(TrackerError),
}

/// Result of committing one entry
#[derive(Debug, Clone, PartialEq)]
pub struct CommitOutcome {
    /// 0-based position in the local log
    pub position: usize,
    pub remote: RemoteStatus,
}

/// Result of selecting a food
#[derive(Debug, Clone, PartialEq)]
pub enum SelectOutcome {
    /// Resolved and held as the pending selection
    Selected(LoggedEntry),
    /// Resolved and committed right away (auto-commit policy)
    Committed(LoggedEntry, CommitOutcome),
    /// Lookup failed; the previous selection is untouched
    Failed(TrackerError),
    /// A newer selection superseded this one
    Stale,
}

/// Summary of an outbox retry pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutboxReport {
    pub delivered: usize,
    pub remaining: usize,
}

/// Snapshot of coordinator state for status displays
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub phase: Phase,
    pub logged_entries: usize,
    /// Full-precision totals of everything logged this session
    pub totals: Rollup,
    pub has_selection: bool,
    pub outbox_len: usize,
    pub auto_commit_on_select: bool,
    pub last_failure: Option<String>,
}

#[derive(Debug, Default)]
struct InFlight {
    searching: AtomicUsize,
    resolving: AtomicUsize,
    committing: AtomicUsize,
}

/// Decrements its in-flight counter on drop, so a phase can't stick even
/// when the operation's future is dropped midway.
struct PhaseGuard<'a> {
    counter: &'a AtomicUsize,
}

impl Drop for PhaseGuard<'_> {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[derive(Debug, Default)]
struct CoordinatorState {
    search_results: Vec<FoodRecord>,
    last_failure: Option<TrackerError>,
}

/// Orchestrates search, selection and commit against one daily log
pub struct SyncCoordinator {
    catalog: Arc<dyn CatalogSearch>,
    resolver: Arc<dyn NutritionLookup>,
    persistence: Arc<dyn LogPersistence>,
    log: LogHandle,
    config: SessionConfig,
    search_token: AtomicU64,
    select_token: AtomicU64,
    commit_sequence: AtomicU64,
    in_flight: InFlight,
    state: RwLock<CoordinatorState>,
    outbox: Mutex<Outbox>,
    /// Held for a whole retry pass so passes never overlap
    retry_pass: Mutex<()>,
    notifications: broadcast::Sender<Notification>,
}

impl SyncCoordinator {
    pub fn new(
        catalog: Arc<dyn CatalogSearch>,
        resolver: Arc<dyn NutritionLookup>,
        persistence: Arc<dyn LogPersistence>,
        log: LogHandle,
        config: SessionConfig,
    ) -> Self {
        let (notifications, _) = broadcast::channel(config.notification_capacity.max(1));

        Self {
            catalog,
            resolver,
            persistence,
            log,
            config,
            search_token: AtomicU64::new(0),
            select_token: AtomicU64::new(0),
            commit_sequence: AtomicU64::new(0),
            in_flight: InFlight::default(),
            state: RwLock::new(CoordinatorState::default()),
            outbox: Mutex::new(Outbox::default()),
            retry_pass: Mutex::new(()),
            notifications,
        }
    }

    /// Subscribe to failure and commit notifications
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.notifications.subscribe()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Search the catalog
    ///
    /// Never returns an error: a failed search yields no results plus the
    /// failure, and a `Failed` notification.
    pub async fn search(&self, query: &str) -> SearchOutcome {
        let token = self.search_token.fetch_add(1, Ordering::SeqCst) + 1;
        let query = query.trim();

        let result = {
            let _phase = self.enter(Phase::Searching);
            tracing::debug!(token, query, "Searching catalog");
            self.catalog.search(query).await
        };

        if token != self.search_token.load(Ordering::SeqCst) {
            tracing::debug!(token, "Discarding stale search response");
            return SearchOutcome {
                stale: true,
                ..Default::default()
            };
        }

        match result {
            Ok(results) => {
                tracing::info!(query, results = results.len(), "Search completed");
                self.state.write().await.search_results = results.clone();
                SearchOutcome {
                    results,
                    failure: None,
                    stale: false,
                }
            }
            Err(e) => {
                self.state.write().await.search_results.clear();
                self.fail(Phase::Searching, &e).await;
                SearchOutcome {
                    results: Vec::new(),
                    failure: Some(e),
                    stale: false,
                }
            }
        }
    }

    /// Resolve a food's nutrition and make it the current selection
    ///
    /// With `auto_commit_on_select` the resolved entry is committed at once.
    pub async fn select(&self, record: FoodRecord) -> SelectOutcome {
        let token = self.select_token.fetch_add(1, Ordering::SeqCst) + 1;

        let result = {
            let _phase = self.enter(Phase::Resolving);
            tracing::debug!(token, food_id = %record.id, "Resolving nutrition");
            self.resolver.resolve(&record.id).await
        };

        if token != self.select_token.load(Ordering::SeqCst) {
            tracing::debug!(token, food_id = %record.id, "Discarding stale selection");
            return SelectOutcome::Stale;
        }

        let profile = match result {
            Ok(profile) => profile,
            Err(e) => {
                self.fail(Phase::Resolving, &e).await;
                return SelectOutcome::Failed(e);
            }
        };

        let entry = LoggedEntry::new(record, profile);
        self.log.write().await.set_pending(entry.clone());
        tracing::info!(food_id = %entry.id(), title = entry.title(), "Food selected");

        if self.config.auto_commit_on_select {
            let commit = self.log_food(entry.clone()).await;
            SelectOutcome::Committed(entry, commit)
        } else {
            SelectOutcome::Selected(entry)
        }
    }

    /// Commit an entry: append locally, then persist remotely
    ///
    /// Appends are serialized by the log's write lock in the order this step
    /// is reached, independent of when the remote call completes.
    pub async fn log_food(&self, entry: LoggedEntry) -> CommitOutcome {
        let _phase = self.enter(Phase::Committing);

        let (position, sequence) = {
            let mut log = self.log.write().await;
            let position = log.append(entry.clone());
            let sequence = self.commit_sequence.fetch_add(1, Ordering::SeqCst);
            (position, sequence)
        };

        tracing::info!(position, food_id = %entry.id(), title = entry.title(), "Logged food");
        self.notify(Notification::Committed {
            position,
            title: entry.title().to_string(),
        });

        let remote = match self.persistence.persist(&entry).await {
            Ok(()) => RemoteStatus::Persisted,
            Err(e) => {
                self.outbox.lock().await.push(sequence, entry);
                self.fail(Phase::Committing, &e).await;
                RemoteStatus::Queued(e)
            }
        };

        CommitOutcome { position, remote }
    }

    /// Commit the pending selection again; `None` when nothing is selected
    pub async fn log_selected(&self) -> Option<CommitOutcome> {
        let pending = self.log.read().await.pending().cloned();
        match pending {
            Some(entry) => Some(self.log_food(entry).await),
            None => None,
        }
    }

    /// Replay queued persists oldest-first, stopping at the first failure
    ///
    /// The outbox lock is only held to pick or drop an entry, never across a
    /// persist, so commits that fail meanwhile can still queue.
    pub async fn retry_outbox(&self) -> OutboxReport {
        let _pass = self.retry_pass.lock().await;
        let mut delivered = 0;

        loop {
            let next = self
                .outbox
                .lock()
                .await
                .front()
                .map(|(sequence, entry)| (sequence, entry.clone()));
            let Some((sequence, entry)) = next else {
                break;
            };

            match self.persistence.persist(&entry).await {
                Ok(()) => {
                    self.outbox.lock().await.remove(sequence);
                    delivered += 1;
                }
                Err(e) => {
                    tracing::warn!(sequence, error = %e, "Outbox retry failed");
                    break;
                }
            }
        }

        let report = OutboxReport {
            delivered,
            remaining: self.outbox_len().await,
        };

        if delivered > 0 {
            tracing::info!(delivered, remaining = report.remaining, "Outbox entries delivered");
            self.notify(Notification::OutboxDelivered {
                delivered,
                remaining: report.remaining,
            });
        }

        report
    }

    /// Spawn a task retrying the outbox on the configured interval
    ///
    /// Returns `None` when the interval is 0.
    pub fn start_background_retry(self: Arc<Self>) -> Option<JoinHandle<()>> {
        if self.config.outbox_retry_interval_secs == 0 {
            tracing::info!("Outbox background retry disabled");
            return None;
        }

        tracing::info!(
            interval_secs = self.config.outbox_retry_interval_secs,
            "Starting outbox background retry"
        );

        Some(tokio::spawn(async move {
            let interval = std::time::Duration::from_secs(self.config.outbox_retry_interval_secs);
            let mut ticker = tokio::time::interval(interval);

            // Skip the first immediate tick
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if self.outbox_len().await > 0 {
                    self.retry_outbox().await;
                }
            }
        }))
    }

    /// Current phase, derived from the operations in flight
    pub fn current_phase(&self) -> Phase {
        if self.in_flight.committing.load(Ordering::SeqCst) > 0 {
            Phase::Committing
        } else if self.in_flight.resolving.load(Ordering::SeqCst) > 0 {
            Phase::Resolving
        } else if self.in_flight.searching.load(Ordering::SeqCst) > 0 {
            Phase::Searching
        } else {
            Phase::Idle
        }
    }

    /// Results of the latest completed search
    pub async fn search_results(&self) -> Vec<FoodRecord> {
        self.state.read().await.search_results.clone()
    }

    /// The resolved, not yet committed selection
    pub async fn selected(&self) -> Option<LoggedEntry> {
        self.log.read().await.pending().cloned()
    }

    pub async fn last_failure(&self) -> Option<TrackerError> {
        self.state.read().await.last_failure.clone()
    }

    pub async fn outbox_len(&self) -> usize {
        self.outbox.lock().await.len()
    }

    pub async fn status(&self) -> CoordinatorStatus {
        let (logged_entries, totals, has_selection) = {
            let log = self.log.read().await;
            (log.len(), log.rollup(), log.pending().is_some())
        };

        CoordinatorStatus {
            phase: self.current_phase(),
            logged_entries,
            totals,
            has_selection,
            outbox_len: self.outbox_len().await,
            auto_commit_on_select: self.config.auto_commit_on_select,
            last_failure: self.last_failure().await.map(|e| e.to_string()),
        }
    }

    fn enter(&self, phase: Phase) -> PhaseGuard<'_> {
        let counter = match phase {
            Phase::Searching => &self.in_flight.searching,
            Phase::Resolving => &self.in_flight.resolving,
            _ => &self.in_flight.committing,
        };
        counter.fetch_add(1, Ordering::SeqCst);
        PhaseGuard { counter }
    }

    async fn fail(&self, from: Phase, error: &TrackerError) {
        tracing::warn!(phase = ?from, error = %error, "Operation failed");
        self.state.write().await.last_failure = Some(error.clone());
        self.notify(Notification::Failed {
            from,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    fn notify(&self, notification: Notification) {
        // No subscribers is fine
        let _ = self.notifications.send(notification);
    }
}
