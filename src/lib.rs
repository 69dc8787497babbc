//! # Nutrilog
//!
//! Daily nutrition tracking: search a food catalog, resolve nutrition for a
//! pick, log it optimistically and project the day's log into chart data.
//!
//! ## Modules
//!
//! - [`model`]: Food records, nutrition profiles and logged entries
//! - [`daily_log`]: The session's append-only log of eaten items
//! - [`projection`]: Pure chart-data views over a log snapshot
//! - [`client`]: Backend seams and their HTTP implementation
//! - [`sync`]: Search/select/commit coordination with optimistic update
//! - [`session`]: Owner of one log and its coordinator
//! - [`api`]: The backend REST server, with Axum
//! - [`provider`]: Spoonacular catalog and nutrition source for the server
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use nutrilog::config::Config;
//! use nutrilog::session::Session;
//! use nutrilog::sync::SelectOutcome;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let session = Session::from_config(&Config::load_default())?;
//!     let coordinator = session.coordinator();
//!
//!     let found = coordinator.search("dosa").await;
//!     if let Some(first) = found.results.into_iter().next() {
//!         if let SelectOutcome::Selected(_) = coordinator.select(first).await {
//!             coordinator.log_selected().await;
//!         }
//!     }
//!
//!     let projection = session.projection().await;
//!     println!("{} kcal so far", projection.running_totals.calories);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod client;
pub mod config;
pub mod daily_log;
pub mod error;
pub mod model;
pub mod projection;
pub mod provider;
pub mod session;
pub mod sync;

// Re-export top-level types for convenience
pub use model::{FoodId, FoodRecord, LoggedEntry, NutritionProfile};

pub use daily_log::{DailyLog, LogHandle, LogSnapshot, Rollup};

pub use projection::{MacroTotals, MealPoint, Projection, RunningTotals};

pub use error::{FailureKind, TrackerError, TrackerResult};

pub use sync::{CommitOutcome, Notification, Phase, SelectOutcome, SyncCoordinator};

pub use session::Session;

pub use api::{build_router, serve, ApiError, AppState};
