//! Daily Log
//!
//! Ordered, append-only collection of logged entries for the current session.
//! Insertion order is meal order and display order.
//!
//! Entries live behind an `Arc` so `snapshot()` is cheap. An append while a
//! snapshot is held clones the backing vector first (`Arc::make_mut`), so a
//! snapshot never observes later mutations.

use crate::model::LoggedEntry;
use serde::Serialize;
use std::ops::Deref;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Shared handle to the session's log
pub type LogHandle = Arc<RwLock<DailyLog>>;

/// Full-precision running sums, maintained on every append
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Rollup {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

impl Rollup {
    fn add(&mut self, entry: &LoggedEntry) {
        self.calories += entry.nutrition.calories();
        self.protein += entry.nutrition.protein();
        self.carbs += entry.nutrition.carbs();
        self.fat += entry.nutrition.fat();
    }
}

/// The session's daily food log
#[derive(Debug, Default)]
pub struct DailyLog {
    entries: Arc<Vec<LoggedEntry>>,
    pending: Option<LoggedEntry>,
    rollup: Rollup,
}

impl DailyLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap a fresh log in a shareable handle
    pub fn shared() -> LogHandle {
        Arc::new(RwLock::new(Self::new()))
    }

    /// Append a committed entry, returning its 0-based position
    pub fn append(&mut self, entry: LoggedEntry) -> usize {
        self.rollup.add(&entry);
        let entries = Arc::make_mut(&mut self.entries);
        entries.push(entry);
        entries.len() - 1
    }

    /// Read-only view of the committed entries at call time
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            entries: Arc::clone(&self.entries),
        }
    }

    /// Clear entries, pending selection and rollups
    ///
    /// Only called when a session is reinitialized.
    pub fn reset(&mut self) {
        self.entries = Arc::new(Vec::new());
        self.pending = None;
        self.rollup = Rollup::default();
    }

    /// Hold a resolved entry as the current selection (not committed)
    pub fn set_pending(&mut self, entry: LoggedEntry) {
        self.pending = Some(entry);
    }

    /// The currently selected, not yet committed entry
    pub fn pending(&self) -> Option<&LoggedEntry> {
        self.pending.as_ref()
    }

    /// Totals over all committed entries, at full precision
    pub fn rollup(&self) -> Rollup {
        self.rollup
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Immutable view of the log taken by `DailyLog::snapshot`
#[derive(Debug, Clone, Default)]
pub struct LogSnapshot {
    entries: Arc<Vec<LoggedEntry>>,
}

impl LogSnapshot {
    pub fn entries(&self) -> &[LoggedEntry] {
        &self.entries
    }
}

impl Deref for LogSnapshot {
    type Target = [LoggedEntry];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}

impl From<Vec<LoggedEntry>> for LogSnapshot {
    fn from(entries: Vec<LoggedEntry>) -> Self {
        Self {
            entries: Arc::new(entries),
        }
    }
}
