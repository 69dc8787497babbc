//! Outbox of entries whose remote persist failed
//!
//! Entries are keyed by commit sequence, so replay order is commit order even
//! when overlapping persists fail out of order.

use crate::model::LoggedEntry;
use std::collections::BTreeMap;

#[derive(Debug, Default)]
pub struct Outbox {
    queued: BTreeMap<u64, LoggedEntry>,
}

impl Outbox {
    pub fn push(&mut self, sequence: u64, entry: LoggedEntry) {
        self.queued.insert(sequence, entry);
    }

    /// Oldest queued entry, if any
    pub fn front(&self) -> Option<(u64, &LoggedEntry)> {
        self.queued.iter().next().map(|(seq, entry)| (*seq, entry))
    }

    pub fn remove(&mut self, sequence: u64) -> Option<LoggedEntry> {
        self.queued.remove(&sequence)
    }

    pub fn len(&self) -> usize {
        self.queued.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queued.is_empty()
    }
}
