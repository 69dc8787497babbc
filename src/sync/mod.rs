//! Client/Server Synchronization
//!
//! Keeps the session's local log and the backend's log in step.
//!
//! ## Policy
//!
//! 1. A commit appends to the local log first, then persists remotely
//! 2. A failed remote persist is reported, never rolled back locally
//! 3. Failed persists wait in the outbox and are replayed in commit order
//! 4. Stale search/select responses are dropped by request token

mod coordinator;
mod outbox;

pub use coordinator::{
    CommitOutcome, CoordinatorStatus, Notification, OutboxReport, Phase, RemoteStatus,
    SearchOutcome, SelectOutcome, SyncCoordinator,
};
pub use outbox::Outbox;
