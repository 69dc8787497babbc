//! Error types for the nutrition log core
//!
//! Every variant is recoverable. None of them aborts a session or touches the
//! in-memory log; the coordinator turns them into empty results, a preserved
//! selection, or a notification.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Remote endpoint a failure came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Endpoint {
    Search,
    Nutrition,
    LogFood,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Endpoint::Search => write!(f, "search"),
            Endpoint::Nutrition => write!(f, "nutrition"),
            Endpoint::LogFood => write!(f, "log-food"),
        }
    }
}

/// Failure kinds surfaced to callers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    SearchFailed,
    ResolutionFailed,
    PersistFailed,
}

/// Errors raised by the catalog, resolver and persistence clients
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackerError {
    /// Catalog search could not be completed
    #[error("Search failed: {0}")]
    SearchFailed(String),

    /// Nutrition lookup could not be completed
    #[error("Nutrition lookup failed for {food_id}: {reason}")]
    ResolutionFailed { food_id: String, reason: String },

    /// Remote log write failed; the local log already holds the entry
    #[error("Persisting log entry failed: {0}")]
    PersistFailed(String),

    /// Payload did not have the expected shape
    #[error("Malformed {endpoint} response: {reason}")]
    MalformedResponse { endpoint: Endpoint, reason: String },
}

impl TrackerError {
    /// Failure kind as seen by callers
    ///
    /// A malformed payload counts as the failure of the endpoint that sent it.
    pub fn kind(&self) -> FailureKind {
        match self {
            TrackerError::SearchFailed(_) => FailureKind::SearchFailed,
            TrackerError::ResolutionFailed { .. } => FailureKind::ResolutionFailed,
            TrackerError::PersistFailed(_) => FailureKind::PersistFailed,
            TrackerError::MalformedResponse { endpoint, .. } => match endpoint {
                Endpoint::Search => FailureKind::SearchFailed,
                Endpoint::Nutrition => FailureKind::ResolutionFailed,
                Endpoint::LogFood => FailureKind::PersistFailed,
            },
        }
    }

    pub(crate) fn malformed(endpoint: Endpoint, reason: impl Into<String>) -> Self {
        TrackerError::MalformedResponse {
            endpoint,
            reason: reason.into(),
        }
    }
}

/// Result type alias for client operations
pub type TrackerResult<T> = Result<T, TrackerError>;
