//! Error types for tweet detail sync.

use crate::types::TweetId;
use thiserror::Error;

/// Error type reported by collaborators (transport, fetcher, persistence).
///
/// Never surfaces through the public API as-is; every boundary converts it
/// into a [`SyncError`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Fetch failed for tweet {id}: {reason}")]
    FetchFailed { id: TweetId, reason: String },

    #[error("Malformed delta: {0}")]
    MalformedDelta(String),

    #[error("Delta for tweet {got} does not belong to tweet {expected}")]
    DeltaMismatch { expected: TweetId, got: TweetId },

    #[error("Stale response for tweet {0}")]
    StaleResponse(TweetId),

    #[error("Membership commit failed: {0}")]
    CommitFailed(String),

    #[error("A membership commit is already in flight")]
    CommitInFlight,

    #[error("Subject has no id")]
    MissingSubjectId,

    #[error("Container index {index} out of range (len {len})")]
    ContainerIndexOutOfRange { index: usize, len: usize },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl From<serde_json::Error> for SyncError {
    fn from(e: serde_json::Error) -> Self {
        SyncError::MalformedDelta(e.to_string())
    }
}

impl From<rmp_serde::decode::Error> for SyncError {
    fn from(e: rmp_serde::decode::Error) -> Self {
        SyncError::MalformedDelta(e.to_string())
    }
}

impl From<toml::de::Error> for SyncError {
    fn from(e: toml::de::Error) -> Self {
        SyncError::InvalidConfig(e.to_string())
    }
}

/// Result type for sync operations.
pub type Result<T> = std::result::Result<T, SyncError>;
