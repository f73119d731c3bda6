//! Error taxonomy for the storage, fetch and cache layers.
//!
//! Inside `CacheManager::load` every I/O failure is downgraded to "empty
//! partition" — absence of data is a normal steady state. Only caller
//! misuse (bad station id, inverted date range) and blocking write
//! failures propagate.

use thiserror::Error;

/// Failures of the persistent record store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be opened or read. Readers treat the
    /// partition as empty and fall through to the network tier.
    #[error("record store unavailable: {0}")]
    Unavailable(#[source] std::io::Error),

    /// A write exceeded the host's storage quota. Surfaced to the
    /// caller of `put`/`save`; the prior value remains intact.
    #[error("record store quota exhausted")]
    Exhausted,

    /// A stored value failed to deserialize.
    #[error("stored partition is corrupt: {0}")]
    Corrupt(#[source] serde_json::Error),
}

impl StoreError {
    pub(crate) fn from_io(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::StorageFull {
            StoreError::Exhausted
        } else {
            StoreError::Unavailable(err)
        }
    }
}

/// Failures of the network tier.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Non-success status other than 404 (404 means "no data for this
    /// partition" and is not an error).
    #[error("unexpected http status {0}")]
    Status(u16),

    /// The partition payload was not a valid record sequence.
    #[error("partition payload malformed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Caller-facing errors of the cache/data layer.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("unknown station id: {0:?}")]
    InvalidStationId(String),

    #[error("invalid date range: {0}")]
    InvalidRange(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}
