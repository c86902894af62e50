//! Error types for the sync engine.

use thiserror::Error;

/// Error from the durable operation store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying sled failure.
    #[error("storage error: {0}")]
    Storage(#[from] sled::Error),

    /// A record could not be encoded or decoded.
    #[error("record encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
}

/// Error reaching the network.
///
/// Connectivity failures are recovered locally (cache fallback or queueing)
/// and never surface to callers as hard errors; see the router and queue.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// The network is unreachable (connection refused, DNS failure, timeout).
    #[error("network unreachable")]
    Unreachable(#[source] Option<reqwest::Error>),

    /// The request could not be constructed (bad method, header, or URL).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Transport-level failure after the connection was established.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}
