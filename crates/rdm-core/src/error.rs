//! Errors returned by the public engine API.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine was shut down (or its serialized context died).
    #[error("download engine is shut down")]
    Closed,

    /// The request was rejected before any state was created.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The persistent store failed; no state was created.
    #[error("job store: {0:#}")]
    Store(#[source] anyhow::Error),
}
