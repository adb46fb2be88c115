//! Error types for the fae-fetch crate.
//!
//! Cancellation is deliberately absent: a cancelled fetch returns `Ok` with
//! [`FetchStats::cancelled`](crate::types::FetchStats::cancelled) set.

/// Errors that can occur while configuring or running a fetch.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Invalid fetch configuration (thresholds, budget).
    #[error("config error: {0}")]
    Config(String),

    /// The standard (exact) search failed.
    #[error("standard search failed: {0}")]
    Standard(String),

    /// The semantic search or one of its stream items failed.
    #[error("semantic search failed: {0}")]
    Semantic(String),

    /// A collaborator panicked while holding the deduplication registry.
    #[error("deduplication registry poisoned")]
    RegistryPoisoned,

    /// A producer task panicked or was aborted.
    #[error("producer task failed: {0}")]
    Task(String),

    /// Reading a configuration file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for fae-fetch results.
pub type Result<T> = std::result::Result<T, FetchError>;
