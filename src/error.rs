use thiserror::Error;

/// Errors surfaced by the discovery pipeline.
///
/// Provider and cache failures are absorbed by the executor during a run, so
/// callers mostly see `Config` — raised before any network work starts.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Invalid configuration or subject.
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Failed to parse a provider response.
    #[error("Failed to parse search results: {0}")]
    Parse(String),

    /// Cache backend failure.
    #[error("Cache error: {0}")]
    Cache(String),
}

/// Result type alias for discovery operations.
pub type Result<T> = std::result::Result<T, DiscoveryError>;
