//! # recon-search
//!
//! Tiered web-source discovery for security technique research.
//!
//! Given a technique (`T1003.006`, "OS Credential Dumping: DCSync"), its
//! reference links, and a category configuration, this crate builds scoped
//! search queries, executes them through a cached and rate-limited executor,
//! scores candidates for relevance, and removes cross-source duplicates.
//!
//! ## Design
//!
//! - Tier 1: one scoped query per high-value domain (`site:` restricted)
//! - Tier 2: shared queries swept over the remaining domains in batches
//! - Pluggable providers (DuckDuckGo HTML primary, Lite fallback) and
//!   caches (in-memory TTL, JSON files on disk)
//! - Additive relevance scoring capped at 1.0, with a bonus for results
//!   from site-restricted queries
//! - Three-pass dedup: repository forks, arXiv paper ids, fuzzy titles
//! - Graceful degradation: failed queries yield empty lists, never abort
//!
//! ## Example
//!
//! ```no_run
//! use recon_search::{discover, DiscoveryConfig, Reference, Subject};
//!
//! # async fn run() -> recon_search::Result<()> {
//! let subject = Subject::new("T1003.006", "OS Credential Dumping: DCSync")?;
//! let references = vec![Reference {
//!     name: "ATT&CK".to_string(),
//!     url: "https://attack.mitre.org/techniques/T1003/006/".to_string(),
//! }];
//! let config = DiscoveryConfig::default();
//! let report = discover(&subject, &references, &config).await?;
//! for (category, results) in &report.categories {
//!     println!("{category}: {} sources", results.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cache;
pub mod config;
pub mod dedup;
pub mod error;
pub mod executor;
mod http;
pub mod limiter;
pub mod pipeline;
pub mod provider;
pub mod providers;
pub mod query;
pub mod scoring;
pub mod types;

pub use config::{CategoryConfig, DiscoveryConfig, Priority};
pub use error::{DiscoveryError, Result};
pub use pipeline::{DiscoveryReport, Pipeline};
pub use provider::SearchProvider;
pub use types::{Reference, SearchResult, Subject, Tier};

use std::time::Duration;

/// Runs discovery with the bundled DuckDuckGo providers and a fresh
/// in-memory cache.
///
/// Validates `config` before any network work. For custom providers or a
/// persistent cache, build a [`Pipeline`] directly.
pub async fn discover(
    subject: &Subject,
    references: &[Reference],
    config: &DiscoveryConfig,
) -> Result<DiscoveryReport> {
    let cache = cache::MemoryCache::new(Duration::from_secs(config.cache_ttl_seconds.max(1)));
    let pipeline = Pipeline::new(
        providers::DuckDuckGo,
        providers::DuckDuckGoLite,
        cache,
        config.clone(),
    )?;
    Ok(pipeline.run(subject, references, "").await)
}
