//! Cached, rate-limited query execution.

use std::time::Duration;

use tokio::time::timeout;
use tracing::{debug, warn};
use url::Url;

use crate::cache::{cache_key, QueryCache};
use crate::config::DiscoveryConfig;
use crate::limiter::RateLimiter;
use crate::provider::SearchProvider;
use crate::types::SearchResult;

/// Runs queries through the cache, the rate limiter, and the
/// primary/fallback provider chain. A failing call degrades to an empty
/// result list; an executor call never errors.
pub struct SearchExecutor<P, F, C> {
    primary: P,
    fallback: F,
    cache: C,
    limiter: RateLimiter,
    config: DiscoveryConfig,
}

impl<P, F, C> SearchExecutor<P, F, C>
where
    P: SearchProvider,
    F: SearchProvider,
    C: QueryCache,
{
    /// Builds an executor; the rate limiter takes its spacing from the
    /// config.
    pub fn new(primary: P, fallback: F, cache: C, config: DiscoveryConfig) -> Self {
        let limiter = RateLimiter::new(Duration::from_millis(config.request_delay_ms));
        Self {
            primary,
            fallback,
            cache,
            limiter,
            config,
        }
    }

    pub(crate) fn config(&self) -> &DiscoveryConfig {
        &self.config
    }

    /// Executes one query, bounded to `max_results`.
    ///
    /// A fresh cache entry short-circuits before the rate limiter. On a
    /// miss, the primary provider runs under the configured timeout; on its
    /// error or timeout the fallback runs; if that fails too, the query
    /// yields no results. Non-empty result sets are cached. Caching is
    /// disabled entirely when `cache_ttl_seconds` is 0.
    pub async fn execute(&self, query: &str, max_results: usize) -> Vec<SearchResult> {
        let use_cache = self.config.cache_ttl_seconds > 0;
        let key = cache_key(query);
        if use_cache {
            if let Some(cached) = self.cache.get(&key).await {
                debug!("cache hit for '{query}'");
                return bounded(cached, max_results);
            }
        }

        self.limiter.wait().await;
        debug!("executing '{query}'");
        let results = match self.run_provider(&self.primary, query, max_results).await {
            Some(results) => results,
            None => match self.run_provider(&self.fallback, query, max_results).await {
                Some(results) => results,
                None => {
                    warn!("all providers failed for '{query}', continuing with no results");
                    return Vec::new();
                }
            },
        };

        if use_cache && !results.is_empty() {
            // Cached before truncation so a later call with a larger bound
            // is served fully from cache.
            self.cache.put(&key, &results).await;
        }
        bounded(results, max_results)
    }

    async fn run_provider<S: SearchProvider>(
        &self,
        provider: &S,
        query: &str,
        max_results: usize,
    ) -> Option<Vec<SearchResult>> {
        let limit = Duration::from_secs(self.config.timeout_seconds);
        match timeout(limit, provider.search(query, max_results, &self.config)).await {
            Ok(Ok(results)) => Some(retain_valid(results)),
            Ok(Err(e)) => {
                warn!("{} failed for '{query}': {e}", provider.name());
                None
            }
            Err(_) => {
                warn!(
                    "{} timed out after {}s for '{query}'",
                    provider.name(),
                    self.config.timeout_seconds
                );
                None
            }
        }
    }
}

/// Drops results whose URL does not parse as http(s) with a host.
fn retain_valid(results: Vec<SearchResult>) -> Vec<SearchResult> {
    results
        .into_iter()
        .filter(|result| is_valid_url(&result.url))
        .collect()
}

pub(crate) fn is_valid_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            matches!(parsed.scheme(), "http" | "https")
                && parsed.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

fn bounded(mut results: Vec<SearchResult>, max_results: usize) -> Vec<SearchResult> {
    results.truncate(max_results);
    results
}
