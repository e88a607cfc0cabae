//! Pluggable search backends.

use std::future::Future;

use crate::config::DiscoveryConfig;
use crate::error::Result;
use crate::types::SearchResult;

/// A search backend. Implementations run one query and return raw, unscored
/// results in provider order; the executor handles caching, rate limiting,
/// URL validation, and fallback.
pub trait SearchProvider: Send + Sync {
    /// Runs a query, returning up to `max_results` results.
    fn search(
        &self,
        query: &str,
        max_results: usize,
        config: &DiscoveryConfig,
    ) -> impl Future<Output = Result<Vec<SearchResult>>> + Send;

    /// Short name used in logs.
    fn name(&self) -> &'static str;
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CannedProvider;

    impl SearchProvider for CannedProvider {
        async fn search(
            &self,
            query: &str,
            max_results: usize,
            _config: &DiscoveryConfig,
        ) -> Result<Vec<SearchResult>> {
            let results = vec![
                SearchResult::new(
                    format!("Result for {query}"),
                    "https://example.com/one",
                    "first",
                ),
                SearchResult::new(
                    format!("Another for {query}"),
                    "https://example.com/two",
                    "second",
                ),
            ];
            Ok(results.into_iter().take(max_results).collect())
        }

        fn name(&self) -> &'static str {
            "canned"
        }
    }

    #[tokio::test]
    async fn provider_respects_max_results() {
        let provider = CannedProvider;
        let config = DiscoveryConfig::default();
        let results = provider.search("dcsync", 1, &config).await.unwrap();
        assert_eq!(results.len(), 1);
        assert!(results[0].title.contains("dcsync"));
    }
}
