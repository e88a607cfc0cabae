//! The discovery orchestrator.
//!
//! Runs per-category discovery sequentially: scoped Tier-1 queries against
//! high-value domains, batched Tier-2 sweeps over the remaining domains,
//! then URL claiming, landing-page filtering, scoring, thresholding, and a
//! final cross-category dedup. Provider failures degrade to empty result
//! lists; a run never aborts because a query failed.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, info};
use url::Url;

use crate::cache::QueryCache;
use crate::config::{CategoryConfig, DiscoveryConfig};
use crate::dedup;
use crate::error::Result;
use crate::executor::SearchExecutor;
use crate::provider::SearchProvider;
use crate::query;
use crate::scoring;
use crate::types::{Reference, SearchResult, Subject, Tier};

/// Results requested per Tier-1 domain.
const TIER1_RESULTS_PER_DOMAIN: usize = 2;
/// Category queries dispatched per Tier-2 sweep.
const TIER2_QUERY_LIMIT: usize = 3;
/// Tolerance for the minimum-score comparison. Summed signal weights carry
/// float error (0.25 + 0.10 + 0.10 lands just under 0.45), and a result at
/// exactly the minimum must be kept.
const SCORE_EPSILON: f64 = 1e-9;

/// Per-category discovery output plus run diagnostics.
#[derive(Debug, Default)]
pub struct DiscoveryReport {
    /// Scored, deduplicated results keyed by category name.
    pub categories: BTreeMap<String, Vec<SearchResult>>,
    /// Candidates dropped for scoring below the minimum.
    pub below_threshold: usize,
    /// Results removed by cross-category deduplication.
    pub duplicates_removed: usize,
}

/// The discovery pipeline over a provider pair and a cache.
pub struct Pipeline<P, F, C> {
    executor: SearchExecutor<P, F, C>,
}

impl<P, F, C> Pipeline<P, F, C>
where
    P: SearchProvider,
    F: SearchProvider,
    C: QueryCache,
{
    /// Validates the configuration and builds the pipeline.
    pub fn new(primary: P, fallback: F, cache: C, config: DiscoveryConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            executor: SearchExecutor::new(primary, fallback, cache, config),
        })
    }

    /// Runs discovery for one subject across every configured category.
    ///
    /// `extra_terms` are appended to every query; pass an empty string for
    /// none. Categories are processed in sorted name order, which also
    /// decides first-claim-wins URL assignment.
    pub async fn run(
        &self,
        subject: &Subject,
        references: &[Reference],
        extra_terms: &str,
    ) -> DiscoveryReport {
        let config = self.executor.config();
        // Sorted so batch composition (and with it, cache keys) is stable
        // across runs.
        let reference_domains: BTreeSet<String> = references
            .iter()
            .map(Reference::domain)
            .filter(|domain| !domain.is_empty())
            .collect();

        let mut report = DiscoveryReport::default();
        let mut claimed: HashSet<String> = HashSet::new();

        for (name, category) in &config.categories {
            debug!("searching category '{name}' for {}", subject.id);
            let mut results = self
                .search_category(subject, category, &reference_domains, extra_terms)
                .await;

            // Tier 1 first; the sort is stable, so provider order survives
            // within each tier.
            results.sort_by_key(|result| match result.tier {
                Tier::Tier1 => 0,
                Tier::Tier2 => 1,
            });

            let mut seen: HashSet<String> = HashSet::new();
            results.retain(|result| {
                seen.insert(result.url.clone())
                    && !claimed.contains(&result.url)
                    && !is_generic_landing_page(&result.url, config)
            });
            results.truncate(config.max_per_category);
            for result in &results {
                claimed.insert(result.url.clone());
            }

            for result in &mut results {
                let mut score =
                    scoring::relevance_score(result, subject, &reference_domains, config);
                if result.scoped_query {
                    score = (score + scoring::SCOPED_QUERY_BOOST).min(1.0);
                }
                result.relevance_score = score;
            }
            results.sort_by(|a, b| {
                b.relevance_score
                    .partial_cmp(&a.relevance_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
            let before = results.len();
            results.retain(|result| result.relevance_score >= config.min_score - SCORE_EPSILON);
            report.below_threshold += before - results.len();

            report.categories.insert(name.clone(), results);
        }

        let (categories, duplicates_removed) = dedup::deduplicate(report.categories, config);
        report.categories = categories;
        report.duplicates_removed = duplicates_removed;

        info!(
            "discovery for {} complete: {} categories, {} below threshold, {} duplicates removed",
            subject.id,
            report.categories.len(),
            report.below_threshold,
            report.duplicates_removed
        );
        report
    }

    /// Gathers raw results for one category: Tier-1 scoped queries first,
    /// then Tier-2 batched sweeps.
    async fn search_category(
        &self,
        subject: &Subject,
        category: &CategoryConfig,
        reference_domains: &BTreeSet<String>,
        extra_terms: &str,
    ) -> Vec<SearchResult> {
        let config = self.executor.config();
        let (tier1, mut tier2): (Vec<&str>, Vec<&str>) = category
            .domains
            .iter()
            .map(String::as_str)
            .partition(|domain| config.is_tier1(domain));

        // Reference domains join the sweep unless the category already
        // covers them.
        for domain in reference_domains {
            let known = |d: &&str| d.eq_ignore_ascii_case(domain);
            if !tier1.iter().any(known) && !tier2.iter().any(known) {
                tier2.push(domain);
            }
        }

        let mut results = Vec::new();

        for domain in &tier1 {
            let scoped = query::tier1_query(subject, domain, extra_terms);
            let found = self.executor.execute(&scoped, TIER1_RESULTS_PER_DOMAIN).await;
            results.extend(found.into_iter().map(|mut result| {
                result.tier = Tier::Tier1;
                result.scoped_query = true;
                result
            }));
        }

        let queries = query::category_queries(subject, category, extra_terms);
        for category_query in queries.iter().take(TIER2_QUERY_LIMIT) {
            if category_query.contains("site:") {
                // Already scoped; adding a batch filter would conflict.
                let found = self
                    .executor
                    .execute(category_query, config.max_per_category)
                    .await;
                results.extend(found.into_iter().map(|mut result| {
                    result.tier = Tier::Tier2;
                    result.scoped_query = true;
                    result
                }));
                continue;
            }
            if tier2.is_empty() {
                // No domains left to sweep; the query still runs, unscoped.
                let found = self
                    .executor
                    .execute(category_query, config.max_per_category)
                    .await;
                results.extend(found.into_iter().map(|mut result| {
                    result.tier = Tier::Tier2;
                    result.scoped_query = false;
                    result
                }));
                continue;
            }
            for batch in tier2.chunks(query::SITE_BATCH_SIZE) {
                let filtered = query::with_site_filter(category_query, batch);
                let found = self
                    .executor
                    .execute(&filtered, config.max_per_category)
                    .await;
                results.extend(found.into_iter().map(|mut result| {
                    result.tier = Tier::Tier2;
                    result.scoped_query = false;
                    result
                }));
            }
        }

        results
    }
}

/// Landing pages (site roots, boilerplate doc/blog indexes) carry no
/// technique-specific content. A path is generic when it is the site root,
/// matches a configured boilerplate path, or has at most one segment and no
/// query string.
fn is_generic_landing_page(url: &str, config: &DiscoveryConfig) -> bool {
    let Ok(parsed) = Url::parse(url) else {
        return false;
    };
    let path = parsed.path().trim_end_matches('/').to_lowercase();
    if path.is_empty() {
        return true;
    }
    if config
        .generic_paths
        .iter()
        .any(|generic| generic.trim_end_matches('/').to_lowercase() == path)
    {
        return true;
    }
    let segments = path.split('/').filter(|s| !s.is_empty()).count();
    segments <= 1 && parsed.query().is_none()
}
