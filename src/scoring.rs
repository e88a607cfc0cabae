//! Additive relevance scoring.

use std::collections::BTreeSet;

use crate::config::{DiscoveryConfig, Priority};
use crate::types::{SearchResult, Subject};

/// Bonus for results produced by a query with an explicit `site:`
/// restriction, applied by the orchestrator on top of the base score.
pub const SCOPED_QUERY_BOOST: f64 = 0.20;

/// Scores one result against the subject. Signals are additive,
/// case-insensitive, and the total is capped at 1.0:
///
/// - subject id in title +0.30, in description +0.15
/// - short name in title +0.25, in description +0.10
/// - subject id in the URL path +0.10
/// - result domain in the reference-domain set +0.10
/// - result domain in a high-priority category +0.15, medium +0.05
pub fn relevance_score(
    result: &SearchResult,
    subject: &Subject,
    reference_domains: &BTreeSet<String>,
    config: &DiscoveryConfig,
) -> f64 {
    let id = subject.id.to_lowercase();
    let short = subject.short_name().to_lowercase();
    let title = result.title.to_lowercase();
    let description = result.description.to_lowercase();
    let url = result.url.to_lowercase();

    let mut score: f64 = 0.0;
    if title.contains(&id) {
        score += 0.30;
    }
    if description.contains(&id) {
        score += 0.15;
    }
    if !short.is_empty() {
        if title.contains(&short) {
            score += 0.25;
        }
        if description.contains(&short) {
            score += 0.10;
        }
    }
    // T1003.006 appears in paths as t1003.006 or t1003/006.
    let slash_form = id.replace('.', "/");
    if url.contains(&id) || url.contains(&slash_form) {
        score += 0.10;
    }
    if reference_domains.contains(&result.domain) {
        score += 0.10;
    }
    match category_priority(&result.domain, config) {
        Some(Priority::High) => score += 0.15,
        Some(Priority::Medium) => score += 0.05,
        _ => {}
    }
    score.min(1.0)
}

/// Priority of the first configured category listing the domain.
fn category_priority(domain: &str, config: &DiscoveryConfig) -> Option<Priority> {
    config
        .categories
        .values()
        .find(|category| {
            category
                .domains
                .iter()
                .any(|d| d.eq_ignore_ascii_case(domain))
        })
        .map(|category| category.priority)
}
