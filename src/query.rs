//! Query construction. Pure string assembly, no I/O.

use crate::config::CategoryConfig;
use crate::types::Subject;

/// Domains joined into one `site:` OR-filter per query. Five is what the
/// endpoints handle reliably; more dilutes results.
pub const SITE_BATCH_SIZE: usize = 5;

/// Builds the category's queries in deterministic order: the
/// category-specific query (when a search suffix is configured) first, then
/// the two shared queries.
pub fn category_queries(
    subject: &Subject,
    category: &CategoryConfig,
    extra_terms: &str,
) -> Vec<String> {
    let short = subject.short_name();
    let mut queries = Vec::new();
    if let Some(suffix) = category.search_suffix.as_deref() {
        queries.push(format!("\"{short}\" {suffix}"));
    }
    queries.push(format!("{} \"{short}\"", subject.id));
    queries.push(format!("\"{short}\" detection"));
    queries
        .into_iter()
        .map(|query| with_extra_terms(query, extra_terms))
        .collect()
}

/// Builds a query scoped to one high-value domain. Short names under four
/// characters are too ambiguous on their own, so the technique id is
/// prepended.
pub fn tier1_query(subject: &Subject, domain: &str, extra_terms: &str) -> String {
    let short = subject.short_name();
    let base = if short.chars().count() < 4 {
        format!("{} \"{short}\" site:{domain}", subject.id)
    } else {
        format!("\"{short}\" site:{domain}")
    };
    with_extra_terms(base, extra_terms)
}

/// Appends an OR-filter over a domain batch to an unscoped query.
pub fn with_site_filter(query: &str, domains: &[&str]) -> String {
    let filter = domains
        .iter()
        .map(|domain| format!("site:{domain}"))
        .collect::<Vec<_>>()
        .join(" OR ");
    format!("{query} ({filter})")
}

fn with_extra_terms(query: String, extra_terms: &str) -> String {
    let extra = extra_terms.trim();
    if extra.is_empty() {
        query
    } else {
        format!("{query} {extra}")
    }
}
