//! Cross-category duplicate removal.
//!
//! Three passes over the full per-category result map, in order:
//!
//! 1. code-hosting fork resolution — identical repository-relative file
//!    paths across orgs keep the copy from the most preferred org,
//! 2. academic paper-id resolution — arXiv abstract and PDF URLs for the
//!    same paper keep the higher-scored copy,
//! 3. fuzzy title similarity — near-identical titles keep the higher-scored
//!    copy.
//!
//! The passes are deterministic and idempotent: running the whole routine on
//! its own output removes nothing further.

use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::debug;
use url::Url;

use crate::config::DiscoveryConfig;
use crate::types::{clean_text, SearchResult};

type CategoryMap = BTreeMap<String, Vec<SearchResult>>;

/// Runs the three passes and prunes the map. Returns the pruned map and the
/// number of results removed.
pub fn deduplicate(categories: CategoryMap, config: &DiscoveryConfig) -> (CategoryMap, usize) {
    let mut removed: HashSet<String> = HashSet::new();
    resolve_forks(&categories, &config.preferred_orgs, &mut removed);
    resolve_papers(&categories, &mut removed);
    collapse_similar_titles(&categories, config.title_similarity_threshold, &mut removed);

    let removed_count = removed.len();
    let pruned = categories
        .into_iter()
        .map(|(name, results)| {
            let kept: Vec<SearchResult> = results
                .into_iter()
                .filter(|result| !removed.contains(&result.url))
                .collect();
            (name, kept)
        })
        .collect();
    if removed_count > 0 {
        debug!("dedup removed {removed_count} duplicate results");
    }
    (pruned, removed_count)
}

fn all_results(categories: &CategoryMap) -> impl Iterator<Item = &SearchResult> {
    categories.values().flatten()
}

/// Pass 1: results pointing at the same repository-relative file path are
/// forks of one another. The copy whose org appears earliest in
/// `preferred_orgs` wins; unlisted orgs rank last, ties keep the first seen.
fn resolve_forks(
    categories: &CategoryMap,
    preferred_orgs: &[String],
    removed: &mut HashSet<String>,
) {
    // file path -> (url of the current keeper, its org rank)
    let mut keepers: HashMap<String, (String, usize)> = HashMap::new();
    for result in all_results(categories) {
        if removed.contains(&result.url) {
            continue;
        }
        let Some((org, path_key)) = repo_file_key(&result.url) else {
            continue;
        };
        let rank = org_rank(&org, preferred_orgs);
        match keepers.get_mut(&path_key) {
            None => {
                keepers.insert(path_key, (result.url.clone(), rank));
            }
            Some((kept_url, kept_rank)) => {
                if rank < *kept_rank {
                    removed.insert(std::mem::replace(kept_url, result.url.clone()));
                    *kept_rank = rank;
                } else {
                    removed.insert(result.url.clone());
                }
            }
        }
    }
}

fn org_rank(org: &str, preferred_orgs: &[String]) -> usize {
    preferred_orgs
        .iter()
        .position(|preferred| preferred.eq_ignore_ascii_case(org))
        .unwrap_or(preferred_orgs.len())
}

/// Org and repository-relative file path for code-hosting URLs:
/// `github.com/<org>/<repo>/{blob|tree}/<branch>/<path...>` and
/// `raw.githubusercontent.com/<org>/<repo>/<branch>/<path...>`.
/// Query strings and fragments are ignored.
fn repo_file_key(url: &str) -> Option<(String, String)> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    let (org, rest): (&str, &[&str]) = match host.as_str() {
        "github.com" | "www.github.com" => {
            if segments.len() < 5 || (segments[2] != "blob" && segments[2] != "tree") {
                return None;
            }
            (segments[0], &segments[4..])
        }
        "raw.githubusercontent.com" => {
            if segments.len() < 4 {
                return None;
            }
            (segments[0], &segments[3..])
        }
        _ => return None,
    };
    Some((org.to_string(), rest.join("/").to_lowercase()))
}

/// Pass 2: arXiv abstract and PDF links to the same paper are duplicates.
/// The higher-scored copy wins; ties keep the first seen.
fn resolve_papers(categories: &CategoryMap, removed: &mut HashSet<String>) {
    // paper id -> (url of the current keeper, its score)
    let mut keepers: HashMap<String, (String, f64)> = HashMap::new();
    for result in all_results(categories) {
        if removed.contains(&result.url) {
            continue;
        }
        let Some(paper_id) = arxiv_id(&result.url) else {
            continue;
        };
        match keepers.get_mut(&paper_id) {
            None => {
                keepers.insert(paper_id, (result.url.clone(), result.relevance_score));
            }
            Some((kept_url, kept_score)) => {
                if result.relevance_score > *kept_score {
                    removed.insert(std::mem::replace(kept_url, result.url.clone()));
                    *kept_score = result.relevance_score;
                } else {
                    removed.insert(result.url.clone());
                }
            }
        }
    }
}

fn arxiv_id(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    if host != "arxiv.org" && !host.ends_with(".arxiv.org") {
        return None;
    }
    let segments: Vec<&str> = parsed.path_segments()?.filter(|s| !s.is_empty()).collect();
    if segments.len() < 2 || (segments[0] != "abs" && segments[0] != "pdf") {
        return None;
    }
    let id = segments[1..].join("/");
    Some(id.trim_end_matches(".pdf").to_string())
}

/// Pass 3: near-identical titles collapse. Titles are normalised to
/// lowercase alphanumerics and whitespace; anything under ten characters is
/// never compared. The higher-scored copy wins; ties keep the earlier one.
fn collapse_similar_titles(
    categories: &CategoryMap,
    threshold: f64,
    removed: &mut HashSet<String>,
) {
    // normalised title, score, and url of each accepted result so far
    let mut accepted: Vec<(String, f64, String)> = Vec::new();
    for result in all_results(categories) {
        if removed.contains(&result.url) {
            continue;
        }
        let normalized = normalize_title(&result.title);
        if normalized.chars().count() < 10 {
            accepted.push((normalized, result.relevance_score, result.url.clone()));
            continue;
        }
        let duplicate_of = accepted.iter().position(|(title, _, _)| {
            title.chars().count() >= 10 && similarity_ratio(title, &normalized) > threshold
        });
        match duplicate_of {
            None => accepted.push((normalized, result.relevance_score, result.url.clone())),
            Some(index) => {
                if result.relevance_score > accepted[index].1 {
                    removed.insert(std::mem::replace(
                        &mut accepted[index].2,
                        result.url.clone(),
                    ));
                    accepted[index].0 = normalized;
                    accepted[index].1 = result.relevance_score;
                } else {
                    removed.insert(result.url.clone());
                }
            }
        }
    }
}

fn normalize_title(title: &str) -> String {
    let filtered: String = title
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();
    clean_text(&filtered)
}

/// difflib-style ratio: twice the longest common subsequence length over the
/// summed lengths. 1.0 for identical strings, 0.0 for disjoint ones.
pub(crate) fn similarity_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let mut previous = vec![0usize; b.len() + 1];
    let mut current = vec![0usize; b.len() + 1];
    for &char_a in &a {
        for (j, &char_b) in b.iter().enumerate() {
            current[j + 1] = if char_a == char_b {
                previous[j] + 1
            } else {
                previous[j + 1].max(current[j])
            };
        }
        std::mem::swap(&mut previous, &mut current);
        current[0] = 0;
    }
    2.0 * previous[b.len()] as f64 / (a.len() + b.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(title: &str, url: &str, score: f64) -> SearchResult {
        let mut result = SearchResult::new(title, url, "");
        result.relevance_score = score;
        result
    }

    fn one_category(results: Vec<SearchResult>) -> CategoryMap {
        BTreeMap::from([("sources".to_string(), results)])
    }

    #[test]
    fn fork_resolution_prefers_listed_org() {
        let categories = one_category(vec![
            result(
                "T1003.yaml",
                "https://github.com/orgA/atomic-red-team/blob/master/atomics/T1003/T1003.yaml",
                0.9,
            ),
            result(
                "T1003.yaml",
                "https://github.com/redcanaryco/atomic-red-team/blob/master/atomics/T1003/T1003.yaml",
                0.3,
            ),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 1);
        let kept = &pruned["sources"];
        assert_eq!(kept.len(), 1);
        assert!(kept[0].url.contains("redcanaryco"));
    }

    #[test]
    fn fork_resolution_matches_raw_urls_too() {
        let categories = one_category(vec![
            result(
                "T1003.yaml",
                "https://raw.githubusercontent.com/someone/atomic-red-team/master/atomics/T1003/T1003.yaml",
                0.5,
            ),
            result(
                "T1003.yaml",
                "https://github.com/redcanaryco/atomic-red-team/blob/master/atomics/T1003/T1003.yaml?plain=1",
                0.5,
            ),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 1);
        assert!(pruned["sources"][0].url.contains("redcanaryco"));
    }

    #[test]
    fn different_file_paths_are_not_forks() {
        let categories = one_category(vec![
            result(
                "a",
                "https://github.com/redcanaryco/atomic-red-team/blob/master/atomics/T1003/T1003.yaml",
                0.5,
            ),
            result(
                "b",
                "https://github.com/redcanaryco/atomic-red-team/blob/master/atomics/T1110/T1110.yaml",
                0.5,
            ),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 0);
        assert_eq!(pruned["sources"].len(), 2);
    }

    #[test]
    fn paper_resolution_keeps_higher_score() {
        let categories = one_category(vec![
            result("Paper (abs)", "https://arxiv.org/abs/2301.04999", 0.4),
            result("Paper (pdf)", "https://arxiv.org/pdf/2301.04999.pdf", 0.7),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 1);
        assert_eq!(pruned["sources"][0].url, "https://arxiv.org/pdf/2301.04999.pdf");
    }

    #[test]
    fn paper_resolution_tie_keeps_first_seen() {
        let categories = one_category(vec![
            result("Paper (abs)", "https://arxiv.org/abs/2301.04999", 0.5),
            result("Paper (pdf)", "https://arxiv.org/pdf/2301.04999", 0.5),
        ]);
        let (pruned, _) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(pruned["sources"][0].url, "https://arxiv.org/abs/2301.04999");
    }

    #[test]
    fn similar_titles_collapse_keeping_higher_score() {
        let categories = BTreeMap::from([
            (
                "blogs".to_string(),
                vec![result(
                    "DCSync Attack Deep Dive",
                    "https://a.example.com/dcsync-deep-dive",
                    0.6,
                )],
            ),
            (
                "research".to_string(),
                vec![result(
                    "DCSync Attack Deep-Dive",
                    "https://b.example.com/dcsync",
                    0.8,
                )],
            ),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 1);
        assert!(pruned["blogs"].is_empty());
        assert_eq!(pruned["research"].len(), 1);
    }

    #[test]
    fn short_titles_are_never_compared() {
        let categories = one_category(vec![
            result("T1003", "https://a.example.com/one", 0.5),
            result("T1003", "https://b.example.com/two", 0.5),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 0);
        assert_eq!(pruned["sources"].len(), 2);
    }

    #[test]
    fn distinct_titles_survive() {
        let categories = one_category(vec![
            result(
                "Detecting Kerberoasting with honeypot accounts",
                "https://a.example.com/one",
                0.5,
            ),
            result(
                "DCSync replication abuse walkthrough",
                "https://b.example.com/two",
                0.5,
            ),
        ]);
        let (pruned, removed) = deduplicate(categories, &DiscoveryConfig::default());
        assert_eq!(removed, 0);
        assert_eq!(pruned["sources"].len(), 2);
    }

    #[test]
    fn deduplication_is_idempotent() {
        let categories = one_category(vec![
            result(
                "T1003.yaml",
                "https://github.com/orgA/repo/blob/main/atomics/T1003/T1003.yaml",
                0.9,
            ),
            result(
                "T1003.yaml",
                "https://github.com/redcanaryco/repo/blob/main/atomics/T1003/T1003.yaml",
                0.3,
            ),
            result("Paper (abs)", "https://arxiv.org/abs/2301.04999", 0.4),
            result("Paper (pdf)", "https://arxiv.org/pdf/2301.04999.pdf", 0.7),
            result(
                "DCSync Attack Deep Dive",
                "https://a.example.com/one",
                0.6,
            ),
            result(
                "DCSync Attack Deep-Dive",
                "https://b.example.com/two",
                0.8,
            ),
        ]);
        let config = DiscoveryConfig::default();
        let (first, removed_first) = deduplicate(categories, &config);
        assert_eq!(removed_first, 3);
        let (second, removed_second) = deduplicate(first.clone(), &config);
        assert_eq!(removed_second, 0);
        let urls = |map: &CategoryMap| -> Vec<String> {
            map.values()
                .flatten()
                .map(|result| result.url.clone())
                .collect()
        };
        assert_eq!(urls(&first), urls(&second));
    }

    #[test]
    fn similarity_ratio_bounds() {
        assert_eq!(similarity_ratio("abc", "abc"), 1.0);
        assert_eq!(similarity_ratio("abc", "xyz"), 0.0);
        let ratio = similarity_ratio("dcsync attack deep dive", "dcsync attack deepdive");
        assert!(ratio > 0.90, "got {ratio}");
    }
}
