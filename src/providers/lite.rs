//! DuckDuckGo Lite endpoint (fallback backend).
//!
//! The Lite interface is a plain table layout: each result is a link row
//! followed by a snippet row. It survives rate limiting of the
//! HTML endpoint more often, which is exactly when the executor reaches for
//! it.

use scraper::Html;
use tracing::debug;

use super::{selector, unwrap_redirect};
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::http::build_client;
use crate::provider::SearchProvider;
use crate::types::SearchResult;

const SEARCH_ENDPOINT: &str = "https://lite.duckduckgo.com/lite/";

/// Scrapes the Lite table layout.
pub struct DuckDuckGoLite;

impl SearchProvider for DuckDuckGoLite {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        config: &DiscoveryConfig,
    ) -> Result<Vec<SearchResult>> {
        let client = build_client(config)?;
        debug!("duckduckgo-lite: searching for '{query}'");

        let response = client
            .get(SEARCH_ENDPOINT)
            .query(&[("q", query), ("kl", "wt-wt")])
            .send()
            .await
            .map_err(|e| DiscoveryError::Http(format!("duckduckgo-lite request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Http(format!(
                "duckduckgo-lite returned status {}",
                response.status()
            )));
        }

        let body = response.text().await.map_err(|e| {
            DiscoveryError::Http(format!("failed to read duckduckgo-lite response: {e}"))
        })?;

        parse_results(&body, max_results)
    }

    fn name(&self) -> &'static str {
        "duckduckgo-lite"
    }
}

/// Parses Lite's table rows. Links and snippets appear in matching order, so
/// they are paired by index.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let link_sel = selector("a.result-link")?;
    let snippet_sel = selector("td.result-snippet")?;

    let snippets: Vec<String> = document
        .select(&snippet_sel)
        .map(|snippet| snippet.text().collect::<String>())
        .collect();

    let mut results = Vec::new();
    for (index, anchor) in document.select(&link_sel).enumerate() {
        if results.len() >= max_results {
            break;
        }
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let Some(target) = unwrap_redirect(href) else {
            continue;
        };
        let title = anchor.text().collect::<String>();
        if title.trim().is_empty() {
            continue;
        }
        let description = snippets.get(index).cloned().unwrap_or_default();
        results.push(SearchResult::new(title, target, description));
    }

    debug!("duckduckgo-lite: parsed {} results", results.len());
    Ok(results)
}
