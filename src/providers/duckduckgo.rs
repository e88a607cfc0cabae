//! DuckDuckGo HTML endpoint (primary backend).

use scraper::Html;
use tracing::debug;

use super::{selector, unwrap_redirect};
use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};
use crate::http::build_client;
use crate::provider::SearchProvider;
use crate::types::SearchResult;

const SEARCH_ENDPOINT: &str = "https://html.duckduckgo.com/html/";

/// Scrapes the JavaScript-free HTML interface via POST form submission.
pub struct DuckDuckGo;

impl SearchProvider for DuckDuckGo {
    async fn search(
        &self,
        query: &str,
        max_results: usize,
        config: &DiscoveryConfig,
    ) -> Result<Vec<SearchResult>> {
        let client = build_client(config)?;
        debug!("duckduckgo: searching for '{query}'");

        let response = client
            .post(SEARCH_ENDPOINT)
            .form(&[("q", query), ("kl", "wt-wt"), ("b", "")])
            .send()
            .await
            .map_err(|e| DiscoveryError::Http(format!("duckduckgo request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DiscoveryError::Http(format!(
                "duckduckgo returned status {}",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| DiscoveryError::Http(format!("failed to read duckduckgo response: {e}")))?;

        parse_results(&body, max_results)
    }

    fn name(&self) -> &'static str {
        "duckduckgo"
    }
}

/// Parses the result list out of a response body. Ad rows are excluded.
pub(crate) fn parse_results(html: &str, max_results: usize) -> Result<Vec<SearchResult>> {
    let document = Html::parse_document(html);
    let result_sel = selector(".result:not(.result--ad)")?;
    let title_sel = selector(".result__a")?;
    let snippet_sel = selector(".result__snippet")?;

    let mut results = Vec::new();
    for element in document.select(&result_sel) {
        if results.len() >= max_results {
            break;
        }
        let Some(anchor) = element.select(&title_sel).next() else {
            continue;
        };
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
        let description = element
            .select(&snippet_sel)
            .next()
            .map(|snippet| snippet.text().collect::<String>())
            .unwrap_or_default();
        results.push(SearchResult::new(title, target, description));
    }

    debug!("duckduckgo: parsed {} results", results.len());
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MOCK_HTML: &str = r#"
        <html><body>
        <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fattack.mitre.org%2Ftechniques%2FT1003%2F006%2F">DCSync, Sub-technique T1003.006</a>
            <a class="result__snippet">Adversaries may attempt to access credentials via DCSync.</a>
        </div>
        <div class="result result--ad">
            <a class="result__a" href="https://ads.example.com/landing">Sponsored result</a>
            <a class="result__snippet">Buy now</a>
        </div>
        <div class="result">
            <a class="result__a" href="//duckduckgo.com/l/?uddg=https%3A%2F%2Fwww.ired.team%2Fcredential-access%2Fdcsync">DCSync - Red Team Notes</a>
            <a class="result__snippet">Dumping domain credentials with DCSync.</a>
        </div>
        </body></html>
    "#;

    #[test]
    fn parses_results_and_skips_ads() {
        let results = parse_results(MOCK_HTML, 10).unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[0].url,
            "https://attack.mitre.org/techniques/T1003/006/"
        );
        assert_eq!(results[0].domain, "attack.mitre.org");
        assert!(results[0].description.contains("DCSync"));
        assert_eq!(results[1].domain, "ired.team");
    }

    #[test]
    fn honours_max_results() {
        let results = parse_results(MOCK_HTML, 1).unwrap();
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn empty_page_parses_to_no_results() {
        let results = parse_results("<html><body></body></html>", 10).unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    #[ignore = "hits the live endpoint"]
    async fn live_search_returns_results() {
        let provider = DuckDuckGo;
        let config = DiscoveryConfig::default();
        let results = provider
            .search("T1003.006 \"DCSync\"", 5, &config)
            .await
            .unwrap();
        assert!(!results.is_empty());
    }
}
