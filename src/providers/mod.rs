//! Bundled search backends.
//!
//! Both scrape DuckDuckGo's JavaScript-free interfaces: the HTML endpoint as
//! the primary backend and the sparser Lite endpoint as the fallback.

mod duckduckgo;
mod lite;

pub use duckduckgo::DuckDuckGo;
pub use lite::DuckDuckGoLite;

use scraper::Selector;
use url::Url;

use crate::error::{DiscoveryError, Result};

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| DiscoveryError::Parse(format!("invalid selector '{css}': {e}")))
}

/// Unwraps DuckDuckGo's redirect wrapper. Result links usually point at
/// `//duckduckgo.com/l/?uddg=<encoded target>`; direct http(s) links pass
/// through unchanged.
pub(crate) fn unwrap_redirect(href: &str) -> Option<String> {
    if href.starts_with("http://") || href.starts_with("https://") {
        if let Ok(parsed) = Url::parse(href) {
            if parsed
                .host_str()
                .is_some_and(|h| h.ends_with("duckduckgo.com"))
                && parsed.path().starts_with("/l/")
            {
                return uddg_target(&parsed);
            }
        }
        return Some(href.to_string());
    }

    let rest = href
        .strip_prefix("//duckduckgo.com/l/")
        .or_else(|| href.strip_prefix("/l/"))?;
    let wrapped = format!("https://duckduckgo.com/l/{rest}");
    uddg_target(&Url::parse(&wrapped).ok()?)
}

fn uddg_target(wrapper: &Url) -> Option<String> {
    wrapper
        .query_pairs()
        .find(|(key, _)| key == "uddg")
        .map(|(_, value)| value.into_owned())
}
