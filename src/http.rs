//! Shared HTTP client construction.

use std::time::Duration;

use rand::seq::SliceRandom;
use reqwest::Client;

use crate::config::DiscoveryConfig;
use crate::error::{DiscoveryError, Result};

/// Browser User-Agent pool, rotated per request. Search endpoints throttle
/// obvious non-browser clients aggressively.
const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/130.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:133.0) Gecko/20100101 Firefox/133.0",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/18.1 Safari/605.1.15",
];

/// Picks a random User-Agent from the pool.
pub(crate) fn random_user_agent() -> &'static str {
    USER_AGENTS
        .choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(USER_AGENTS[0])
}

/// Builds a client with the configured timeout and a browser User-Agent.
/// Cookies are kept per client; some endpoints refuse cookie-less repeat
/// requests.
pub(crate) fn build_client(config: &DiscoveryConfig) -> Result<Client> {
    let user_agent = config
        .user_agent
        .clone()
        .unwrap_or_else(|| random_user_agent().to_string());

    Client::builder()
        .user_agent(user_agent)
        .cookie_store(true)
        .timeout(Duration::from_secs(config.timeout_seconds))
        .redirect(reqwest::redirect::Policy::limited(10))
        .build()
        .map_err(|e| DiscoveryError::Http(format!("failed to build HTTP client: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_agent_pool_is_non_empty_and_browser_like() {
        for _ in 0..20 {
            let ua = random_user_agent();
            assert!(ua.starts_with("Mozilla/5.0"));
        }
    }

    #[test]
    fn client_builds_with_defaults() {
        let config = DiscoveryConfig::default();
        assert!(build_client(&config).is_ok());
    }

    #[test]
    fn client_honours_user_agent_override() {
        let config = DiscoveryConfig {
            user_agent: Some("test-agent/1.0".to_string()),
            ..Default::default()
        };
        assert!(build_client(&config).is_ok());
    }
}
