//! Pipeline configuration.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};

/// Category priority, used as a scoring signal for results whose domain
/// belongs to the category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// +0.15 scoring signal.
    High,
    /// +0.05 scoring signal.
    Medium,
    /// No scoring signal.
    Low,
}

/// One search category: a named group of domains with a priority and an
/// optional category-specific query suffix.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryConfig {
    /// Domains searched for this category.
    pub domains: Vec<String>,
    /// Priority of the category for scoring.
    pub priority: Priority,
    /// Extra query phrasing for this category, e.g. `documentation`.
    #[serde(default)]
    pub search_suffix: Option<String>,
}

/// Discovery pipeline configuration.
///
/// Deserialisable from TOML; all fields have defaults so a partial file is
/// valid. `validate()` runs before the pipeline touches the network.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Search categories, keyed by name. The key order (sorted) drives
    /// first-claim-wins URL assignment across categories.
    pub categories: BTreeMap<String, CategoryConfig>,

    /// High-value domains that get their own scoped Tier-1 queries.
    pub tier1_domains: Vec<String>,

    /// Maximum results kept per category before scoring.
    pub max_per_category: usize,

    /// Results scoring below this are dropped (and counted). In [0, 1].
    pub min_score: f64,

    /// Cache lifetime for executed queries. 0 disables caching.
    pub cache_ttl_seconds: u64,

    /// Minimum spacing between outbound search calls.
    pub request_delay_ms: u64,

    /// Timeout per outbound call.
    pub timeout_seconds: u64,

    /// Organisation preference order for code-hosting fork resolution.
    pub preferred_orgs: Vec<String>,

    /// Titles with a similarity ratio strictly above this collapse as
    /// duplicates. In [0, 1].
    pub title_similarity_threshold: f64,

    /// URL paths treated as generic landing pages and filtered out.
    pub generic_paths: Vec<String>,

    /// Fixed User-Agent override; a rotating browser pool is used when unset.
    pub user_agent: Option<String>,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            categories: BTreeMap::new(),
            tier1_domains: vec![
                "attack.mitre.org".to_string(),
                "redcanary.com".to_string(),
                "thedfirreport.com".to_string(),
                "elastic.co".to_string(),
            ],
            max_per_category: 10,
            min_score: 0.25,
            cache_ttl_seconds: 86_400,
            request_delay_ms: 2_000,
            timeout_seconds: 15,
            preferred_orgs: vec![
                "redcanaryco".to_string(),
                "SigmaHQ".to_string(),
                "mitre-attack".to_string(),
                "elastic".to_string(),
            ],
            title_similarity_threshold: 0.90,
            generic_paths: vec![
                "/en-us".to_string(),
                "/en-us/docs".to_string(),
                "/en-us/previous-versions".to_string(),
                "/docs".to_string(),
                "/blog".to_string(),
                "/resources".to_string(),
                "/html/archives.html".to_string(),
            ],
            user_agent: None,
        }
    }
}

impl DiscoveryConfig {
    /// Validates ranges and category shapes.
    pub fn validate(&self) -> Result<()> {
        if self.max_per_category == 0 {
            return Err(DiscoveryError::Config(
                "max_per_category must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.min_score) {
            return Err(DiscoveryError::Config(format!(
                "min_score must be in [0, 1], got {}",
                self.min_score
            )));
        }
        if !(0.0..=1.0).contains(&self.title_similarity_threshold) {
            return Err(DiscoveryError::Config(format!(
                "title_similarity_threshold must be in [0, 1], got {}",
                self.title_similarity_threshold
            )));
        }
        if self.timeout_seconds == 0 {
            return Err(DiscoveryError::Config(
                "timeout_seconds must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Loads and validates configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            DiscoveryError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = toml::from_str(&raw).map_err(|e| {
            DiscoveryError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Whether a domain belongs to the Tier-1 set.
    pub(crate) fn is_tier1(&self, domain: &str) -> bool {
        self.tier1_domains
            .iter()
            .any(|d| d.eq_ignore_ascii_case(domain))
    }
}
