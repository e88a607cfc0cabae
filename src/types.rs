//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{DiscoveryError, Result};

/// Which query tier produced a result.
///
/// Tier 1 queries are scoped to a single high-value domain; Tier 2 queries
/// sweep the remaining category domains in site-filtered batches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Scoped query against one high-value domain.
    Tier1,
    /// Batched site-filtered query.
    #[default]
    Tier2,
}

/// A single discovered source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Result title, whitespace-normalised.
    pub title: String,
    /// Target URL (redirect wrappers already unwrapped).
    pub url: String,
    /// Snippet text, whitespace-normalised.
    pub description: String,
    /// Host portion of `url`, lowercased, without a leading `www.`.
    pub domain: String,
    /// Publication date when the provider exposes one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<String>,
    /// 0.0 until the scoring step assigns a value in [0, 1].
    #[serde(default)]
    pub relevance_score: f64,
    /// Tier of the producing query.
    #[serde(default)]
    pub tier: Tier,
    /// True when the producing query carried an explicit `site:` restriction.
    #[serde(default)]
    pub scoped_query: bool,
}

impl SearchResult {
    /// Builds an unscored result, deriving `domain` from the URL.
    pub fn new(
        title: impl Into<String>,
        url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let url = url.into();
        let domain = domain_of(&url);
        Self {
            title: clean_text(&title.into()),
            url,
            description: clean_text(&description.into()),
            domain,
            published: None,
            relevance_score: 0.0,
            tier: Tier::default(),
            scoped_query: false,
        }
    }
}

/// The technique under research.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subject {
    /// Normalised technique id, e.g. `T1003.006`.
    pub id: String,
    /// Full technique name, e.g. `OS Credential Dumping: DCSync`.
    pub name: String,
}

impl Subject {
    /// Builds a subject, validating and normalising the technique id.
    pub fn new(id: &str, name: &str) -> Result<Self> {
        let id = normalize_id(id)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(DiscoveryError::Config(
                "subject name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            id,
            name: name.to_string(),
        })
    }

    /// Portion of the name after the last colon, trimmed; the whole trimmed
    /// name when no colon is present.
    pub fn short_name(&self) -> &str {
        match self.name.rfind(':') {
            Some(idx) => self.name[idx + 1..].trim(),
            None => self.name.trim(),
        }
    }
}

/// A reference link attached to the subject. Reference domains feed Tier 2
/// and count as an authority signal during scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    /// Display name of the reference.
    pub name: String,
    /// Reference URL.
    pub url: String,
}

impl Reference {
    /// Host of the reference URL, empty when the URL does not parse.
    pub fn domain(&self) -> String {
        domain_of(&self.url)
    }
}

/// Technique id shape: `T` + four digits, optionally `.` + three digits.
pub fn is_valid_id(id: &str) -> bool {
    let bytes = id.as_bytes();
    match bytes.len() {
        5 => bytes[0].eq_ignore_ascii_case(&b'T') && bytes[1..5].iter().all(|b| b.is_ascii_digit()),
        9 => {
            bytes[0].eq_ignore_ascii_case(&b'T')
                && bytes[1..5].iter().all(|b| b.is_ascii_digit())
                && bytes[5] == b'.'
                && bytes[6..9].iter().all(|b| b.is_ascii_digit())
        }
        _ => false,
    }
}

/// Trims and uppercases a technique id, rejecting malformed ones.
pub fn normalize_id(id: &str) -> Result<String> {
    let trimmed = id.trim();
    if !is_valid_id(trimmed) {
        return Err(DiscoveryError::Config(format!(
            "invalid technique id: {id:?}"
        )));
    }
    Ok(trimmed.to_ascii_uppercase())
}

/// Lowercased host of a URL, without a leading `www.`; empty when the URL
/// does not parse.
pub fn domain_of(url: &str) -> String {
    url::Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.to_ascii_lowercase()))
        .map(|h| match h.strip_prefix("www.") {
            Some(rest) => rest.to_string(),
            None => h,
        })
        .unwrap_or_default()
}

/// Collapses whitespace runs to single spaces and trims.
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
