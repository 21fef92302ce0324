use crate::types::{AggregatorError, FeedSource, FetchConfig, KeywordSet, Result, SeenPolicy};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub const DEFAULT_SOURCES: &[&str] = &[
    "https://decrypt.co/feed",
    "https://cointelegraph.com/rss",
    "https://www.coindesk.com/arc/outboundfeeds/rss/",
];

pub const DEFAULT_KEYWORDS: &[&str] = &["crypto", "bitcoin", "ethereum", "web3", "blockchain", "airdrop"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregatorConfig {
    pub sources: Vec<String>,
    pub keywords: Vec<String>,
    pub per_source_cap: usize,
    pub global_cap: usize,
    pub seen_policy: SeenPolicy,
    pub fetch: FetchConfig,
    pub digest_header: String,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            sources: DEFAULT_SOURCES.iter().map(|s| s.to_string()).collect(),
            keywords: DEFAULT_KEYWORDS.iter().map(|s| s.to_string()).collect(),
            per_source_cap: 2,
            global_cap: 5,
            seen_policy: SeenPolicy::default(),
            fetch: FetchConfig::default(),
            digest_header: "🚀 <b>Latest crypto news</b>".to_string(),
        }
    }
}

/// Typed form of [`AggregatorConfig`] after validation.
#[derive(Debug, Clone)]
pub struct AggregationPlan {
    pub sources: Vec<FeedSource>,
    pub keywords: KeywordSet,
    pub per_source_cap: usize,
    pub global_cap: usize,
    pub seen_policy: SeenPolicy,
    /// Wall-clock limit for fetching one source, retries included.
    pub fetch_budget: Duration,
}

impl AggregatorConfig {
    /// Loads a JSON config; missing fields fall back to defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        info!(
            "Loaded config from {} ({} sources, {} keywords)",
            path.display(),
            config.sources.len(),
            config.keywords.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<AggregationPlan> {
        if self.per_source_cap == 0 || self.global_cap == 0 {
            return Err(AggregatorError::Config(
                "per_source_cap and global_cap must be at least 1".to_string(),
            ));
        }
        if self.fetch.timeout_seconds == 0 {
            return Err(AggregatorError::Config("fetch.timeout_seconds must be at least 1".to_string()));
        }

        let sources = self
            .sources
            .iter()
            .map(|raw| FeedSource::parse(raw))
            .collect::<Result<Vec<_>>>()?;
        let keywords = KeywordSet::new(&self.keywords)?;

        Ok(AggregationPlan {
            sources,
            keywords,
            per_source_cap: self.per_source_cap,
            global_cap: self.global_cap,
            seen_policy: self.seen_policy,
            fetch_budget: self.fetch.fetch_budget(),
        })
    }
}
