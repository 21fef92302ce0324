use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// A single entry parsed out of a feed, before any filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub link: String,
    pub title: String,
    pub summary: String,
}

impl FeedEntry {
    pub fn new(link: impl Into<String>, title: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            link: link.into(),
            title: title.into(),
            summary: summary.into(),
        }
    }
}

/// An entry that passed keyword matching and deduplication, ready for delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub link: String,
    pub title: String,
}

impl From<&FeedEntry> for NewsItem {
    fn from(entry: &FeedEntry) -> Self {
        Self {
            link: entry.link.clone(),
            title: entry.title.clone(),
        }
    }
}

/// A validated feed URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSource {
    url: Url,
}

impl FeedSource {
    pub fn parse(raw: &str) -> Result<Self> {
        let url = Url::parse(raw.trim())?;
        match url.scheme() {
            "http" | "https" => Ok(Self { url }),
            other => Err(AggregatorError::Config(format!(
                "unsupported scheme '{}' for feed source {}",
                other, raw
            ))),
        }
    }

    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl std::fmt::Display for FeedSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.url.as_str())
    }
}

/// Lowercased substrings matched against entry titles and summaries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeywordSet {
    keywords: Vec<String>,
}

impl KeywordSet {
    pub fn new<I, S>(keywords: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if keyword.is_empty() {
                return Err(AggregatorError::InvalidKeyword(
                    "keywords must not be blank".to_string(),
                ));
            }
            if !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Ok(Self { keywords: normalized })
    }

    /// True when any keyword occurs in the lowercased title or summary.
    pub fn matches(&self, title: &str, summary: &str) -> bool {
        if self.keywords.is_empty() {
            return false;
        }
        let title = title.to_lowercase();
        let summary = summary.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| title.contains(keyword.as_str()) || summary.contains(keyword.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keywords.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.keywords.iter().map(String::as_str)
    }
}

/// Which links get written to the seen store at the end of a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeenPolicy {
    /// Only items that survive the global cap are marked.
    #[default]
    Emitted,
    /// Every match is marked, including ones trimmed by the global cap.
    AllMatches,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub user_agent: String,
    pub timeout_seconds: u64,
    pub max_retries: u32,
    pub retry_delay_seconds: u64,
    pub max_feed_size_mb: usize,
    pub max_redirects: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            user_agent: "News-Aggregator/0.1".to_string(),
            timeout_seconds: 15,
            max_retries: 2,
            retry_delay_seconds: 1,
            max_feed_size_mb: 10,
            max_redirects: 5,
        }
    }
}

impl FetchConfig {
    /// Worst case for one source: every attempt hitting the client timeout,
    /// plus the longest randomized backoff between attempts.
    pub fn fetch_budget(&self) -> Duration {
        let attempts = u64::from(self.max_retries) + 1;
        let base_ms = self.retry_delay_seconds * 1000;
        let backoff_ms: u64 = (0..self.max_retries)
            .map(|retry| (base_ms << retry.min(5)) * 3 / 2)
            .sum();
        Duration::from_secs(self.timeout_seconds * attempts) + Duration::from_millis(backoff_ms)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AggregatorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed parse error: {0}")]
    Parse(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Invalid keyword: {0}")]
    InvalidKeyword(String),

    #[error("Timed out after {seconds}s fetching {url}")]
    Timeout { url: String, seconds: u64 },

    #[error("Feed size exceeds limit: {size_mb}MB")]
    FeedTooLarge { size_mb: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("General error: {0}")]
    General(String),
}

pub type Result<T> = std::result::Result<T, AggregatorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_set_lowercases_and_dedups() {
        let keywords = KeywordSet::new(["Bitcoin", " bitcoin ", "WEB3"]).unwrap();
        assert_eq!(keywords.iter().collect::<Vec<_>>(), vec!["bitcoin", "web3"]);
    }

    #[test]
    fn blank_keyword_is_rejected() {
        let err = KeywordSet::new(["crypto", "  "]).unwrap_err();
        assert!(matches!(err, AggregatorError::InvalidKeyword(_)));
    }

    #[test]
    fn matching_is_case_insensitive_substring() {
        let keywords = KeywordSet::new(["bitcoin", "web3"]).unwrap();
        assert!(keywords.matches("Bitcoin surges", ""));
        assert!(keywords.matches("Markets", "...discussing Web3 trends..."));
        assert!(!keywords.matches("Stocks rally", "earnings season"));
    }

    #[test]
    fn empty_keyword_set_matches_nothing() {
        let keywords = KeywordSet::new(Vec::<String>::new()).unwrap();
        assert!(keywords.is_empty());
        assert!(!keywords.matches("anything", "at all"));
    }

    #[test]
    fn fetch_budget_covers_retries_and_backoff() {
        let config = FetchConfig::default();
        // 3 attempts x 15s, then backoff of at most 1.5s and 3s
        assert_eq!(config.fetch_budget(), Duration::from_millis(49_500));

        let single = FetchConfig {
            max_retries: 0,
            ..FetchConfig::default()
        };
        assert_eq!(single.fetch_budget(), Duration::from_secs(15));
    }

    #[test]
    fn feed_source_requires_http_scheme() {
        assert!(FeedSource::parse("https://decrypt.co/feed").is_ok());
        assert!(matches!(
            FeedSource::parse("ftp://example.com/feed"),
            Err(AggregatorError::Config(_))
        ));
        assert!(matches!(
            FeedSource::parse("not a url"),
            Err(AggregatorError::InvalidUrl(_))
        ));
    }
}
