use crate::traits::FeedProvider;
use crate::types::{AggregatorError, FeedEntry, FeedSource, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

enum Scripted {
    Entries(Vec<FeedEntry>),
    Failure(String),
}

/// In-memory provider with canned responses per feed URL, for development and testing.
///
/// Unknown URLs fail the same way an unreachable host would.
#[derive(Default)]
pub struct StaticFeedProvider {
    feeds: HashMap<String, Scripted>,
    delays: HashMap<String, Duration>,
    fetched: Mutex<Vec<String>>,
}

impl StaticFeedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_feed(mut self, url: &str, entries: Vec<FeedEntry>) -> Self {
        self.feeds.insert(normalize(url), Scripted::Entries(entries));
        self
    }

    pub fn with_failure(mut self, url: &str, message: &str) -> Self {
        self.feeds.insert(normalize(url), Scripted::Failure(message.to_string()));
        self
    }

    /// Makes every fetch of `url` sleep first, to exercise timeouts.
    pub fn with_delay(mut self, url: &str, delay: Duration) -> Self {
        self.delays.insert(normalize(url), delay);
        self
    }

    /// URLs in the order they were fetched.
    pub fn fetched(&self) -> Vec<String> {
        self.fetched.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

// FeedSource stores a parsed Url, which adds a trailing slash to bare hosts.
fn normalize(url: &str) -> String {
    FeedSource::parse(url)
        .map(|source| source.as_str().to_string())
        .unwrap_or_else(|_| url.to_string())
}

#[async_trait]
impl FeedProvider for StaticFeedProvider {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>> {
        if let Ok(mut calls) = self.fetched.lock() {
            calls.push(source.as_str().to_string());
        }

        if let Some(delay) = self.delays.get(source.as_str()) {
            tokio::time::sleep(*delay).await;
        }

        match self.feeds.get(source.as_str()) {
            Some(Scripted::Entries(entries)) => Ok(entries.clone()),
            Some(Scripted::Failure(message)) => Err(AggregatorError::General(message.clone())),
            None => Err(AggregatorError::General(format!("no feed scripted for {}", source))),
        }
    }
}
