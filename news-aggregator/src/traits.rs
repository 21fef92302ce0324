use crate::types::{FeedEntry, FeedSource, NewsItem, Result};
use async_trait::async_trait;

/// Fetches a feed source and parses it into entries, in feed order.
#[async_trait]
pub trait FeedProvider: Send + Sync {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>>;
}

/// Ledger of links that have already been delivered.
///
/// Implementations must be monotonic: once `add` succeeds for a link,
/// `contains` returns true for it for the rest of the store's lifetime.
#[async_trait]
pub trait SeenStore: Send + Sync {
    async fn contains(&self, link: &str) -> Result<bool>;

    async fn add(&mut self, link: &str) -> Result<()>;

    async fn len(&self) -> Result<usize>;
}

/// Receives the items produced by one aggregation run.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn deliver(&self, items: &[NewsItem]) -> Result<()>;
}
