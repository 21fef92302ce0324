use crate::traits::FeedProvider;
use crate::types::{FeedEntry, FeedSource, FetchConfig, Result};
use crate::{FeedParser, Fetcher};
use async_trait::async_trait;
use tracing::debug;

/// Fetches feeds over HTTP and parses them with feed-rs.
pub struct RssFeedProvider {
    fetcher: Fetcher,
}

impl RssFeedProvider {
    pub fn new(fetch_config: FetchConfig) -> Result<Self> {
        Ok(Self {
            fetcher: Fetcher::new(fetch_config)?,
        })
    }
}

#[async_trait]
impl FeedProvider for RssFeedProvider {
    async fn fetch(&self, source: &FeedSource) -> Result<Vec<FeedEntry>> {
        let content = self.fetcher.fetch_feed(source.as_str()).await?;
        let entries = FeedParser::parse_feed(&content)?;
        debug!("Parsed {} entries from {}", entries.len(), source);
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0"?>
<rss version="2.0"><channel><title>t</title><link>https://x.example</link><description>d</description>
<item><title>Airdrop season</title><link>https://x.example/a</link><description>free tokens</description></item>
</channel></rss>"#;

    #[tokio::test]
    async fn fetches_and_parses_over_http() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/rss")
            .with_status(200)
            .with_header("content-type", "application/rss+xml")
            .with_body(FEED)
            .create_async()
            .await;

        let config = FetchConfig {
            retry_delay_seconds: 0,
            ..FetchConfig::default()
        };
        let provider = RssFeedProvider::new(config).unwrap();
        let source = FeedSource::parse(&format!("{}/rss", server.url())).unwrap();

        let entries = provider.fetch(&source).await.unwrap();

        assert_eq!(entries, vec![FeedEntry::new("https://x.example/a", "Airdrop season", "free tokens")]);
    }

    #[tokio::test]
    async fn html_page_is_a_parse_failure() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/page")
            .with_status(200)
            .with_body("<html><body>maintenance</body></html>")
            .create_async()
            .await;

        let provider = RssFeedProvider::new(FetchConfig::default()).unwrap();
        let source = FeedSource::parse(&format!("{}/page", server.url())).unwrap();

        assert!(provider.fetch(&source).await.is_err());
    }
}
