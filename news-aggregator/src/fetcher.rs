use crate::types::{AggregatorError, FetchConfig, Result};
use backoff::{backoff::Backoff, exponential::ExponentialBackoff};
use reqwest::{Client, StatusCode};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// HTTP side of feed retrieval: retries, size limits and timeouts.
pub struct Fetcher {
    client: Client,
    config: FetchConfig,
}

enum Attempt {
    Done(String),
    Retry(AggregatorError),
    Fail(AggregatorError),
}

impl Fetcher {
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_seconds))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .build()?;

        Ok(Self { client, config })
    }

    /// Downloads the raw feed body, retrying transient failures.
    pub async fn fetch_feed(&self, url: &str) -> Result<String> {
        let start_time = Instant::now();
        debug!("Fetching feed: {}", url);

        let mut backoff: ExponentialBackoff<backoff::SystemClock> = ExponentialBackoff {
            current_interval: Duration::from_secs(self.config.retry_delay_seconds),
            initial_interval: Duration::from_secs(self.config.retry_delay_seconds),
            max_interval: Duration::from_secs(self.config.retry_delay_seconds * 32),
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        };

        let mut last_error = None;

        for attempt in 0..=self.config.max_retries {
            match self.attempt(url).await {
                Attempt::Done(content) => {
                    info!(
                        "Fetched feed: {} ({} bytes in {}ms)",
                        url,
                        content.len(),
                        start_time.elapsed().as_millis()
                    );
                    return Ok(content);
                }
                Attempt::Fail(e) => return Err(e),
                Attempt::Retry(e) => {
                    if attempt < self.config.max_retries {
                        if let Some(delay) = backoff.next_backoff() {
                            warn!("Attempt {} failed for {}: {}, retrying in {:?}", attempt + 1, url, e, delay);
                            last_error = Some(e);
                            tokio::time::sleep(delay).await;
                            continue;
                        }
                    }
                    last_error = Some(e);
                    break;
                }
            }
        }

        warn!("Giving up on {} after {} attempts", url, self.config.max_retries + 1);
        Err(last_error.unwrap_or_else(|| AggregatorError::General(format!("Failed to fetch {}", url))))
    }

    async fn attempt(&self, url: &str) -> Attempt {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => return Attempt::Retry(AggregatorError::Http(e)),
        };

        let status = response.status();
        if !status.is_success() {
            let error = AggregatorError::General(format!(
                "HTTP {}: {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            ));
            return if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
                Attempt::Retry(error)
            } else {
                Attempt::Fail(error)
            };
        }

        let limit_bytes = self.config.max_feed_size_mb * 1024 * 1024;
        if let Some(content_length) = response.content_length() {
            if content_length as usize > limit_bytes {
                return Attempt::Fail(AggregatorError::FeedTooLarge {
                    size_mb: content_length as usize / (1024 * 1024),
                });
            }
        }

        match response.text().await {
            Ok(content) if content.len() > limit_bytes => Attempt::Fail(AggregatorError::FeedTooLarge {
                size_mb: content.len() / (1024 * 1024),
            }),
            Ok(content) => Attempt::Done(content),
            Err(e) => Attempt::Retry(AggregatorError::Http(e)),
        }
    }
}
