pub mod types;
pub mod traits;
pub mod config;
pub mod fetcher;
pub mod parser;
pub mod sources;
pub mod state;
pub mod aggregator;
pub mod digest;

pub use types::*;
pub use traits::{FeedProvider, Notifier, SeenStore};
pub use config::{AggregationPlan, AggregatorConfig};
pub use fetcher::Fetcher;
pub use parser::FeedParser;
pub use sources::{RssFeedProvider, StaticFeedProvider};
pub use state::{MemorySeenStore, SqliteSeenStore};
pub use aggregator::{aggregate, NewsAggregator};
pub use digest::{Digest, LogNotifier, StdoutNotifier};
