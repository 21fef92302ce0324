pub mod rss_feed;
pub mod static_feed;

pub use rss_feed::RssFeedProvider;
pub use static_feed::StaticFeedProvider;
