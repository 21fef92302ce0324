use crate::types::{AggregatorError, FeedEntry, Result};
use feed_rs::parser;
use tracing::debug;

pub struct FeedParser;

impl FeedParser {
    /// Parses RSS or Atom content into entries, keeping feed order.
    ///
    /// Entries without a link or a title are dropped; the rest of the feed is
    /// still returned.
    pub fn parse_feed(content: &str) -> Result<Vec<FeedEntry>> {
        debug!("Parsing feed content ({} bytes)", content.len());

        let feed = parser::parse(content.as_bytes())
            .map_err(|e| AggregatorError::Parse(format!("Failed to parse feed: {}", e)))?;

        let total = feed.entries.len();
        let entries: Vec<FeedEntry> = feed.entries.into_iter().filter_map(Self::parse_entry).collect();

        if entries.len() < total {
            debug!("Dropped {} malformed entries", total - entries.len());
        }

        Ok(entries)
    }

    fn parse_entry(entry: feed_rs::model::Entry) -> Option<FeedEntry> {
        let link = match entry.links.first() {
            Some(link) if !link.href.trim().is_empty() => link.href.trim().to_string(),
            _ => {
                debug!("Skipping entry {} without a link", entry.id);
                return None;
            }
        };

        let title = match entry.title {
            Some(title) if !title.content.trim().is_empty() => title.content,
            _ => {
                debug!("Skipping entry without a title: {}", link);
                return None;
            }
        };

        // Feeds that only ship the article body still get matched on it.
        let summary = entry
            .summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        Some(FeedEntry { link, title, summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Crypto Wire</title>
    <link>https://wire.example.com</link>
    <description>News</description>
    <item>
      <title>Bitcoin Surges</title>
      <link>https://wire.example.com/btc</link>
      <description>Prices jump overnight</description>
    </item>
    <item>
      <title>No link here</title>
      <description>Dropped</description>
    </item>
    <item>
      <title>Quiet day</title>
      <link>https://wire.example.com/quiet</link>
    </item>
  </channel>
</rss>"#;

    const ATOM: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Chain Notes</title>
  <id>urn:chain-notes</id>
  <updated>2024-01-01T00:00:00Z</updated>
  <entry>
    <title>Ethereum upgrade ships</title>
    <id>urn:chain-notes:1</id>
    <link href="https://notes.example.com/eth"/>
    <updated>2024-01-01T00:00:00Z</updated>
    <summary>The upgrade landed on mainnet</summary>
  </entry>
</feed>"#;

    #[test]
    fn parses_rss_items_in_order_and_skips_linkless() {
        let entries = FeedParser::parse_feed(RSS).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].link, "https://wire.example.com/btc");
        assert_eq!(entries[0].title, "Bitcoin Surges");
        assert_eq!(entries[0].summary, "Prices jump overnight");
        assert_eq!(entries[1].title, "Quiet day");
        assert_eq!(entries[1].summary, "");
    }

    #[test]
    fn parses_atom_entries() {
        let entries = FeedParser::parse_feed(ATOM).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].link, "https://notes.example.com/eth");
        assert_eq!(entries[0].summary, "The upgrade landed on mainnet");
    }

    const CONTENT_ONLY: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0" xmlns:content="http://purl.org/rss/1.0/modules/content/">
  <channel>
    <title>Ledger Daily</title>
    <link>https://ledger.example.com</link>
    <description>News</description>
    <item>
      <title>Markets wrap</title>
      <link>https://ledger.example.com/wrap</link>
      <content:encoded><![CDATA[<p>Bitcoin led the rally</p>]]></content:encoded>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn falls_back_to_body_when_summary_is_missing() {
        let entries = FeedParser::parse_feed(CONTENT_ONLY).unwrap();

        assert_eq!(entries.len(), 1);
        assert!(entries[0].summary.contains("Bitcoin led the rally"));
    }

    #[test]
    fn garbage_is_a_parse_error() {
        let result = FeedParser::parse_feed("this is not xml");
        assert!(matches!(result, Err(AggregatorError::Parse(_))));
    }
}
