use crate::traits::Notifier;
use crate::types::{AggregatorError, NewsItem, Result};
use async_trait::async_trait;
use std::io::Write;
use tracing::info;

/// Chat-style HTML rendering of a batch of news items.
pub struct Digest;

impl Digest {
    /// One line per item, blank lines between, under `header`.
    ///
    /// Returns `None` when there is nothing to send.
    pub fn render(header: &str, items: &[NewsItem]) -> Option<String> {
        if items.is_empty() {
            return None;
        }

        let lines: Vec<String> = items.iter().map(Self::render_item).collect();
        Some(format!("{}\n\n{}", header, lines.join("\n\n")))
    }

    pub fn render_item(item: &NewsItem) -> String {
        format!("📰 <a href='{}'>{}</a>", escape_html(&item.link), escape_html(&item.title))
    }
}

// Attributes are always single-quoted, so double quotes pass through.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Writes rendered digests to stdout.
pub struct StdoutNotifier {
    header: String,
}

impl StdoutNotifier {
    pub fn new(header: impl Into<String>) -> Self {
        Self { header: header.into() }
    }
}

#[async_trait]
impl Notifier for StdoutNotifier {
    async fn deliver(&self, items: &[NewsItem]) -> Result<()> {
        let Some(message) = Digest::render(&self.header, items) else {
            return Ok(());
        };
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{}\n", message).map_err(|e| AggregatorError::Delivery(e.to_string()))
    }
}

/// Emits each delivered item as a tracing event.
#[derive(Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn deliver(&self, items: &[NewsItem]) -> Result<()> {
        for item in items {
            info!(link = %item.link, "{}", item.title);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn item(link: &str, title: &str) -> NewsItem {
        NewsItem {
            link: link.to_string(),
            title: title.to_string(),
        }
    }

    #[test]
    fn empty_batch_renders_nothing() {
        assert_eq!(Digest::render("Header", &[]), None);
    }

    #[test]
    fn renders_header_and_items_in_order() {
        let message = Digest::render(
            "🚀 <b>Latest crypto news</b>",
            &[item("https://a.example/1", "Crypto up"), item("https://a.example/2", "Crypto down")],
        )
        .unwrap();

        assert_eq!(
            message,
            "🚀 <b>Latest crypto news</b>\n\n\
             📰 <a href='https://a.example/1'>Crypto up</a>\n\n\
             📰 <a href='https://a.example/2'>Crypto down</a>"
        );
    }

    #[test]
    fn double_quotes_are_left_alone() {
        let line = Digest::render_item(&item("https://a.example/q", r#"The "flippening" debate"#));
        assert_eq!(line, r#"📰 <a href='https://a.example/q'>The "flippening" debate</a>"#);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn log_notifier_emits_one_event_per_item() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        LogNotifier
            .deliver(&[item("https://a.example/1", "Crypto up"), item("https://a.example/2", "Crypto down")])
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert_eq!(output.lines().count(), 2);
        assert!(output.contains("Crypto up"));
        assert!(output.contains("link=https://a.example/2"));
    }

    #[test]
    fn escapes_markup_in_titles_and_links() {
        let line = Digest::render_item(&item("https://a.example/?q=1&r='x'", "<Bitcoin> & friends"));
        assert_eq!(
            line,
            "📰 <a href='https://a.example/?q=1&amp;r=&#39;x&#39;'>&lt;Bitcoin&gt; &amp; friends</a>"
        );
    }
}
