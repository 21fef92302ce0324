use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use news_aggregator::{
    AggregatorConfig, LogNotifier, MemorySeenStore, NewsAggregator, Notifier, RssFeedProvider, SeenStore,
    SqliteSeenStore, StdoutNotifier,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "news-aggregator", about = "Keyword-filtered RSS digests without repeats")]
struct Cli {
    /// JSON config file; built-in crypto defaults are used when absent
    #[arg(long, env = "NEWS_AGGREGATOR_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite file for delivered links; in-memory when absent
    #[arg(long, env = "NEWS_AGGREGATOR_SEEN_DB")]
    seen_db: Option<PathBuf>,

    /// Where digests go
    #[arg(long, value_enum, default_value_t = NotifierKind::Stdout, env = "NEWS_AGGREGATOR_NOTIFIER")]
    notifier: NotifierKind,

    #[command(subcommand)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum NotifierKind {
    /// Rendered HTML digest on stdout
    Stdout,
    /// One log event per item
    Log,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Aggregate once and print the digest
    Once,
    /// Aggregate on an interval until interrupted
    Watch {
        #[arg(long, default_value_t = 3600)]
        interval_secs: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn,sqlx=warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => AggregatorConfig::from_file(path)
            .with_context(|| format!("failed to load config from {}", path.display()))?,
        None => AggregatorConfig::default(),
    };
    let plan = config.validate().context("invalid configuration")?;

    let store: Box<dyn SeenStore> = match &cli.seen_db {
        Some(path) => Box::new(
            SqliteSeenStore::open(path)
                .await
                .with_context(|| format!("failed to open seen database {}", path.display()))?,
        ),
        None => Box::new(MemorySeenStore::new()),
    };

    let provider = Arc::new(RssFeedProvider::new(config.fetch.clone()).context("failed to build HTTP client")?);
    let aggregator = NewsAggregator::new(provider, store, plan);
    let notifier: Box<dyn Notifier> = match cli.notifier {
        NotifierKind::Stdout => Box::new(StdoutNotifier::new(config.digest_header.clone())),
        NotifierKind::Log => Box::new(LogNotifier),
    };

    info!(
        "Watching {} sources for {} keywords",
        aggregator.plan().sources.len(),
        aggregator.plan().keywords.len()
    );

    match cli.command {
        Command::Once => {
            let delivered = aggregator
                .aggregate_and_deliver(notifier.as_ref())
                .await
                .context("aggregation failed")?;
            if delivered == 0 {
                println!("⚠️ No new matching news right now.");
            }
        }
        Command::Watch { interval_secs } => {
            let interval = Duration::from_secs(interval_secs.max(1));
            let shutdown = async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    warn!("Failed to listen for Ctrl-C: {}", e);
                    std::future::pending::<()>().await;
                }
            };
            let runs = aggregator.watch(notifier.as_ref(), interval, shutdown).await;
            info!("Stopped after {} runs", runs);
        }
    }

    info!("Seen store holds {} links", aggregator.seen_count().await?);
    Ok(())
}
