use crate::config::AggregationPlan;
use crate::traits::{FeedProvider, Notifier, SeenStore};
use crate::types::{AggregatorError, FeedEntry, FeedSource, NewsItem, Result, SeenPolicy};
use std::collections::HashSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Owns the seen store and serializes aggregation runs over it.
///
/// A manual request and a scheduled tick are just two callers of
/// [`NewsAggregator::aggregate`]; the store lock is held for the whole run.
pub struct NewsAggregator {
    provider: Arc<dyn FeedProvider>,
    store: Mutex<Box<dyn SeenStore>>,
    plan: AggregationPlan,
}

impl NewsAggregator {
    pub fn new(provider: Arc<dyn FeedProvider>, store: Box<dyn SeenStore>, plan: AggregationPlan) -> Self {
        Self {
            provider,
            store: Mutex::new(store),
            plan,
        }
    }

    pub fn plan(&self) -> &AggregationPlan {
        &self.plan
    }

    pub async fn aggregate(&self) -> Result<Vec<NewsItem>> {
        let run_id = Uuid::new_v4();
        async {
            let mut store = self.store.lock().await;
            aggregate(self.provider.as_ref(), &self.plan, store.as_mut()).await
        }
        .instrument(info_span!("aggregate", %run_id))
        .await
    }

    /// Runs one aggregation and hands any items to `notifier`.
    ///
    /// Returns how many items were delivered; zero means nothing new matched.
    pub async fn aggregate_and_deliver(&self, notifier: &dyn Notifier) -> Result<usize> {
        let items = self.aggregate().await?;
        if items.is_empty() {
            info!("No new matching items");
            return Ok(0);
        }
        notifier.deliver(&items).await?;
        info!("Delivered {} items", items.len());
        Ok(items.len())
    }

    /// Aggregates on every tick of `interval` until `shutdown` resolves.
    ///
    /// `shutdown` is polled for the whole loop, so a signal that lands during a
    /// run stops the loop once that run finishes. Returns the number of runs.
    pub async fn watch<F>(&self, notifier: &dyn Notifier, interval: Duration, shutdown: F) -> usize
    where
        F: Future<Output = ()>,
    {
        let mut ticker = tokio::time::interval(interval);
        tokio::pin!(shutdown);
        let mut runs = 0;

        loop {
            tokio::select! {
                biased;
                _ = &mut shutdown => {
                    warn!("Shutdown requested, stopping");
                    break;
                }
                _ = ticker.tick() => {
                    runs += 1;
                    match self.aggregate_and_deliver(notifier).await {
                        Ok(0) => {}
                        Ok(count) => info!("Sent digest with {} items", count),
                        Err(e) => error!("Aggregation failed: {}", e),
                    }
                }
            }
        }

        runs
    }

    pub async fn seen_count(&self) -> Result<usize> {
        self.store.lock().await.len().await
    }
}

/// One aggregation pass over `plan.sources`.
///
/// Sources are scanned in order; each contributes at most `per_source_cap`
/// new matching items and the combined list is cut to `global_cap`. A source
/// that fails, times out or comes back empty is skipped. Only seen-store
/// errors fail the call.
pub async fn aggregate(
    provider: &dyn FeedProvider,
    plan: &AggregationPlan,
    store: &mut dyn SeenStore,
) -> Result<Vec<NewsItem>> {
    let mut claimed: HashSet<String> = HashSet::new();
    let mut items: Vec<NewsItem> = Vec::new();

    for source in &plan.sources {
        let entries = match fetch_source(provider, source, plan.fetch_budget).await {
            Ok(entries) if entries.is_empty() => {
                warn!("Feed returned no entries, skipping: {}", source);
                continue;
            }
            Ok(entries) => entries,
            Err(e) => {
                warn!("Skipping feed {}: {}", source, e);
                continue;
            }
        };

        let mut taken = 0;
        for entry in &entries {
            if taken >= plan.per_source_cap {
                break;
            }
            if !is_candidate(plan, entry) {
                continue;
            }
            if claimed.contains(&entry.link) || store.contains(&entry.link).await? {
                debug!("Already delivered: {}", entry.link);
                continue;
            }

            claimed.insert(entry.link.clone());
            if plan.seen_policy == SeenPolicy::AllMatches {
                store.add(&entry.link).await?;
            }
            items.push(NewsItem::from(entry));
            taken += 1;
        }

        info!("{}: {} new matching of {} entries", source, taken, entries.len());
    }

    if items.len() > plan.global_cap {
        let dropped = items.split_off(plan.global_cap);
        match plan.seen_policy {
            SeenPolicy::Emitted => debug!("{} matches left for a later run", dropped.len()),
            SeenPolicy::AllMatches => warn!("{} matches marked seen but not emitted", dropped.len()),
        }
    }

    if plan.seen_policy == SeenPolicy::Emitted {
        for item in &items {
            store.add(&item.link).await?;
        }
    }

    Ok(items)
}

async fn fetch_source(provider: &dyn FeedProvider, source: &FeedSource, budget: Duration) -> Result<Vec<FeedEntry>> {
    match tokio::time::timeout(budget, provider.fetch(source)).await {
        Ok(result) => result,
        Err(_) => Err(AggregatorError::Timeout {
            url: source.to_string(),
            seconds: budget.as_secs(),
        }),
    }
}

fn is_candidate(plan: &AggregationPlan, entry: &FeedEntry) -> bool {
    if entry.link.trim().is_empty() || entry.title.trim().is_empty() {
        debug!("Skipping malformed entry (link={:?}, title={:?})", entry.link, entry.title);
        return false;
    }
    plan.keywords.matches(&entry.title, &entry.summary)
}
