use crate::traits::SeenStore;
use crate::types::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

/// Seen-link ledger that lives for the process lifetime only.
#[derive(Debug, Default)]
pub struct MemorySeenStore {
    links: HashSet<String>,
}

impl MemorySeenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_links<I, S>(links: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            links: links.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl SeenStore for MemorySeenStore {
    async fn contains(&self, link: &str) -> Result<bool> {
        Ok(self.links.contains(link))
    }

    async fn add(&mut self, link: &str) -> Result<()> {
        self.links.insert(link.to_string());
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        Ok(self.links.len())
    }
}

/// Seen-link ledger backed by a SQLite file, so delivered links survive restarts.
pub struct SqliteSeenStore {
    db: SqlitePool,
}

impl SqliteSeenStore {
    pub async fn open(path: &Path) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        info!("Opening seen-item database at {}", path.display());
        Self::connect(options).await
    }

    /// A private database that disappears when the store is dropped.
    pub async fn in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        Self::connect(options).await
    }

    async fn connect(options: SqliteConnectOptions) -> Result<Self> {
        // One long-lived connection: an in-memory database is scoped to its connection.
        let db = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS seen_items (
                link TEXT PRIMARY KEY NOT NULL,
                first_seen TEXT NOT NULL
            )
            "#,
        )
        .execute(&db)
        .await?;

        Ok(Self { db })
    }

    pub async fn close(self) {
        self.db.close().await;
    }
}

#[async_trait]
impl SeenStore for SqliteSeenStore {
    async fn contains(&self, link: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM seen_items WHERE link = ?")
            .bind(link)
            .fetch_optional(&self.db)
            .await?;
        Ok(row.is_some())
    }

    async fn add(&mut self, link: &str) -> Result<()> {
        let result = sqlx::query("INSERT OR IGNORE INTO seen_items (link, first_seen) VALUES (?, ?)")
            .bind(link)
            .bind(Utc::now())
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            debug!("Link already recorded: {}", link);
        }
        Ok(())
    }

    async fn len(&self) -> Result<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM seen_items")
            .fetch_one(&self.db)
            .await?;
        Ok(count as usize)
    }
}
