//! SQLite persistence for collected posts.
//!
//! The table is append-only: rows are inserted by collection runs and only
//! removed all at once by [`PostStore::clear`]. Keywords are compared after
//! lower-casing on both sides.

use chrono::{DateTime, Utc};
use pulse_core::{format_timestamp, keyword_filter, CoreError, NewPost, PostRecord};
use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::FromRow;
use std::str::FromStr;
use tracing::{debug, info};


const MAX_CONNECTIONS: u32 = 5;

#[derive(Debug, Clone, FromRow)]
struct PostRow {
    id: i64,
    platform: String,
    author: String,
    text: String,
    sentiment: String,
    score: f64,
    timestamp: String,
    keyword: String,
}

impl From<PostRow> for PostRecord {
    fn from(row: PostRow) -> Self {
        Self {
            id: row.id,
            platform: row.platform,
            author: row.author,
            text: row.text,
            sentiment: row.sentiment,
            score: row.score,
            timestamp: row.timestamp,
            keyword: row.keyword,
        }
    }
}

/// Per-label record counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentimentCounts {
    pub positive: i64,
    pub negative: i64,
    pub neutral: i64,
}

impl SentimentCounts {
    pub fn total(&self) -> i64 {
        self.positive + self.negative + self.neutral
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordSummary {
    pub count: i64,
    pub last_update: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: i64,
}

/// Owned handle to the post table. Cloning shares the underlying pool.
#[derive(Debug, Clone)]
pub struct PostStore {
    pool: SqlitePool,
}

impl PostStore {
    /// Opens (creating if needed) the database at `url`, e.g. `sqlite://pulse.db`.
    pub async fn connect(url: &str) -> Result<Self, CoreError> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        debug!("Connecting to SQLite database at {}", url);

        let pool = SqlitePoolOptions::new()
            .max_connections(MAX_CONNECTIONS)
            .connect_with(options)
            .await?;

        Ok(Self { pool })
    }

    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn run_migrations(&self) -> Result<(), CoreError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Appends `posts` in a single transaction: either all rows are stored or none.
    pub async fn insert_batch(&self, posts: &[NewPost]) -> Result<usize, CoreError> {
        if posts.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for post in posts {
            sqlx::query(
                r#"
                INSERT INTO posts (platform, author, text, sentiment, score, timestamp, keyword)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&post.platform)
            .bind(&post.author)
            .bind(&post.text)
            .bind(post.sentiment.as_str())
            .bind(post.score)
            .bind(&post.timestamp)
            .bind(&post.keyword)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        debug!("Stored {} posts", posts.len());
        Ok(posts.len())
    }

    /// Records for `keyword` collected strictly after `since`.
    pub async fn count_since(&self, keyword: &str, since: DateTime<Utc>) -> Result<i64, CoreError> {
        let keyword = keyword_filter(Some(keyword)).unwrap_or_default();
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM posts WHERE LOWER(keyword) = ? AND timestamp > ?",
        )
        .bind(keyword)
        .bind(format_timestamp(since))
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// All records matching the filter, in insertion order.
    pub async fn fetch(&self, keyword: Option<&str>) -> Result<Vec<PostRecord>, CoreError> {
        let keyword = keyword_filter(keyword);
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, platform, author, text, sentiment, score, timestamp, keyword
            FROM posts
            WHERE (? IS NULL OR LOWER(keyword) = ?)
            ORDER BY id ASC
            "#,
        )
        .bind(&keyword)
        .bind(&keyword)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    /// Newest records first; ties on timestamp go to the later insert.
    pub async fn recent(
        &self,
        keyword: Option<&str>,
        limit: usize,
    ) -> Result<Vec<PostRecord>, CoreError> {
        let keyword = keyword_filter(keyword);
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, platform, author, text, sentiment, score, timestamp, keyword
            FROM posts
            WHERE (? IS NULL OR LOWER(keyword) = ?)
            ORDER BY timestamp DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(&keyword)
        .bind(&keyword)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(PostRecord::from).collect())
    }

    pub async fn sentiment_counts(&self, keyword: Option<&str>) -> Result<SentimentCounts, CoreError> {
        let keyword = keyword_filter(keyword);
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r#"
            SELECT sentiment, COUNT(*)
            FROM posts
            WHERE (? IS NULL OR LOWER(keyword) = ?)
            GROUP BY sentiment
            "#,
        )
        .bind(&keyword)
        .bind(&keyword)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = SentimentCounts::default();
        for (label, count) in rows {
            match label.as_str() {
                "positive" => counts.positive = count,
                "negative" => counts.negative = count,
                "neutral" => counts.neutral = count,
                _ => {}
            }
        }
        Ok(counts)
    }

    /// Row count and latest timestamp for a single keyword.
    pub async fn keyword_status(&self, keyword: &str) -> Result<KeywordSummary, CoreError> {
        let keyword = keyword_filter(Some(keyword)).unwrap_or_default();
        let (count, last_update): (i64, Option<String>) = sqlx::query_as(
            "SELECT COUNT(*), MAX(timestamp) FROM posts WHERE LOWER(keyword) = ?",
        )
        .bind(keyword)
        .fetch_one(&self.pool)
        .await?;

        Ok(KeywordSummary { count, last_update })
    }

    /// Every stored keyword with its record count, largest first.
    pub async fn keyword_counts(&self) -> Result<Vec<KeywordCount>, CoreError> {
        let counts = sqlx::query_as::<_, KeywordCount>(
            r#"
            SELECT keyword, COUNT(*) AS count
            FROM posts
            GROUP BY keyword
            ORDER BY count DESC, keyword ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(counts)
    }

    /// Deletes every record and returns how many were removed.
    pub async fn clear(&self) -> Result<u64, CoreError> {
        let result = sqlx::query("DELETE FROM posts").execute(&self.pool).await?;
        info!("Cleared {} posts", result.rows_affected());
        Ok(result.rows_affected())
    }
}
