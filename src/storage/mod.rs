//! Persistence layer.
//!
//! Stores completed analyses per user in SQLite and serves the recent
//! history back. Participants, coefficients and probabilities are kept as
//! JSON text columns. The analyzer never depends on this module; callers
//! treat a failed save as a logged, non-fatal event.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use sqlx::Row;
use std::str::FromStr;
use tracing::{debug, info};

use crate::config::StorageConfig;
use crate::types::{HistoryEntry, ParticipantPair};

/// Destination for completed analyses.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AnalysisStore: Send + Sync {
    /// Persist one analysis and return its record id.
    async fn save_analysis(
        &self,
        user_id: i64,
        participants: &ParticipantPair,
        coefficients: [f64; 2],
        probabilities: [f64; 2],
    ) -> Result<i64>;

    /// Most recent analyses for `user_id`, newest first.
    async fn user_history(&self, user_id: i64, limit: u32) -> Result<Vec<HistoryEntry>>;
}

const CREATE_TABLE: &str = r#"
    CREATE TABLE IF NOT EXISTS analyses (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL,
        teams TEXT NOT NULL,
        coefficients TEXT NOT NULL,
        probabilities TEXT NOT NULL,
        created_at TEXT NOT NULL
    )
"#;

const CREATE_INDEX: &str =
    "CREATE INDEX IF NOT EXISTS idx_analyses_user ON analyses (user_id, created_at)";

// ---------------------------------------------------------------------------
// SQLite store
// ---------------------------------------------------------------------------

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("Invalid database URL: {url}"))?
            .create_if_missing(true);

        let mut pool_options = SqlitePoolOptions::new().max_connections(max_connections);
        if url.contains(":memory:") {
            // an in-memory database dies with its last connection
            pool_options = pool_options.idle_timeout(None).max_lifetime(None);
        }

        let pool = pool_options
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database: {url}"))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(url, "Connected to SQLite database");
        Ok(store)
    }

    pub async fn from_config(config: &StorageConfig) -> Result<Self> {
        Self::connect(&config.database_url, config.max_connections).await
    }

    /// Private in-memory database. A single connection keeps every query
    /// on the same database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect("sqlite::memory:", 1).await
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::query(CREATE_TABLE)
            .execute(&self.pool)
            .await
            .context("Failed to create analyses table")?;
        sqlx::query(CREATE_INDEX)
            .execute(&self.pool)
            .await
            .context("Failed to create analyses index")?;
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl AnalysisStore for SqliteStore {
    async fn save_analysis(
        &self,
        user_id: i64,
        participants: &ParticipantPair,
        coefficients: [f64; 2],
        probabilities: [f64; 2],
    ) -> Result<i64> {
        let teams = serde_json::to_string(participants).context("Failed to serialise participants")?;
        let coefficients = serde_json::to_string(&coefficients)?;
        let probabilities = serde_json::to_string(&probabilities)?;

        let id = sqlx::query(
            r#"
            INSERT INTO analyses (user_id, teams, coefficients, probabilities, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(&teams)
        .bind(&coefficients)
        .bind(&probabilities)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .context("Failed to insert analysis")?
        .last_insert_rowid();

        debug!(id, user_id, "Analysis saved");
        Ok(id)
    }

    async fn user_history(&self, user_id: i64, limit: u32) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            r#"
            SELECT id, user_id, teams, coefficients, probabilities, created_at
            FROM analyses
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to query analysis history")?;

        rows.iter()
            .map(|row| -> Result<HistoryEntry> {
                let id: i64 = row.try_get("id")?;
                let teams: String = row.try_get("teams")?;
                let coefficients: String = row.try_get("coefficients")?;
                let probabilities: String = row.try_get("probabilities")?;
                let created_at: DateTime<Utc> = row.try_get("created_at")?;

                Ok(HistoryEntry {
                    id,
                    user_id: row.try_get("user_id")?,
                    participants: serde_json::from_str(&teams)
                        .with_context(|| format!("Corrupt teams in analysis {id}"))?,
                    coefficients: serde_json::from_str(&coefficients)
                        .with_context(|| format!("Corrupt coefficients in analysis {id}"))?,
                    probabilities: serde_json::from_str(&probabilities)
                        .with_context(|| format!("Corrupt probabilities in analysis {id}"))?,
                    created_at,
                })
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
