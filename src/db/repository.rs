//! Database repository: item import, feature loading and result persistence

use super::migrations::INIT_SCHEMA;
use super::models::{run_timestamp, ClusterMetricRow, TopKeywordsRow, UserDivisionRow};
use crate::keywords::ClusterKeywordRanking;
use crate::loader::{cluster_index, AssignmentSource, FeatureSource, LoadError};
use crate::metrics::{ClusterMetric, FeatureRecord};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::collections::HashMap;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Migration error: {0}")]
    Migration(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Database connection and operations
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Create a new database connection
    pub async fn new(path: &Path) -> Result<Self, DatabaseError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.ok();
        }

        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Create an in-memory database (for testing)
    pub async fn in_memory() -> Result<Self, DatabaseError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        let db = Self { pool };
        db.run_migrations().await?;

        Ok(db)
    }

    /// Run database migrations
    async fn run_migrations(&self) -> Result<(), DatabaseError> {
        sqlx::query(INIT_SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(|e| DatabaseError::Migration(e.to_string()))?;

        Ok(())
    }

    // ========================================================================
    // Item operations
    // ========================================================================

    /// Insert or replace labeled items
    pub async fn insert_user_division(&self, rows: &[UserDivisionRow]) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT OR REPLACE INTO user_division
                (user_id, user_latent_feature, user_interest, user_interest_index)
                VALUES (?, ?, ?, ?)
                "#,
            )
            .bind(&row.user_id)
            .bind(&row.user_latent_feature)
            .bind(&row.user_interest)
            .bind(row.user_interest_index)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;

        Ok(())
    }

    /// Get every labeled item, ordered by id
    pub async fn user_division(&self) -> Result<Vec<UserDivisionRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, UserDivisionRow>(
            "SELECT user_id, user_latent_feature, user_interest, user_interest_index FROM user_division ORDER BY user_id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    // ========================================================================
    // Result persistence (clear-then-insert, no versioning)
    // ========================================================================

    /// Replace the contents of `cluster_metrics` with `metrics`
    pub async fn replace_cluster_metrics(
        &self,
        metrics: &[ClusterMetric],
    ) -> Result<(), DatabaseError> {
        let computed_at = run_timestamp();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM cluster_metrics")
            .execute(&mut *tx)
            .await?;

        for (position, metric) in metrics.iter().enumerate() {
            let row = ClusterMetricRow::from_metric(position, metric, &computed_at);
            sqlx::query(
                r#"
                INSERT INTO cluster_metrics
                (label, position, intra_dispersion, inter_distance, size, computed_at)
                VALUES (?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&row.label)
            .bind(row.position)
            .bind(row.intra_dispersion)
            .bind(row.inter_distance)
            .bind(row.size)
            .bind(&row.computed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("Stored {} cluster metric rows", metrics.len());
        Ok(())
    }

    /// Get stored cluster metrics in label-list order
    pub async fn cluster_metrics(&self) -> Result<Vec<ClusterMetricRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, ClusterMetricRow>(
            "SELECT * FROM cluster_metrics ORDER BY position ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    /// Replace the contents of `top_keywords` with `rankings`
    pub async fn replace_top_keywords(
        &self,
        rankings: &[ClusterKeywordRanking],
    ) -> Result<(), DatabaseError> {
        let computed_at = run_timestamp();
        let rows = rankings
            .iter()
            .map(|r| TopKeywordsRow::from_ranking(r, &computed_at))
            .collect::<Result<Vec<_>, _>>()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM top_keywords")
            .execute(&mut *tx)
            .await?;

        for row in &rows {
            sqlx::query(
                "INSERT INTO top_keywords (interest_index, keywords, computed_at) VALUES (?, ?, ?)",
            )
            .bind(row.interest_index)
            .bind(&row.keywords)
            .bind(&row.computed_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        tracing::info!("Stored {} keyword ranking rows", rows.len());
        Ok(())
    }

    /// Get stored keyword rankings ordered by cluster index
    pub async fn top_keywords(&self) -> Result<Vec<TopKeywordsRow>, DatabaseError> {
        Ok(sqlx::query_as::<_, TopKeywordsRow>(
            "SELECT * FROM top_keywords ORDER BY interest_index ASC",
        )
        .fetch_all(&self.pool)
        .await?)
    }
}

// ============================================================================
// Loader adapters
// ============================================================================

#[async_trait]
impl FeatureSource for Database {
    async fn load_features(&self) -> Result<Vec<FeatureRecord>, LoadError> {
        let rows = self.user_division().await?;

        let records = rows
            .into_iter()
            .map(|row| {
                let features: Vec<f64> = serde_json::from_str(&row.user_latent_feature)
                    .map_err(|e| LoadError::InvalidFeatureVector {
                        item_id: row.user_id.clone(),
                        reason: e.to_string(),
                    })?;
                Ok(FeatureRecord::new(row.user_id, features, row.user_interest))
            })
            .collect::<Result<Vec<_>, LoadError>>()?;

        tracing::debug!("Loaded {} feature records from user_division", records.len());
        Ok(records)
    }

    fn describe(&self) -> String {
        "sqlite:user_division".to_string()
    }
}

#[async_trait]
impl AssignmentSource for Database {
    async fn load_assignments(&self) -> Result<HashMap<String, usize>, LoadError> {
        let rows = self.user_division().await?;

        let mut assignments = HashMap::with_capacity(rows.len());
        for row in rows {
            // Items never assigned an index are not part of any cluster
            let Some(index) = row.user_interest_index else {
                continue;
            };
            let index = cluster_index(&row.user_id, index)?;
            assignments.insert(row.user_id, index);
        }

        Ok(assignments)
    }

    fn describe(&self) -> String {
        "sqlite:user_division.user_interest_index".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metric(label: &str, size: usize) -> ClusterMetric {
        ClusterMetric {
            label: label.to_string(),
            intra_dispersion: 1.5,
            inter_distance: 2.5,
            size,
        }
    }

    #[tokio::test]
    async fn test_features_round_trip_through_user_division() {
        let db = Database::in_memory().await.unwrap();
        let rows = vec![
            UserDivisionRow::new("u1", &[0.5, 1.0], "music").unwrap().with_interest_index(12),
            UserDivisionRow::new("u2", &[2.0, 0.0], "pets").unwrap(),
        ];
        db.insert_user_division(&rows).await.unwrap();

        let records = db.load_features().await.unwrap();
        assert_eq!(
            records,
            vec![
                FeatureRecord::new("u1", vec![0.5, 1.0], "music"),
                FeatureRecord::new("u2", vec![2.0, 0.0], "pets"),
            ]
        );

        let assignments = db.load_assignments().await.unwrap();
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments["u1"], 12);
    }

    #[tokio::test]
    async fn test_corrupt_feature_column() {
        let db = Database::in_memory().await.unwrap();
        let row = UserDivisionRow {
            user_id: "bad".to_string(),
            user_latent_feature: "not json".to_string(),
            user_interest: "games".to_string(),
            user_interest_index: None,
        };
        db.insert_user_division(&[row]).await.unwrap();

        let err = db.load_features().await.unwrap_err();
        assert!(matches!(err, LoadError::InvalidFeatureVector { item_id, .. } if item_id == "bad"));
    }

    #[tokio::test]
    async fn test_replace_cluster_metrics_clears_previous_run() {
        let db = Database::in_memory().await.unwrap();

        db.replace_cluster_metrics(&[metric("old", 3), metric("stale", 1)])
            .await
            .unwrap();
        db.replace_cluster_metrics(&[metric("b", 2), metric("a", 4)])
            .await
            .unwrap();

        let rows = db.cluster_metrics().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].label, "b");
        assert_eq!(rows[0].size, 2);
        assert_eq!(rows[1].label, "a");
        assert_eq!(rows[1].intra_dispersion, 1.5);
    }

    #[tokio::test]
    async fn test_replace_top_keywords() {
        let db = Database::in_memory().await.unwrap();
        let rankings = vec![
            ClusterKeywordRanking {
                cluster_index: 0,
                top_keywords: vec!["x".to_string(), "y".to_string()],
            },
            ClusterKeywordRanking {
                cluster_index: 1,
                top_keywords: vec![],
            },
        ];

        db.replace_top_keywords(&rankings).await.unwrap();
        db.replace_top_keywords(&rankings).await.unwrap();

        let rows = db.top_keywords().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].keywords().unwrap(), vec!["x", "y"]);
        assert!(rows[1].keywords().unwrap().is_empty());
    }
}
