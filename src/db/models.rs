//! Database models

use crate::keywords::ClusterKeywordRanking;
use crate::metrics::ClusterMetric;
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Row of `user_division`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserDivisionRow {
    pub user_id: String,
    /// JSON array of floats
    pub user_latent_feature: String,
    pub user_interest: String,
    pub user_interest_index: Option<i64>,
}

impl UserDivisionRow {
    pub fn new(
        user_id: impl Into<String>,
        features: &[f64],
        user_interest: impl Into<String>,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user_id: user_id.into(),
            user_latent_feature: serde_json::to_string(features)?,
            user_interest: user_interest.into(),
            user_interest_index: None,
        })
    }

    pub fn with_interest_index(mut self, index: i64) -> Self {
        self.user_interest_index = Some(index);
        self
    }
}

/// Row of `cluster_metrics`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ClusterMetricRow {
    pub label: String,
    pub position: i64,
    pub intra_dispersion: f64,
    pub inter_distance: f64,
    pub size: i64,
    pub computed_at: String,
}

impl ClusterMetricRow {
    pub fn from_metric(position: usize, metric: &ClusterMetric, computed_at: &str) -> Self {
        Self {
            label: metric.label.clone(),
            position: position as i64,
            intra_dispersion: metric.intra_dispersion,
            inter_distance: metric.inter_distance,
            size: metric.size as i64,
            computed_at: computed_at.to_string(),
        }
    }
}

/// Row of `top_keywords`
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct TopKeywordsRow {
    pub interest_index: i64,
    /// JSON array of keywords, most frequent first
    pub keywords: String,
    pub computed_at: String,
}

impl TopKeywordsRow {
    pub fn from_ranking(
        ranking: &ClusterKeywordRanking,
        computed_at: &str,
    ) -> Result<Self, serde_json::Error> {
        Ok(Self {
            interest_index: ranking.cluster_index as i64,
            keywords: serde_json::to_string(&ranking.top_keywords)?,
            computed_at: computed_at.to_string(),
        })
    }

    pub fn keywords(&self) -> Result<Vec<String>, serde_json::Error> {
        serde_json::from_str(&self.keywords)
    }
}

/// Timestamp stamped on every persisted result row
pub fn run_timestamp() -> String {
    Utc::now().to_rfc3339()
}
