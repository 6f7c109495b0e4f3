//! JSON-backed feature sources

use super::{read_json, FeatureSource, Identifier, LoadError};
use crate::db::UserDivisionRow;
use crate::metrics::FeatureRecord;
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct DivisionEntry {
    user_id: Identifier,
    user_latent_feature: Vec<f64>,
    user_interest: Identifier,
    #[serde(default)]
    user_interest_index: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct KeyedDivisionEntry {
    user_latent_feature: Vec<f64>,
    user_interest: Identifier,
    #[serde(default)]
    user_interest_index: Option<i64>,
}

/// Either a list of records or an object keyed by item id
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DivisionDocument {
    List(Vec<DivisionEntry>),
    Keyed(BTreeMap<String, KeyedDivisionEntry>),
}

impl DivisionDocument {
    /// Flatten either shape into `(record, optional cluster index)` pairs
    fn into_items(self) -> Vec<(FeatureRecord, Option<i64>)> {
        match self {
            Self::List(entries) => entries
                .into_iter()
                .map(|e| {
                    let record =
                        FeatureRecord::new(e.user_id, e.user_latent_feature, e.user_interest);
                    (record, e.user_interest_index)
                })
                .collect(),
            // BTreeMap keeps keyed documents in a stable (sorted) order
            Self::Keyed(entries) => entries
                .into_iter()
                .map(|(id, e)| {
                    let record = FeatureRecord::new(id, e.user_latent_feature, e.user_interest);
                    (record, e.user_interest_index)
                })
                .collect(),
        }
    }
}

/// Read a division document as `user_division` rows, keeping any
/// `user_interest_index` so the same import serves both engines.
pub async fn load_division_rows(path: &Path) -> Result<Vec<UserDivisionRow>, LoadError> {
    let document: DivisionDocument = read_json(path).await?;

    document
        .into_items()
        .into_iter()
        .map(|(record, index)| {
            let row = UserDivisionRow::new(
                record.item_id.clone(),
                &record.feature_vector,
                record.cluster_label,
            )
            .map_err(|e| LoadError::InvalidFeatureVector {
                item_id: record.item_id,
                reason: e.to_string(),
            })?;
            Ok(match index {
                Some(index) => row.with_interest_index(index),
                None => row,
            })
        })
        .collect()
}

/// Single document carrying `user_id`, `user_latent_feature` and
/// `user_interest` for every item.
#[derive(Debug, Clone)]
pub struct JsonFeatureSource {
    path: PathBuf,
}

impl JsonFeatureSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl FeatureSource for JsonFeatureSource {
    async fn load_features(&self) -> Result<Vec<FeatureRecord>, LoadError> {
        let document: DivisionDocument = read_json(&self.path).await?;
        let records: Vec<FeatureRecord> =
            document.into_items().into_iter().map(|(r, _)| r).collect();
        tracing::debug!("Loaded {} feature records from {:?}", records.len(), self.path);
        Ok(records)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[derive(Debug, Deserialize)]
struct LatentEntry {
    user_id: Identifier,
    user_latent_feature: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct PredictionEntry {
    user_interest: Identifier,
}

/// Feature vectors from one document, labels from a second one keyed by item id.
///
/// Only items present in both documents are emitted, in feature-document order.
#[derive(Debug, Clone)]
pub struct PairedJsonSource {
    features: PathBuf,
    predictions: PathBuf,
}

impl PairedJsonSource {
    pub fn new(features: impl Into<PathBuf>, predictions: impl Into<PathBuf>) -> Self {
        Self {
            features: features.into(),
            predictions: predictions.into(),
        }
    }
}

#[async_trait]
impl FeatureSource for PairedJsonSource {
    async fn load_features(&self) -> Result<Vec<FeatureRecord>, LoadError> {
        let latents: Vec<LatentEntry> = read_json(&self.features).await?;
        let predictions: HashMap<String, PredictionEntry> = read_json(&self.predictions).await?;

        let total = latents.len();
        let records: Vec<FeatureRecord> = latents
            .into_iter()
            .filter_map(|entry| {
                let id = String::from(entry.user_id);
                let label = predictions.get(&id)?.user_interest.clone();
                Some(FeatureRecord::new(id, entry.user_latent_feature, label))
            })
            .collect();

        if records.len() < total {
            tracing::debug!(
                "{} of {} items in {:?} have no prediction",
                total - records.len(),
                total,
                self.features
            );
        }
        Ok(records)
    }

    fn describe(&self) -> String {
        format!(
            "json:{} + {}",
            self.features.display(),
            self.predictions.display()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_list_document() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "division.json",
            r#"[
                {"user_id": 1, "user_latent_feature": [0.0, 1.0], "user_interest": "music"},
                {"user_id": "u2", "user_latent_feature": [2.0, 3.0], "user_interest": "pets"}
            ]"#,
        );

        let records = JsonFeatureSource::new(path).load_features().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], FeatureRecord::new("1", vec![0.0, 1.0], "music"));
        assert_eq!(records[1].item_id, "u2");
    }

    #[tokio::test]
    async fn test_keyed_document() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "division.json",
            r#"{
                "b": {"user_latent_feature": [1.0], "user_interest": "games"},
                "a": {"user_latent_feature": [2.0], "user_interest": 4}
            }"#,
        );

        let records = JsonFeatureSource::new(path).load_features().await.unwrap();
        assert_eq!(records[0], FeatureRecord::new("a", vec![2.0], "4"));
        assert_eq!(records[1], FeatureRecord::new("b", vec![1.0], "games"));
    }

    #[tokio::test]
    async fn test_paired_documents_keep_only_predicted_items() {
        let dir = TempDir::new().unwrap();
        let features = write(
            &dir,
            "latent.json",
            r#"[
                {"user_id": "x", "user_latent_feature": [1.0, 1.0]},
                {"user_id": "y", "user_latent_feature": [2.0, 2.0]},
                {"user_id": 7, "user_latent_feature": [3.0, 3.0]}
            ]"#,
        );
        let predictions = write(
            &dir,
            "predict.json",
            r#"{"7": {"user_interest": "sports"}, "x": {"user_interest": "music"}}"#,
        );

        let source = PairedJsonSource::new(features, predictions);
        let records = source.load_features().await.unwrap();
        assert_eq!(
            records,
            vec![
                FeatureRecord::new("x", vec![1.0, 1.0], "music"),
                FeatureRecord::new("7", vec![3.0, 3.0], "sports"),
            ]
        );
        assert!(source.describe().starts_with("json:"));
    }

    #[tokio::test]
    async fn test_division_rows_keep_index() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "division.json",
            r#"[
                {"user_id": 5, "user_latent_feature": [1, 2], "user_interest": "music", "user_interest_index": 12},
                {"user_id": 6, "user_latent_feature": [3, 4], "user_interest": "pets"}
            ]"#,
        );

        let rows = load_division_rows(&path).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].user_id, "5");
        assert_eq!(rows[0].user_latent_feature, "[1.0,2.0]");
        assert_eq!(rows[0].user_interest_index, Some(12));
        assert_eq!(rows[1].user_interest_index, None);
    }

    #[tokio::test]
    async fn test_malformed_document() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "bad.json", r#"[{"user_id": 1}]"#);
        let err = JsonFeatureSource::new(path).load_features().await.unwrap_err();
        assert!(matches!(err, LoadError::Parse { .. }));
    }
}
