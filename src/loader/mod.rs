//! Loader adapters
//!
//! Every data source that feeds the engines sits behind one of two
//! capability traits:
//!
//! - [`FeatureSource`] produces labeled feature vectors for the metrics engine
//! - [`AssignmentSource`] produces the item → cluster index mapping for the
//!   keyword engine
//!
//! Adapters exist for a single JSON document ([`JsonFeatureSource`]), a pair
//! of JSON documents ([`PairedJsonSource`]), a JSON assignment list
//! ([`JsonAssignmentSource`]) and the SQLite store ([`crate::db::Database`]).
//! Records are validated into typed values here so the engines never see
//! loosely-shaped input.

mod assignments;
mod json;

pub use assignments::{load_item_keywords, JsonAssignmentSource};
pub use json::{load_division_rows, JsonFeatureSource, PairedJsonSource};

use crate::db::{Database, DatabaseError};
use crate::metrics::FeatureRecord;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Loader errors
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Item {item_id}: {words} keywords but {counts} counts")]
    MismatchedKeywordCounts {
        item_id: String,
        words: usize,
        counts: usize,
    },

    #[error("Item {item_id} has negative cluster index {index}")]
    NegativeClusterIndex { item_id: String, index: i64 },

    #[error("Item {item_id}: invalid feature vector: {reason}")]
    InvalidFeatureVector { item_id: String, reason: String },
}

/// Anything that can produce labeled feature vectors
#[async_trait]
pub trait FeatureSource: Send + Sync {
    /// Load every record the source holds
    async fn load_features(&self) -> Result<Vec<FeatureRecord>, LoadError>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// Anything that can produce an item → cluster index mapping
#[async_trait]
pub trait AssignmentSource: Send + Sync {
    /// Load the mapping. Later entries for the same item replace earlier ones.
    async fn load_assignments(&self) -> Result<HashMap<String, usize>, LoadError>;

    /// Human readable origin, used in logs
    fn describe(&self) -> String;
}

/// Where feature records come from
#[derive(Debug, Clone)]
pub enum FeatureSourceKind {
    /// One document with vectors and labels together
    Json(PathBuf),
    /// A vectors document plus a predictions document keyed by item id
    Paired {
        features: PathBuf,
        predictions: PathBuf,
    },
    /// The `user_division` table
    Database,
}

/// Build a feature source. `db` is only consulted for [`FeatureSourceKind::Database`].
pub fn create_feature_source(
    kind: FeatureSourceKind,
    db: Option<Database>,
) -> Result<Box<dyn FeatureSource>, LoadError> {
    match kind {
        FeatureSourceKind::Json(path) => Ok(Box::new(JsonFeatureSource::new(path))),
        FeatureSourceKind::Paired {
            features,
            predictions,
        } => Ok(Box::new(PairedJsonSource::new(features, predictions))),
        FeatureSourceKind::Database => match db {
            Some(db) => Ok(Box::new(db)),
            None => Err(LoadError::Database(DatabaseError::NotFound(
                "no database configured for feature loading".to_string(),
            ))),
        },
    }
}

/// Item ids and labels show up as strings or numbers depending on the
/// exporter; both normalize to `String`. Numbers keep their JSON spelling,
/// so ids past `i64::MAX` and float ids survive unchanged.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum Identifier {
    Text(String),
    Number(serde_json::Number),
}

impl From<Identifier> for String {
    fn from(value: Identifier) -> Self {
        match value {
            Identifier::Text(s) => s,
            Identifier::Number(n) => n.to_string(),
        }
    }
}

/// Convert a raw cluster index, rejecting negatives.
pub(crate) fn cluster_index(item_id: &str, index: i64) -> Result<usize, LoadError> {
    usize::try_from(index).map_err(|_| LoadError::NegativeClusterIndex {
        item_id: item_id.to_string(),
        index,
    })
}

pub(crate) async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, LoadError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

    serde_json::from_str(&content).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
