//! Cluster metrics engine
//!
//! Two passes over the labeled records: the first builds one centroid per
//! label (plus dispersion and size), the second averages centroid-to-centroid
//! distances across the whole label list.

use super::geometry::{calculate_centroid, euclidean_distance, mean_distance_to};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MetricsError {
    #[error("Cluster '{label}' has no members: centroid and dispersion are undefined")]
    EmptyCluster { label: String },

    #[error("Label '{label}' appears more than once in the label list")]
    DuplicateLabel { label: String },

    #[error("Item {item_id}: expected {expected} features, found {found}")]
    DimensionMismatch {
        item_id: String,
        expected: usize,
        found: usize,
    },

    #[error("Item {item_id} has an empty feature vector")]
    EmptyFeatureVector { item_id: String },

    #[error("Item {item_id} has a non-finite feature at position {position}")]
    NonFiniteFeature { item_id: String, position: usize },
}

/// One labeled item: its feature vector and the cluster it was assigned to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub item_id: String,
    pub feature_vector: Vec<f64>,
    pub cluster_label: String,
}

impl FeatureRecord {
    pub fn new(
        item_id: impl Into<String>,
        feature_vector: Vec<f64>,
        cluster_label: impl Into<String>,
    ) -> Self {
        Self {
            item_id: item_id.into(),
            feature_vector,
            cluster_label: cluster_label.into(),
        }
    }
}

/// Quality metrics for one label, emitted in label-list order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterMetric {
    pub label: String,
    /// Mean distance from members to their centroid
    pub intra_dispersion: f64,
    /// Mean distance from this centroid to every other label's centroid
    pub inter_distance: f64,
    pub size: usize,
}

/// Check that every record carries a non-empty, finite vector of one shared length.
///
/// Returns the common dimensionality, or `None` when there are no records.
pub fn validate_dimensions(records: &[FeatureRecord]) -> Result<Option<usize>, MetricsError> {
    let mut expected: Option<usize> = None;

    for record in records {
        let found = record.feature_vector.len();
        if found == 0 {
            return Err(MetricsError::EmptyFeatureVector {
                item_id: record.item_id.clone(),
            });
        }

        match expected {
            None => expected = Some(found),
            Some(dim) if dim != found => {
                return Err(MetricsError::DimensionMismatch {
                    item_id: record.item_id.clone(),
                    expected: dim,
                    found,
                });
            }
            Some(_) => {}
        }

        if let Some(position) = record.feature_vector.iter().position(|v| !v.is_finite()) {
            return Err(MetricsError::NonFiniteFeature {
                item_id: record.item_id.clone(),
                position,
            });
        }
    }

    Ok(expected)
}

/// Number of records whose label is not in `labels` (ignored by the engine).
pub fn count_unlisted<S: AsRef<str>>(records: &[FeatureRecord], labels: &[S]) -> usize {
    records
        .iter()
        .filter(|r| !labels.iter().any(|l| l.as_ref() == r.cluster_label))
        .count()
}

#[derive(Debug, Clone)]
struct ClusterEntry {
    label: String,
    centroid: Vec<f64>,
    intra_dispersion: f64,
    size: usize,
}

/// Per-label centroid table built by the first pass.
#[derive(Debug, Clone)]
pub struct ClusterCentroids {
    entries: Vec<ClusterEntry>,
    positions: HashMap<String, usize>,
    dimension: Option<usize>,
}

impl ClusterCentroids {
    /// Partition `records` by label and compute centroid, dispersion and size
    /// for every entry of `labels`.
    ///
    /// Fails on duplicate labels, malformed vectors, or a label with no members.
    pub fn compute<S: AsRef<str>>(
        records: &[FeatureRecord],
        labels: &[S],
    ) -> Result<Self, MetricsError> {
        let mut positions = HashMap::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let label = label.as_ref();
            if positions.insert(label.to_string(), i).is_some() {
                return Err(MetricsError::DuplicateLabel {
                    label: label.to_string(),
                });
            }
        }

        let dimension = validate_dimensions(records)?;

        let mut members: Vec<Vec<&[f64]>> = vec![Vec::new(); labels.len()];
        for record in records {
            if let Some(&slot) = positions.get(record.cluster_label.as_str()) {
                members[slot].push(record.feature_vector.as_slice());
            }
        }

        let mut entries = Vec::with_capacity(labels.len());
        for (label, vectors) in labels.iter().zip(members) {
            let label = label.as_ref();
            let empty = || MetricsError::EmptyCluster {
                label: label.to_string(),
            };

            let centroid = calculate_centroid(vectors.iter().copied()).ok_or_else(empty)?;
            let intra_dispersion =
                mean_distance_to(vectors.iter().copied(), &centroid).ok_or_else(empty)?;

            entries.push(ClusterEntry {
                label: label.to_string(),
                centroid,
                intra_dispersion,
                size: vectors.len(),
            });
        }

        Ok(Self {
            entries,
            positions,
            dimension,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Shared feature dimensionality, `None` if no records were supplied
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Labels in the order they were supplied
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.label.as_str())
    }

    pub fn centroid(&self, label: &str) -> Option<&[f64]> {
        self.entry(label).map(|e| e.centroid.as_slice())
    }

    pub fn size(&self, label: &str) -> Option<usize> {
        self.entry(label).map(|e| e.size)
    }

    pub fn intra_dispersion(&self, label: &str) -> Option<f64> {
        self.entry(label).map(|e| e.intra_dispersion)
    }

    /// Distance between the centroids of two labels. Symmetric in its arguments.
    pub fn distance_between(&self, a: &str, b: &str) -> Option<f64> {
        let a = self.entry(a)?;
        let b = self.entry(b)?;
        Some(euclidean_distance(&a.centroid, &b.centroid))
    }

    /// Mean centroid distance from the entry at `position` to every other entry.
    /// A lone label has no other clusters and gets 0.0.
    fn inter_distance(&self, position: usize) -> f64 {
        let others = self.entries.len().saturating_sub(1);
        if others == 0 {
            return 0.0;
        }

        let own = &self.entries[position].centroid;
        let total: f64 = self
            .entries
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != position)
            .map(|(_, other)| euclidean_distance(own, &other.centroid))
            .sum();

        total / others as f64
    }

    /// Second pass: one `ClusterMetric` per label, in label order.
    pub fn metrics(&self) -> Vec<ClusterMetric> {
        self.entries
            .iter()
            .enumerate()
            .map(|(i, entry)| ClusterMetric {
                label: entry.label.clone(),
                intra_dispersion: entry.intra_dispersion,
                inter_distance: self.inter_distance(i),
                size: entry.size,
            })
            .collect()
    }

    pub fn into_metrics(self) -> Vec<ClusterMetric> {
        self.metrics()
    }

    fn entry(&self, label: &str) -> Option<&ClusterEntry> {
        self.positions.get(label).map(|&i| &self.entries[i])
    }
}

/// Compute intra-cluster dispersion, inter-cluster distance and size for
/// every label in `labels`, in that order.
///
/// Records whose label is not listed are ignored. Pure and deterministic.
pub fn compute_cluster_metrics<S: AsRef<str>>(
    records: &[FeatureRecord],
    labels: &[S],
) -> Result<Vec<ClusterMetric>, MetricsError> {
    Ok(ClusterCentroids::compute(records, labels)?.into_metrics())
}
