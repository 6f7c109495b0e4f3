//! Cluster quality metrics over labeled feature vectors

pub mod engine;
pub mod geometry;

pub use engine::{
    compute_cluster_metrics, count_unlisted, validate_dimensions, ClusterCentroids,
    ClusterMetric, FeatureRecord, MetricsError,
};
pub use geometry::{calculate_centroid, euclidean_distance, mean_distance_to};
