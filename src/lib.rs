//! clusterlens - cluster quality metrics for labeled feature vectors
//!
//! Given items that already carry a cluster label, clusterlens measures how
//! tight each cluster is and how far apart the clusters sit, and ranks the
//! most frequent keywords per cluster.
//!
//! # Modules
//!
//! - [`metrics`] - Centroids, intra-cluster dispersion, inter-cluster distance, size
//! - [`keywords`] - Per-cluster keyword frequency rankings
//! - [`loader`] - JSON and SQLite adapters producing typed engine input
//! - [`db`] - SQLite persistence of inputs and results
//! - [`report`] - Table and JSON rendering
//! - [`config`] - Configuration loading
//!
//! # Example
//!
//! ```
//! use clusterlens::metrics::{compute_cluster_metrics, FeatureRecord};
//!
//! let records = vec![
//!     FeatureRecord::new("1", vec![0.0, 0.0], "A"),
//!     FeatureRecord::new("2", vec![2.0, 0.0], "A"),
//!     FeatureRecord::new("3", vec![0.0, 4.0], "B"),
//! ];
//! let metrics = compute_cluster_metrics(&records, &["A", "B"]).unwrap();
//! assert_eq!(metrics[0].size, 2);
//! assert!((metrics[0].intra_dispersion - 1.0).abs() < 1e-12);
//! ```

pub mod config;
pub mod db;
pub mod keywords;
pub mod loader;
pub mod logging;
pub mod metrics;
pub mod report;

pub use config::AppConfig;
pub use db::Database;
pub use keywords::{compute_top_keywords, ClusterKeywordRanking, ItemKeywords, KeywordCount};
pub use loader::{AssignmentSource, FeatureSource};
pub use metrics::{compute_cluster_metrics, ClusterCentroids, ClusterMetric, FeatureRecord};
