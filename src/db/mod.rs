//! Database module for SQLite persistence

mod migrations;
mod models;
mod repository;

pub use models::{run_timestamp, ClusterMetricRow, TopKeywordsRow, UserDivisionRow};
pub use repository::{Database, DatabaseError};
