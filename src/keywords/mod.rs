//! Per-cluster keyword frequency rankings

pub mod engine;

pub use engine::{
    compute_top_keywords, ClusterKeywordRanking, ItemKeywords, KeywordCount, KeywordError,
};
