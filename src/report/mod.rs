//! Console rendering of engine results

use crate::keywords::ClusterKeywordRanking;
use crate::metrics::ClusterMetric;
use serde::Serialize;
use std::fmt::Write;

/// How results are printed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Pretty JSON for any result list
pub fn to_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}

/// Render metrics as an aligned text table, one row per label.
pub fn render_metrics_table(metrics: &[ClusterMetric]) -> String {
    let width = metrics
        .iter()
        .map(|m| m.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Cluster".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<width$}  {:>16}  {:>14}  {:>8}",
        "Cluster", "IntraDispersion", "InterDistance", "Size"
    );
    let _ = writeln!(out, "{}", "-".repeat(width + 46));
    for m in metrics {
        let _ = writeln!(
            out,
            "{:<width$}  {:>16.6}  {:>14.6}  {:>8}",
            m.label, m.intra_dispersion, m.inter_distance, m.size
        );
    }
    out
}

/// Render rankings with one column per keyword rank.
///
/// The cluster column shows the label configured for that index when there
/// is one, otherwise the bare index.
pub fn render_keyword_table(
    rankings: &[ClusterKeywordRanking],
    labels: &[String],
    top_n: usize,
) -> String {
    let names: Vec<String> = rankings
        .iter()
        .map(|r| match labels.get(r.cluster_index) {
            Some(label) => format!("{} {}", r.cluster_index, label),
            None => r.cluster_index.to_string(),
        })
        .collect();
    let width = names
        .iter()
        .map(|n| n.chars().count())
        .max()
        .unwrap_or(0)
        .max("Cluster".len());

    let mut out = String::new();
    let _ = write!(out, "{:<width$}", "Cluster");
    for rank in 1..=top_n {
        let _ = write!(out, "  Top {rank} Keyword");
    }
    out.push('\n');

    for (name, ranking) in names.iter().zip(rankings) {
        let _ = write!(out, "{:<width$}", name);
        for rank in 0..top_n {
            let keyword = ranking
                .top_keywords
                .get(rank)
                .map(String::as_str)
                .unwrap_or("-");
            let _ = write!(out, "  {:<13}", keyword);
        }
        out.push('\n');
    }
    out
}
