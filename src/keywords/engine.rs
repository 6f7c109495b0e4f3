//! Keyword aggregation engine
//!
//! Merges per-item keyword counts into one tally per cluster index and ranks
//! the most frequent keywords of each cluster.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeywordError {
    #[error("Item {item_id} maps to cluster index {index}, outside 0..{cluster_count}")]
    UnknownClusterIndex {
        item_id: String,
        index: usize,
        cluster_count: usize,
    },
}

/// A keyword and how often it occurred for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordCount {
    pub keyword: String,
    pub count: u64,
}

impl KeywordCount {
    pub fn new(keyword: impl Into<String>, count: u64) -> Self {
        Self {
            keyword: keyword.into(),
            count,
        }
    }
}

/// Top keywords of one item, in the order the item listed them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemKeywords {
    pub item_id: String,
    pub keywords: Vec<KeywordCount>,
}

impl ItemKeywords {
    pub fn new(item_id: impl Into<String>, keywords: Vec<KeywordCount>) -> Self {
        Self {
            item_id: item_id.into(),
            keywords,
        }
    }
}

/// Most frequent keywords of one cluster, highest aggregated count first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClusterKeywordRanking {
    pub cluster_index: usize,
    pub top_keywords: Vec<String>,
}

/// Running keyword totals for a single cluster.
///
/// Each keyword remembers when it was first added; ties on the total are
/// ordered by that first appearance.
#[derive(Debug, Default)]
struct KeywordTally {
    totals: HashMap<String, (u64, usize)>,
}

impl KeywordTally {
    fn add(&mut self, keyword: &str, count: u64) {
        let next_order = self.totals.len();
        match self.totals.get_mut(keyword) {
            Some((total, _)) => *total = total.saturating_add(count),
            None => {
                self.totals.insert(keyword.to_string(), (count, next_order));
            }
        }
    }

    fn top(&self, n: usize) -> Vec<String> {
        let mut ranked: Vec<(&String, u64, usize)> = self
            .totals
            .iter()
            .map(|(keyword, &(total, order))| (keyword, total, order))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
        ranked
            .into_iter()
            .take(n)
            .map(|(keyword, _, _)| keyword.clone())
            .collect()
    }
}

/// Rank the `top_n` keywords of every cluster index in `0..cluster_count`.
///
/// Items missing from `item_cluster_index` are skipped. An item mapped to an
/// index outside `0..cluster_count` is an error. Clusters that received no
/// keywords get an empty list. The result always has `cluster_count` entries.
pub fn compute_top_keywords(
    item_cluster_index: &HashMap<String, usize>,
    item_keywords: &[ItemKeywords],
    cluster_count: usize,
    top_n: usize,
) -> Result<Vec<ClusterKeywordRanking>, KeywordError> {
    let mut tallies: HashMap<usize, KeywordTally> = HashMap::new();

    for item in item_keywords {
        let Some(&index) = item_cluster_index.get(&item.item_id) else {
            continue;
        };
        if index >= cluster_count {
            return Err(KeywordError::UnknownClusterIndex {
                item_id: item.item_id.clone(),
                index,
                cluster_count,
            });
        }

        let tally = tallies.entry(index).or_default();
        for kc in &item.keywords {
            tally.add(&kc.keyword, kc.count);
        }
    }

    Ok((0..cluster_count)
        .map(|cluster_index| ClusterKeywordRanking {
            cluster_index,
            top_keywords: tallies
                .get(&cluster_index)
                .map(|tally| tally.top(top_n))
                .unwrap_or_default(),
        })
        .collect())
}
