//! Cluster assignments and per-item keyword documents

use super::{cluster_index, read_json, AssignmentSource, Identifier, LoadError};
use crate::keywords::{ItemKeywords, KeywordCount};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize)]
struct AssignmentEntry {
    user_id: Identifier,
    user_interest_index: i64,
}

/// List of `{user_id, user_interest_index}` entries.
#[derive(Debug, Clone)]
pub struct JsonAssignmentSource {
    path: PathBuf,
}

impl JsonAssignmentSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl AssignmentSource for JsonAssignmentSource {
    async fn load_assignments(&self) -> Result<HashMap<String, usize>, LoadError> {
        let entries: Vec<AssignmentEntry> = read_json(&self.path).await?;

        let mut assignments = HashMap::with_capacity(entries.len());
        for entry in entries {
            let item_id = String::from(entry.user_id);
            let index = cluster_index(&item_id, entry.user_interest_index)?;
            assignments.insert(item_id, index);
        }

        tracing::debug!("Loaded {} assignments from {:?}", assignments.len(), self.path);
        Ok(assignments)
    }

    fn describe(&self) -> String {
        format!("json:{}", self.path.display())
    }
}

#[derive(Debug, Deserialize)]
struct KeywordEntry {
    user_id: Identifier,
    top_words: Vec<String>,
    top_words_counts: Vec<u64>,
}

/// Load `{user_id, top_words, top_words_counts}` entries.
///
/// The two arrays are parallel; a length mismatch is an error rather than a
/// silent truncation.
pub async fn load_item_keywords(path: &Path) -> Result<Vec<ItemKeywords>, LoadError> {
    let entries: Vec<KeywordEntry> = read_json(path).await?;

    let items = entries
        .into_iter()
        .map(|entry| {
            let item_id = String::from(entry.user_id);
            if entry.top_words.len() != entry.top_words_counts.len() {
                return Err(LoadError::MismatchedKeywordCounts {
                    item_id,
                    words: entry.top_words.len(),
                    counts: entry.top_words_counts.len(),
                });
            }

            let keywords = entry
                .top_words
                .into_iter()
                .zip(entry.top_words_counts)
                .map(|(word, count)| KeywordCount::new(word, count))
                .collect();
            Ok(ItemKeywords::new(item_id, keywords))
        })
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!("Loaded keywords for {} items from {:?}", items.len(), path);
    Ok(items)
}
