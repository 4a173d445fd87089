//! Historical mutation-frequency table.
//!
//! The table records how often each mutation shape occurred in historical
//! patches. It gates which rules the engine applies and weights the
//! prioritizer's score.

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::core::Result;

use super::MutationCategory;

/// One historical frequency observation.
///
/// For Replacement entries only `target_node` is significant and
/// `source_node` is empty; Insertion and Deletion use both.
#[derive(Debug, Clone, PartialEq)]
pub struct FreqEntry {
    pub target_node: String,
    pub source_node: String,
    pub freq: f64,
}

/// Frequency entries grouped by mutation category.
#[derive(Debug, Clone, Default)]
pub struct HistoricalFreqs {
    pub replacement: Vec<FreqEntry>,
    pub insertion: Vec<FreqEntry>,
    pub deletion: Vec<FreqEntry>,
}

#[derive(Deserialize)]
struct RawEntry {
    target: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    freq: f64,
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct RawTable {
    #[serde(rename = "Replacement")]
    replacement: Vec<RawEntry>,
    #[serde(rename = "Insertion")]
    insertion: Vec<RawEntry>,
    #[serde(rename = "Deletion")]
    deletion: Vec<RawEntry>,
}

impl From<RawEntry> for FreqEntry {
    fn from(raw: RawEntry) -> Self {
        Self {
            target_node: raw.target,
            source_node: raw.source,
            freq: raw.freq,
        }
    }
}

impl HistoricalFreqs {
    /// Load the table from its JSON form. Missing categories load as empty.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let table: RawTable = serde_json::from_str(&raw)?;

        let freqs = Self {
            replacement: table.replacement.into_iter().map(Into::into).collect(),
            insertion: table.insertion.into_iter().map(Into::into).collect(),
            deletion: table.deletion.into_iter().map(Into::into).collect(),
        };
        debug!(
            target: "mutate",
            replacement = freqs.replacement.len(),
            insertion = freqs.insertion.len(),
            deletion = freqs.deletion.len(),
            "loaded historical frequencies"
        );
        Ok(freqs)
    }

    /// Entries for one category.
    pub fn entries(&self, category: MutationCategory) -> &[FreqEntry] {
        match category {
            MutationCategory::Replacement => &self.replacement,
            MutationCategory::Insertion => &self.insertion,
            MutationCategory::Deletion => &self.deletion,
        }
    }

    /// Look up the frequency for a mutation shape; Replacement matches on
    /// the target type alone. When several entries match, the last one wins.
    pub fn lookup(&self, category: MutationCategory, target: &str, source: &str) -> f64 {
        let mut freq = 0.0;
        for entry in self.entries(category) {
            let matches = match category {
                MutationCategory::Replacement => entry.target_node == target,
                _ => entry.target_node == target && entry.source_node == source,
            };
            if matches {
                freq = entry.freq;
            }
        }
        freq
    }

    pub fn is_empty(&self) -> bool {
        self.replacement.is_empty() && self.insertion.is_empty() && self.deletion.is_empty()
    }
}
