//! Mutation engine: turns suspicious syntax nodes and fix ingredients into
//! prioritizable patch candidates.

mod engine;
pub mod freq;
pub mod similarity;

use serde::{Deserialize, Serialize};

pub use engine::{make_diff, MutationEngine};
pub use freq::{FreqEntry, HistoricalFreqs};

/// Category of a mutation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MutationCategory {
    Replacement,
    Insertion,
    Deletion,
}

impl std::fmt::Display for MutationCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Replacement => "Replacement",
            Self::Insertion => "Insertion",
            Self::Deletion => "Deletion",
        };
        f.write_str(name)
    }
}

/// Shape of a mutation: its category plus the node types it pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationType {
    pub category: MutationCategory,
    pub target_node: String,
    pub source_node: String,
}

/// A single-hunk, single-file candidate patch.
///
/// `original_code` is empty only for Insertion and `modified_code` only for
/// Deletion; neither ever contains a newline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PatchCandidate {
    /// Unique id within a run (`patch_N`).
    pub patch_id: String,
    /// Id of the suspicious node this patch edits.
    pub target_node_id: String,
    pub file_path: String,
    pub start_line: u32,
    pub end_line: u32,
    pub original_code: String,
    pub modified_code: String,
    /// Unified-diff hunk for display and review.
    pub diff: String,
    pub mutation_type: MutationType,
    /// Originally failing tests; drives Phase A filtering.
    pub affected_tests: Vec<String>,
    pub suspiciousness_score: f64,
    pub similarity_score: f64,
    /// Filled by the prioritizer; 0 until then.
    pub priority_score: f64,
}
