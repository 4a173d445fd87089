//! Ingredient-based patch generation.
//!
//! Every suspicious node is paired with every node in the repository; the
//! historical frequency table decides which Replacement / Insertion /
//! Deletion pairings are worth emitting.

use tracing::{debug, info};

use crate::extract::SyntaxNode;

use super::freq::HistoricalFreqs;
use super::{similarity, MutationCategory, MutationType, PatchCandidate};

/// Generates patch candidates from extracted nodes.
pub struct MutationEngine {
    freqs: HistoricalFreqs,
}

impl MutationEngine {
    pub fn new(freqs: HistoricalFreqs) -> Self {
        Self { freqs }
    }

    /// Pair each suspicious target with every ingredient and apply the
    /// historical rules. `failing_tests` is copied onto each candidate as
    /// its `affected_tests`.
    pub fn generate(&self, nodes: &[SyntaxNode], failing_tests: &[String]) -> Vec<PatchCandidate> {
        // Ingredients are ALL nodes, suspicious ones included: SBFL scores
        // are probabilistic, so flagged nodes may still hold correct
        // sub-patterns worth borrowing.
        let targets: Vec<&SyntaxNode> = nodes.iter().filter(|n| n.is_suspicious()).collect();

        info!(
            target: "mutate",
            targets = targets.len(),
            ingredients = nodes.len(),
            "generating patch candidates"
        );

        let mut candidates = Vec::new();
        let mut id_counter = 0usize;

        for target in &targets {
            for ingredient in nodes {
                self.apply_replacement(target, ingredient, failing_tests, &mut id_counter, &mut candidates);
                self.apply_insertion(target, ingredient, failing_tests, &mut id_counter, &mut candidates);
                self.apply_deletion(target, ingredient, failing_tests, &mut id_counter, &mut candidates);
            }
        }

        debug!(target: "mutate", count = candidates.len(), "generated candidates");
        candidates
    }

    fn apply_replacement(
        &self,
        target: &SyntaxNode,
        ingredient: &SyntaxNode,
        failing_tests: &[String],
        id_counter: &mut usize,
        out: &mut Vec<PatchCandidate>,
    ) {
        for entry in &self.freqs.replacement {
            if entry.target_node != target.node_type || ingredient.node_type != target.node_type {
                continue;
            }
            if !target.is_single_line() || !ingredient.is_single_line() {
                continue;
            }
            // Identical text would be a no-op patch.
            if target.source_text == ingredient.source_text {
                continue;
            }

            out.push(build_candidate(
                id_counter,
                target,
                ingredient,
                MutationCategory::Replacement,
                target.source_text.clone(),
                ingredient.source_text.clone(),
                target.end_line,
                failing_tests,
                similarity::replacement_similarity(ingredient, target),
            ));
        }
    }

    fn apply_insertion(
        &self,
        target: &SyntaxNode,
        ingredient: &SyntaxNode,
        failing_tests: &[String],
        id_counter: &mut usize,
        out: &mut Vec<PatchCandidate>,
    ) {
        for entry in &self.freqs.insertion {
            if entry.target_node != target.node_type || entry.source_node != ingredient.node_type {
                continue;
            }
            if !target.is_single_line() || !ingredient.is_single_line() {
                continue;
            }

            out.push(build_candidate(
                id_counter,
                target,
                ingredient,
                MutationCategory::Insertion,
                String::new(),
                ingredient.source_text.clone(),
                target.start_line,
                failing_tests,
                similarity::insertion_similarity(ingredient, target),
            ));
        }
    }

    fn apply_deletion(
        &self,
        target: &SyntaxNode,
        ingredient: &SyntaxNode,
        failing_tests: &[String],
        id_counter: &mut usize,
        out: &mut Vec<PatchCandidate>,
    ) {
        for entry in &self.freqs.deletion {
            if entry.target_node != target.node_type || entry.source_node != ingredient.node_type {
                continue;
            }
            if !target.is_single_line() || !ingredient.is_single_line() {
                continue;
            }

            out.push(build_candidate(
                id_counter,
                target,
                ingredient,
                MutationCategory::Deletion,
                target.source_text.clone(),
                String::new(),
                target.end_line,
                failing_tests,
                similarity::deletion_similarity(ingredient, target),
            ));
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn build_candidate(
    id_counter: &mut usize,
    target: &SyntaxNode,
    ingredient: &SyntaxNode,
    category: MutationCategory,
    original_code: String,
    modified_code: String,
    end_line: u32,
    failing_tests: &[String],
    similarity_score: f64,
) -> PatchCandidate {
    let patch_id = format!("patch_{}", *id_counter);
    *id_counter += 1;

    let diff = make_diff(target.start_line, &original_code, &modified_code);

    PatchCandidate {
        patch_id,
        target_node_id: target.node_id.clone(),
        file_path: target.file_path.clone(),
        start_line: target.start_line,
        end_line,
        original_code,
        modified_code,
        diff,
        mutation_type: MutationType {
            category,
            target_node: target.node_type.clone(),
            source_node: ingredient.node_type.clone(),
        },
        affected_tests: failing_tests.to_vec(),
        suspiciousness_score: target.suspiciousness_score,
        similarity_score,
        priority_score: 0.0,
    }
}

/// Build a unified-diff hunk for a patch.
///
/// The header line counts are `newlines + 1`, so an empty side still reads
/// as one line while contributing no `-`/`+` body lines.
pub fn make_diff(start_line: u32, original: &str, modified: &str) -> String {
    let original_lines = original.matches('\n').count() + 1;
    let modified_lines = modified.matches('\n').count() + 1;

    let mut diff = format!(
        "@@ -{},{} +{},{} @@\n",
        start_line, original_lines, start_line, modified_lines
    );
    for line in original.lines() {
        diff.push('-');
        diff.push_str(line);
        diff.push('\n');
    }
    for line in modified.lines() {
        diff.push('+');
        diff.push_str(line);
        diff.push('\n');
    }
    diff
}
