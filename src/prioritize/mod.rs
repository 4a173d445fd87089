//! Patch prioritization.
//!
//! Fuses suspiciousness, contextual similarity, and historical frequency
//! into one priority score, drops hopeless candidates, and ranks the rest.

use tracing::{debug, info};

use crate::mutate::{HistoricalFreqs, MutationCategory, PatchCandidate};

/// Ranks patch candidates by `suspiciousness × similarity × frequency`.
pub struct Prioritizer {
    freqs: HistoricalFreqs,
}

impl Prioritizer {
    pub fn new(freqs: HistoricalFreqs) -> Self {
        Self { freqs }
    }

    /// Score, filter, and sort candidates.
    ///
    /// Candidates whose priority is zero are dropped. The survivors are
    /// sorted by priority descending, ties by start_line then patch_id
    /// ascending.
    pub fn prioritize(&self, candidates: Vec<PatchCandidate>) -> Vec<PatchCandidate> {
        let total = candidates.len();
        let mut ranked: Vec<PatchCandidate> = candidates
            .into_iter()
            .map(|mut candidate| {
                candidate.priority_score = self.priority(&candidate);
                candidate
            })
            .filter(|candidate| candidate.priority_score > 0.0)
            .collect();

        ranked.sort_by(|a, b| {
            b.priority_score
                .partial_cmp(&a.priority_score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.start_line.cmp(&b.start_line))
                .then_with(|| a.patch_id.cmp(&b.patch_id))
        });

        info!(
            target: "prioritize",
            kept = ranked.len(),
            dropped = total - ranked.len(),
            "prioritized candidates"
        );
        ranked
    }

    fn priority(&self, candidate: &PatchCandidate) -> f64 {
        let shape = &candidate.mutation_type;
        let freq = self
            .freqs
            .lookup(shape.category, &shape.target_node, &shape.source_node);
        let priority = candidate.suspiciousness_score * candidate.similarity_score * freq;
        debug!(
            target: "prioritize",
            patch = %candidate.patch_id,
            category = %shape.category,
            freq,
            priority,
            "scored candidate"
        );
        priority
    }
}
