//! CapGen-style context similarity measures.
//!
//! All pairwise functions take (ingredient, target) in that order; the
//! asymmetric measures normalize by the target side.

use std::collections::BTreeMap;

use crate::extract::{DependencyContext, GenealogyContext, SyntaxNode, VariableContext};

/// Overlap of two count maps normalized by the second: Σ min(a, b) / Σ b.
fn count_overlap(a: &BTreeMap<String, u32>, b: &BTreeMap<String, u32>) -> Option<f64> {
    let denominator: u64 = b.values().map(|v| u64::from(*v)).sum();
    if denominator == 0 {
        return None;
    }
    let shared: u64 = b
        .iter()
        .map(|(kind, count)| u64::from((*count).min(a.get(kind).copied().unwrap_or(0))))
        .sum();
    Some(shared as f64 / denominator as f64)
}

/// Genealogy similarity; 0 when the target context is empty.
pub fn sim_genealogy(a: &GenealogyContext, b: &GenealogyContext) -> f64 {
    count_overlap(&a.type_counts, &b.type_counts).unwrap_or(0.0)
}

/// Dependency similarity; 1 when the target context is empty.
pub fn sim_dependency(a: &DependencyContext, b: &DependencyContext) -> f64 {
    count_overlap(&a.slice_counts, &b.slice_counts).unwrap_or(1.0)
}

/// Jaccard similarity over variable keys; 1 when both contexts are empty.
pub fn sim_variable(a: &VariableContext, b: &VariableContext) -> f64 {
    if a.var_counts.is_empty() && b.var_counts.is_empty() {
        return 1.0;
    }
    let intersection = a
        .var_counts
        .keys()
        .filter(|key| b.var_counts.contains_key(*key))
        .count();
    let union = a.var_counts.len() + b.var_counts.len() - intersection;
    if union == 0 {
        return 1.0;
    }
    intersection as f64 / union as f64
}

/// Similarity for a Replacement pairing.
pub fn replacement_similarity(ingredient: &SyntaxNode, target: &SyntaxNode) -> f64 {
    sim_genealogy(&ingredient.genealogy_context, &target.genealogy_context)
        * sim_dependency(&ingredient.dependency_context, &target.dependency_context)
        * sim_variable(&ingredient.variable_context, &target.variable_context)
}

/// Similarity for an Insertion pairing.
pub fn insertion_similarity(ingredient: &SyntaxNode, target: &SyntaxNode) -> f64 {
    sim_genealogy(&ingredient.genealogy_context, &target.genealogy_context)
        * sim_dependency(&ingredient.dependency_context, &target.dependency_context)
}

/// Similarity for a Deletion pairing: distance from the ingredient rather
/// than closeness. The degenerate self-pair (both measures 1.0) maps to 1.0
/// instead of collapsing to 0.
pub fn deletion_similarity(ingredient: &SyntaxNode, target: &SyntaxNode) -> f64 {
    let genealogy = sim_genealogy(&ingredient.genealogy_context, &target.genealogy_context);
    let dependency = sim_dependency(&ingredient.dependency_context, &target.dependency_context);
    if genealogy == 1.0 && dependency == 1.0 {
        return 1.0;
    }
    (1.0 - genealogy) * (1.0 - dependency)
}
