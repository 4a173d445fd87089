//! AST node extraction.
//!
//! Walks every parsed source file once and copies each named node into an
//! owned [`SyntaxNode`] record carrying its genealogy, variable, and
//! dependency contexts plus the suspiciousness score inherited from SBFL.
//! Every node is extracted, not only suspicious ones: any node may later
//! serve as a fix ingredient.

pub mod context;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::{byte_of_line, Result, SuspiciousLocation};
use crate::parser::{ParsedFile, Parser};

pub use context::{DependencyContext, GenealogyContext, VariableContext};

/// An owned syntax tree node with its extraction-time contexts.
///
/// Invariant: `source_text` equals the file slice `[start_byte, end_byte)`,
/// and the contexts are computed once here and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyntaxNode {
    /// Unique id within a run (`node_N`, monotonic across files).
    pub node_id: String,
    /// Concrete-syntax type tag, passed through verbatim.
    pub node_type: String,
    /// Path of the file the node was extracted from.
    pub file_path: String,
    /// 1-indexed start line.
    pub start_line: u32,
    /// 1-indexed end line.
    pub end_line: u32,
    /// 1-indexed start column.
    pub start_column: u32,
    /// 1-indexed end column.
    pub end_column: u32,
    /// Byte offset of the first byte.
    pub start_byte: usize,
    /// Byte offset one past the last byte.
    pub end_byte: usize,
    /// Byte-exact source slice.
    pub source_text: String,
    /// Score inherited from the SBFL entry covering this node; 0 if none.
    pub suspiciousness_score: f64,
    pub genealogy_context: GenealogyContext,
    pub variable_context: VariableContext,
    pub dependency_context: DependencyContext,
}

impl SyntaxNode {
    /// Whether this node is a mutation target.
    pub fn is_suspicious(&self) -> bool {
        self.suspiciousness_score > 0.0
    }

    /// Whether the node's text fits on a single source line.
    pub fn is_single_line(&self) -> bool {
        !self.source_text.contains('\n')
    }
}

/// Extracts [`SyntaxNode`] records from source files.
pub struct Extractor {
    parser: Parser,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

impl Extractor {
    pub fn new() -> Self {
        Self {
            parser: Parser::new(),
        }
    }

    /// Extract all named nodes from the given files.
    ///
    /// Files that cannot be read or parsed are skipped with a warning;
    /// extraction continues with the rest. The returned node set does not
    /// depend on `locations` — only the attached scores do.
    pub fn extract(
        &self,
        source_files: &[String],
        locations: &[SuspiciousLocation],
    ) -> Result<Vec<SyntaxNode>> {
        let mut nodes = Vec::new();
        let mut counter = 0u64;

        for path in source_files {
            // Unreadable and unparsable files alike are skipped; the rest of
            // the tree still yields ingredients.
            let parsed = match self.parser.parse_file(path) {
                Ok(parsed) => parsed,
                Err(err) => {
                    warn!(target: "extract", file = %path, error = %err, "skipping file");
                    continue;
                }
            };

            let sus_lines = suspicious_lines(path, parsed.source(), locations);
            let before = nodes.len();
            extract_from_tree(&parsed, path, &sus_lines, &mut counter, &mut nodes);
            debug!(
                target: "extract",
                file = %path,
                nodes = nodes.len() - before,
                "extracted nodes"
            );
        }

        Ok(nodes)
    }
}

/// Resolve the SBFL entries for one file to (line, score) pairs.
///
/// Location paths are repository-relative; a source path matches when it
/// ends with the location path (or vice versa for already-relative inputs).
/// Lines past the end of the file are clamped by resolving them through the
/// byte offset of the final byte.
fn suspicious_lines(
    path: &str,
    content: &[u8],
    locations: &[SuspiciousLocation],
) -> Vec<(u32, f64)> {
    locations
        .iter()
        .filter(|loc| path.ends_with(&loc.file_path) || loc.file_path.ends_with(path))
        .map(|loc| {
            let byte = byte_of_line(content, loc.line_number);
            (line_of_byte(content, byte), loc.suspiciousness_score)
        })
        .collect()
}

/// 1-indexed line containing the given byte offset.
fn line_of_byte(content: &[u8], byte: usize) -> u32 {
    let newlines = content[..byte.min(content.len())]
        .iter()
        .filter(|b| **b == b'\n')
        .count();
    newlines as u32 + 1
}

/// Depth-first walk emitting every named node except the translation-unit
/// root and preprocessor includes.
fn extract_from_tree(
    parsed: &ParsedFile,
    path: &str,
    sus_lines: &[(u32, f64)],
    counter: &mut u64,
    out: &mut Vec<SyntaxNode>,
) {
    let root = parsed.root();
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        if node.is_named() && node.kind() != "translation_unit" && node.kind() != "preproc_include"
        {
            out.push(build_node(parsed, node, root, path, sus_lines, counter));
        }
        // Push in reverse so nodes come out in source order.
        for i in (0..node.child_count()).rev() {
            if let Some(child) = node.child(i) {
                stack.push(child);
            }
        }
    }
}

fn build_node(
    parsed: &ParsedFile,
    node: tree_sitter::Node<'_>,
    root: tree_sitter::Node<'_>,
    path: &str,
    sus_lines: &[(u32, f64)],
    counter: &mut u64,
) -> SyntaxNode {
    let start_byte = node.start_byte();
    let end_byte = node.end_byte();
    let start = node.start_position();
    let end = node.end_position();
    let start_line = start.row as u32 + 1;
    let end_line = end.row as u32 + 1;

    // A node inherits the highest score among SBFL entries whose line falls
    // inside its line range.
    let score = sus_lines
        .iter()
        .filter(|(line, _)| start_line <= *line && *line <= end_line)
        .map(|(_, score)| *score)
        .fold(0.0, f64::max);

    let node_id = format!("node_{}", *counter);
    *counter += 1;

    SyntaxNode {
        node_id,
        node_type: node.kind().to_string(),
        file_path: path.to_string(),
        start_line,
        end_line,
        start_column: start.column as u32 + 1,
        end_column: end.column as u32 + 1,
        start_byte,
        end_byte,
        source_text: parsed.text_of(&node).to_string(),
        suspiciousness_score: score,
        genealogy_context: context::genealogy_context(node),
        variable_context: context::variable_context(node, parsed.source()),
        dependency_context: context::dependency_context(node, root, parsed.source()),
    }
}
