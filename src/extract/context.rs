//! Context extraction for syntax nodes.
//!
//! The three contexts follow the CapGen model: genealogy (ancestor and
//! sibling node types), variables (identifiers reachable inside the node),
//! and dependencies (backward/forward slices over definition and use sites
//! of those variables).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tree_sitter::Node;

/// Node-type counts over ancestors up to the enclosing method plus siblings
/// inside the nearest block.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenealogyContext {
    pub type_counts: BTreeMap<String, u32>,
}

/// Variables appearing transitively inside a node, keyed `"<type>#<name>"`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableContext {
    pub var_counts: BTreeMap<String, u32>,
}

impl VariableContext {
    /// Bare variable names, with the node-type prefix stripped.
    pub fn names(&self) -> Vec<&str> {
        self.var_counts
            .keys()
            .filter_map(|key| key.split_once('#').map(|(_, name)| name))
            .collect()
    }
}

/// Node-type counts over the backward and forward slices of a node's
/// variables.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyContext {
    pub slice_counts: BTreeMap<String, u32>,
}

/// Node types that introduce or redefine a variable.
const DEFINITION_KINDS: [&str; 4] = [
    "init_declarator",
    "declaration",
    "assignment_expression",
    "field_initializer",
];

fn node_text<'a>(node: Node<'_>, source: &'a [u8]) -> &'a str {
    node.utf8_text(source).unwrap_or("")
}

/// Count ancestor node types from the node's parent up to and including the
/// enclosing `method_definition`, skipping `block` nodes.
fn ancestor_types(node: Node<'_>) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    let mut current = node;
    while current.kind() != "method_definition" {
        let Some(parent) = current.parent() else {
            break;
        };
        current = parent;
        if current.kind() != "block" {
            *counts.entry(current.kind().to_string()).or_insert(0) += 1;
        }
    }
    counts
}

/// Count the named children of the nearest enclosing `block`.
fn sibling_types(node: Node<'_>) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    let mut parent = node.parent();
    while let Some(p) = parent {
        if p.kind() == "block" {
            let mut cursor = p.walk();
            for child in p.named_children(&mut cursor) {
                *counts.entry(child.kind().to_string()).or_insert(0) += 1;
            }
            break;
        }
        parent = p.parent();
    }
    counts
}

/// Build the genealogy context: ancestor types merged with sibling types.
pub fn genealogy_context(node: Node<'_>) -> GenealogyContext {
    let mut type_counts = ancestor_types(node);
    for (kind, count) in sibling_types(node) {
        *type_counts.entry(kind).or_insert(0) += count;
    }
    GenealogyContext { type_counts }
}

/// Collect every `identifier` / `field_identifier` inside the node, once
/// each.
pub fn variable_context(node: Node<'_>, source: &[u8]) -> VariableContext {
    let mut context = VariableContext::default();
    let mut stack = vec![node];

    while let Some(current) = stack.pop() {
        if current.is_named() {
            let kind = current.kind();
            if kind == "identifier" || kind == "field_identifier" {
                let key = format!("{}#{}", kind, node_text(current, source));
                context.var_counts.entry(key).or_insert(1);
            }
        }
        for i in 0..current.named_child_count() {
            if let Some(child) = current.named_child(i) {
                stack.push(child);
            }
        }
    }
    context
}

/// Climb from `node` to the nearest ancestor whose kind contains one of the
/// given fragments; falls back to `node` itself when none exists.
fn enclosing_with_kind<'t>(node: Node<'t>, fragments: &[&str]) -> Node<'t> {
    let mut current = node;
    loop {
        let kind = current.kind();
        if fragments.iter().any(|f| kind.contains(f)) {
            return current;
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return node,
        }
    }
}

fn count_named_children(node: Node<'_>, counts: &mut BTreeMap<String, u32>) {
    let mut cursor = node.walk();
    for child in node.named_children(&mut cursor) {
        *counts.entry(child.kind().to_string()).or_insert(0) += 1;
    }
}

/// Backward slice: definition sites of the node's variables that start at or
/// before the node's end byte.
///
/// Sites are counted once per variable they define, so a declaration
/// covering two tracked variables contributes twice.
pub fn backward_slice(target: Node<'_>, root: Node<'_>, source: &[u8]) -> DependencyContext {
    let variables = variable_context(target, source);
    let names: Vec<&str> = variables.names();
    let mut context = DependencyContext::default();

    let limit = target.end_byte();
    for name in &names {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if DEFINITION_KINDS.contains(&current.kind()) && defines_name(current, name, limit, source)
            {
                let site =
                    enclosing_with_kind(current, &["statement", "expression", "declaration"]);
                count_named_children(site, &mut context.slice_counts);
            }
            for i in 0..current.named_child_count() {
                if let Some(child) = current.named_child(i) {
                    stack.push(child);
                }
            }
        }
    }
    context
}

/// Whether a definition node has a direct `identifier` child naming `name`
/// at or before the byte limit.
fn defines_name(node: Node<'_>, name: &str, limit: usize, source: &[u8]) -> bool {
    for i in 0..node.named_child_count() {
        let Some(child) = node.named_child(i) else {
            continue;
        };
        if child.kind() == "identifier"
            && child.start_byte() <= limit
            && node_text(child, source) == name
        {
            return true;
        }
    }
    false
}

/// Forward slice: uses of the node's variables that start at or after the
/// node's start byte, counted at their enclosing statement/expression.
pub fn forward_slice(target: Node<'_>, root: Node<'_>, source: &[u8]) -> DependencyContext {
    let variables = variable_context(target, source);
    let names: Vec<&str> = variables.names();
    let mut context = DependencyContext::default();

    let origin = target.start_byte();
    for name in &names {
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if current.is_named()
                && current.kind() == "identifier"
                && current.start_byte() >= origin
                && node_text(current, source) == *name
            {
                if let Some(parent) = current.parent() {
                    let site = enclosing_with_kind(parent, &["statement", "expression"]);
                    count_named_children(site, &mut context.slice_counts);
                }
            }
            for i in 0..current.named_child_count() {
                if let Some(child) = current.named_child(i) {
                    stack.push(child);
                }
            }
        }
    }
    context
}

/// Merge the backward and forward slices additively.
pub fn dependency_context(target: Node<'_>, root: Node<'_>, source: &[u8]) -> DependencyContext {
    let mut back = backward_slice(target, root, source);
    let forward = forward_slice(target, root, source);
    for (kind, count) in forward.slice_counts {
        *back.slice_counts.entry(kind).or_insert(0) += count;
    }
    back
}
