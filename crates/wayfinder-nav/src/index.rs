//! Path-keyed view over a filtered navigation tree.
//!
//! # Purpose
//! Lets the breadcrumb builder find the node for a path in O(1) and walk its
//! ancestors without re-traversing the tree.
//!
//! # Key invariants
//! - Keys are hrefs normalized with the same alias table the builder uses.
//! - The first node in pre-order wins when two nodes share a key.
//! - External nodes are not indexed; they point off-site.
//! - An index is built per filter pass and never shared between requests.
use crate::node::{NavNode, NodeKind};
use crate::path::{LandingAliases, normalize_path_with};
use std::collections::HashMap;

#[derive(Debug, Clone)]
struct IndexedNode {
    label: String,
    href: Option<String>,
    kind: NodeKind,
    parent: Option<usize>,
}

/// One step of an ancestor chain, borrowed from the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexEntry<'a> {
    pub label: &'a str,
    pub href: Option<&'a str>,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default)]
pub struct MenuIndex {
    nodes: Vec<IndexedNode>,
    by_path: HashMap<String, usize>,
}

impl MenuIndex {
    pub fn build(tree: &[NavNode]) -> Self {
        Self::build_with(tree, &LandingAliases::default())
    }

    pub fn build_with(tree: &[NavNode], aliases: &LandingAliases) -> Self {
        let mut index = Self::default();
        index.insert_level(tree, None, aliases);
        index
    }

    fn insert_level(&mut self, level: &[NavNode], parent: Option<usize>, aliases: &LandingAliases) {
        for node in level {
            if node.kind() == NodeKind::External {
                continue;
            }
            let slot = self.nodes.len();
            self.nodes.push(IndexedNode {
                label: node.label().to_string(),
                href: node.href().map(str::to_string),
                kind: node.kind(),
                parent,
            });
            if let Some(href) = node.href() {
                self.by_path
                    .entry(normalize_path_with(href, aliases))
                    .or_insert(slot);
            }
            self.insert_level(node.children(), Some(slot), aliases);
        }
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.by_path.contains_key(normalized)
    }

    /// Ancestor chain for a normalized path, ordered root first.
    pub fn ancestry(&self, normalized: &str) -> Option<Vec<IndexEntry<'_>>> {
        let mut cursor = self.by_path.get(normalized).copied();
        let mut chain = Vec::new();
        while let Some(slot) = cursor {
            let node = &self.nodes[slot];
            chain.push(IndexEntry {
                label: &node.label,
                href: node.href.as_deref(),
                kind: node.kind,
            });
            cursor = node.parent;
        }
        if chain.is_empty() {
            return None;
        }
        chain.reverse();
        Some(chain)
    }

    /// Number of addressable paths.
    pub fn len(&self) -> usize {
        self.by_path.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_path.is_empty()
    }
}
