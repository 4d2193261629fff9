//! Assembly of flat menu rows into navigation trees.
//!
//! # Purpose
//! Stores persist menus as flat rows with parent references. This module turns
//! one persona's rows into an ordered [`NavNode`] forest.
//!
//! # Key invariants
//! - Siblings are ordered by `(order_index, id)`, never by row arrival order.
//! - Unpublished rows drop out together with their whole subtree unless the
//!   caller passes the preview bypass.
//! - Rows attached to a leaf, to a missing parent, or to an excluded parent
//!   are dropped, never re-parented.
//! - Blank feature keys mean the node is public.
use crate::errors::{NavError, NavResult};
use crate::node::{NavBranch, NavExternal, NavLink, NavNode, NodeKind, NodeMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

/// Flat persisted shape of one menu node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuRow {
    pub id: String,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub persona: String,
    pub kind: String,
    pub label: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub target: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order_index: i32,
    #[serde(default)]
    pub feature_key: Option<String>,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub meta: Option<Value>,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

impl MenuRow {
    pub fn new(id: &str, parent_id: Option<&str>, persona: &str, kind: NodeKind, label: &str) -> Self {
        Self {
            id: id.to_string(),
            parent_id: parent_id.map(str::to_string),
            persona: persona.to_string(),
            kind: kind.as_str().to_string(),
            label: label.to_string(),
            href: None,
            target: None,
            icon: None,
            order_index: 0,
            feature_key: None,
            hidden: false,
            meta: None,
            published: true,
        }
    }

    pub fn with_href(mut self, href: &str) -> Self {
        self.href = Some(href.to_string());
        self
    }

    pub fn with_order(mut self, order_index: i32) -> Self {
        self.order_index = order_index;
        self
    }

    pub fn with_feature(mut self, feature_key: &str) -> Self {
        self.feature_key = Some(feature_key.to_string());
        self
    }

    pub fn with_hidden(mut self, hidden: bool) -> Self {
        self.hidden = hidden;
        self
    }

    pub fn with_published(mut self, published: bool) -> Self {
        self.published = published;
        self
    }
}

struct ParsedRow<'a> {
    row: &'a MenuRow,
    kind: NodeKind,
}

/// Build the navigation forest for one persona's rows.
///
/// # Errors
/// - [`NavError::UnknownKind`] for an unrecognised `kind` column.
/// - [`NavError::MissingHref`] for a link or external row without an href.
/// - [`NavError::DuplicateId`] when two rows share an id.
pub fn assemble_tree(rows: &[MenuRow], include_unpublished: bool) -> NavResult<Vec<NavNode>> {
    let mut seen = HashSet::new();
    let mut kept: Vec<ParsedRow<'_>> = Vec::with_capacity(rows.len());
    for row in rows {
        if !seen.insert(row.id.as_str()) {
            return Err(NavError::DuplicateId(row.id.clone()));
        }
        let kind = row
            .kind
            .parse::<NodeKind>()
            .map_err(|kind| NavError::UnknownKind {
                id: row.id.clone(),
                kind,
            })?;
        if !kind.is_branch() && row.href.as_deref().is_none_or(|href| href.trim().is_empty()) {
            return Err(NavError::MissingHref(row.id.clone()));
        }
        if row.published || include_unpublished {
            kept.push(ParsedRow { row, kind });
        }
    }

    let mut by_parent: HashMap<Option<&str>, Vec<&ParsedRow<'_>>> = HashMap::new();
    for parsed in &kept {
        by_parent
            .entry(parsed.row.parent_id.as_deref())
            .or_default()
            .push(parsed);
    }
    for siblings in by_parent.values_mut() {
        siblings.sort_by(|a, b| {
            a.row
                .order_index
                .cmp(&b.row.order_index)
                .then_with(|| a.row.id.cmp(&b.row.id))
        });
    }

    let mut visited = HashSet::new();
    let forest = build_level(None, &by_parent, &mut visited);

    for parsed in &kept {
        if visited.contains(parsed.row.id.as_str()) {
            continue;
        }
        match parsed.row.parent_id.as_deref() {
            Some(parent) if seen.contains(parent) => {
                tracing::debug!(id = %parsed.row.id, parent, "menu node excluded with its parent");
            }
            parent => {
                tracing::warn!(id = %parsed.row.id, ?parent, "dropping orphaned menu node");
            }
        }
    }
    Ok(forest)
}

fn build_level<'a>(
    parent: Option<&'a str>,
    by_parent: &HashMap<Option<&'a str>, Vec<&'a ParsedRow<'a>>>,
    visited: &mut HashSet<&'a str>,
) -> Vec<NavNode> {
    let Some(siblings) = by_parent.get(&parent) else {
        return Vec::new();
    };
    let mut nodes = Vec::with_capacity(siblings.len());
    for parsed in siblings {
        let row = parsed.row;
        if !visited.insert(row.id.as_str()) {
            continue;
        }
        let meta = node_meta(row);
        let node = match parsed.kind {
            NodeKind::Persona | NodeKind::Group => {
                let branch = NavBranch {
                    meta,
                    href: non_blank(row.href.as_deref()),
                    children: build_level(Some(row.id.as_str()), by_parent, visited),
                };
                if parsed.kind == NodeKind::Persona {
                    NavNode::Persona(branch)
                } else {
                    NavNode::Group(branch)
                }
            }
            NodeKind::Link | NodeKind::External => {
                if let Some(children) = by_parent.get(&Some(row.id.as_str())) {
                    for child in children {
                        visited.insert(child.row.id.as_str());
                        tracing::warn!(
                            id = %child.row.id,
                            parent = %row.id,
                            "dropping menu node attached to a leaf"
                        );
                    }
                }
                let href = row.href.clone().unwrap_or_default();
                if parsed.kind == NodeKind::Link {
                    NavNode::Link(NavLink { meta, href })
                } else {
                    NavNode::External(NavExternal {
                        meta,
                        href,
                        target: non_blank(row.target.as_deref()),
                    })
                }
            }
        };
        nodes.push(node);
    }
    nodes
}

fn node_meta(row: &MenuRow) -> NodeMeta {
    NodeMeta {
        id: row.id.clone(),
        label: row.label.clone(),
        icon: non_blank(row.icon.as_deref()),
        badge: row
            .meta
            .as_ref()
            .and_then(|meta| meta.get("badge"))
            .and_then(Value::as_str)
            .and_then(|badge| non_blank(Some(badge))),
        features: non_blank(row.feature_key.as_deref()).into_iter().collect(),
        hidden: row.hidden,
    }
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_rows() -> Vec<MenuRow> {
        vec![
            MenuRow::new("mark2", None, "mark2", NodeKind::Persona, "Mark2").with_href("/mark2"),
            MenuRow::new("admin", Some("mark2"), "mark2", NodeKind::Group, "Admin")
                .with_order(20)
                .with_feature("menu.mark2.admin"),
            MenuRow::new("users", Some("admin"), "mark2", NodeKind::Link, "Users")
                .with_href("/mark2/admin/users"),
            MenuRow::new("docs", Some("mark2"), "mark2", NodeKind::Link, "Docs")
                .with_href("/mark2/docs")
                .with_order(10),
            MenuRow::new("draft", Some("mark2"), "mark2", NodeKind::Group, "Drafts")
                .with_order(5)
                .with_published(false),
            MenuRow::new("draft-1", Some("draft"), "mark2", NodeKind::Link, "Draft 1")
                .with_href("/mark2/drafts/1"),
        ]
    }

    #[test]
    fn orders_siblings_and_drops_unpublished_subtrees() {
        let tree = assemble_tree(&sample_rows(), false).expect("assemble");
        assert_eq!(tree.len(), 1);
        let ids: Vec<&str> = tree[0].children().iter().map(NavNode::id).collect();
        assert_eq!(ids, ["docs", "admin"]);
        assert_eq!(tree[0].children()[1].features(), ["menu.mark2.admin"]);
    }

    #[test]
    fn preview_bypass_keeps_unpublished_rows() {
        let tree = assemble_tree(&sample_rows(), true).expect("assemble");
        let ids: Vec<&str> = tree[0].children().iter().map(NavNode::id).collect();
        assert_eq!(ids, ["draft", "docs", "admin"]);
        assert_eq!(tree[0].children()[0].children()[0].id(), "draft-1");
    }

    #[test]
    fn order_ties_break_on_id() {
        let rows = vec![
            MenuRow::new("b", None, "p", NodeKind::Link, "B").with_href("/b"),
            MenuRow::new("a", None, "p", NodeKind::Link, "A").with_href("/a"),
        ];
        let tree = assemble_tree(&rows, false).expect("assemble");
        let ids: Vec<&str> = tree.iter().map(NavNode::id).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn drops_children_of_leaves_and_orphans() {
        let rows = vec![
            MenuRow::new("leaf", None, "p", NodeKind::Link, "Leaf").with_href("/leaf"),
            MenuRow::new("under-leaf", Some("leaf"), "p", NodeKind::Link, "X").with_href("/x"),
            MenuRow::new("orphan", Some("ghost"), "p", NodeKind::Link, "Y").with_href("/y"),
        ];
        let tree = assemble_tree(&rows, false).expect("assemble");
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id(), "leaf");
        assert!(tree[0].children().is_empty());
    }

    #[test]
    fn rejects_bad_rows() {
        let unknown = vec![MenuRow {
            kind: "folder".to_string(),
            ..MenuRow::new("x", None, "p", NodeKind::Group, "X")
        }];
        assert!(matches!(
            assemble_tree(&unknown, false),
            Err(NavError::UnknownKind { .. })
        ));

        let no_href = vec![MenuRow::new("x", None, "p", NodeKind::Link, "X").with_href("  ")];
        assert!(matches!(
            assemble_tree(&no_href, false),
            Err(NavError::MissingHref(_))
        ));

        let dupes = vec![
            MenuRow::new("x", None, "p", NodeKind::Group, "X"),
            MenuRow::new("x", None, "p", NodeKind::Group, "X"),
        ];
        assert!(matches!(
            assemble_tree(&dupes, false),
            Err(NavError::DuplicateId(_))
        ));
    }

    #[test]
    fn maps_meta_badge_icon_and_blank_features() {
        let rows = vec![MenuRow {
            icon: Some(" book ".to_string()),
            meta: Some(json!({ "badge": "new" })),
            feature_key: Some("   ".to_string()),
            target: Some("_blank".to_string()),
            ..MenuRow::new("ext", None, "p", NodeKind::External, "Ext").with_href("https://x.dev")
        }];
        let tree = assemble_tree(&rows, false).expect("assemble");
        let meta = tree[0].meta();
        assert_eq!(meta.icon.as_deref(), Some("book"));
        assert_eq!(meta.badge.as_deref(), Some("new"));
        assert!(meta.features.is_empty());
        match &tree[0] {
            NavNode::External(external) => assert_eq!(external.target.as_deref(), Some("_blank")),
            other => panic!("unexpected node: {other:?}"),
        }
    }
}
