//! Capability filtering of navigation trees.
//!
//! # Purpose
//! Prunes a raw persona tree down to what one request may see.
//!
//! # Key invariants
//! - Sibling order is preserved; checks for siblings run concurrently but
//!   results are reassembled in source order.
//! - A node with no required features is public.
//! - All of a node's required features must be allowed.
//! - A persona or group with no surviving children is dropped.
//! - Hidden nodes are dropped unless `keep_hidden` is set. The breadcrumb
//!   index is built from the `keep_hidden` tree and the visible navigation is
//!   derived from it with [`strip_hidden`].
//! - Filtering is idempotent for a fixed gate.
use crate::node::{NavBranch, NavNode};
use crate::FeatureGate;
use futures::future::{BoxFuture, FutureExt, join_all};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub keep_hidden: bool,
}

/// Filter `tree` for visible navigation.
pub async fn filter_tree(tree: &[NavNode], gate: &FeatureGate) -> Vec<NavNode> {
    filter_tree_with(tree, gate, FilterOptions::default()).await
}

pub async fn filter_tree_with(
    tree: &[NavNode],
    gate: &FeatureGate,
    options: FilterOptions,
) -> Vec<NavNode> {
    join_all(tree.iter().map(|node| filter_node(node, gate, options)))
        .await
        .into_iter()
        .flatten()
        .collect()
}

/// Filter one node, returning the rebuilt node or `None` when it is pruned.
pub fn filter_node<'a>(
    node: &'a NavNode,
    gate: &'a FeatureGate,
    options: FilterOptions,
) -> BoxFuture<'a, Option<NavNode>> {
    async move {
        if node.is_hidden() && !options.keep_hidden {
            return None;
        }
        if !requirements_met(node.features(), gate).await {
            return None;
        }
        match node {
            NavNode::Persona(branch) => filter_branch(branch, gate, options)
                .await
                .map(NavNode::Persona),
            NavNode::Group(branch) => filter_branch(branch, gate, options)
                .await
                .map(NavNode::Group),
            NavNode::Link(_) | NavNode::External(_) => Some(node.clone()),
        }
    }
    .boxed()
}

async fn requirements_met(features: &[String], gate: &FeatureGate) -> bool {
    join_all(features.iter().map(|feature| gate.allows(feature)))
        .await
        .into_iter()
        .all(|allowed| allowed)
}

async fn filter_branch(
    branch: &NavBranch,
    gate: &FeatureGate,
    options: FilterOptions,
) -> Option<NavBranch> {
    let children = filter_tree_with(&branch.children, gate, options).await;
    if children.is_empty() {
        return None;
    }
    Some(NavBranch {
        meta: branch.meta.clone(),
        href: branch.href.clone(),
        children,
    })
}

/// Remove hidden nodes and the parents they leave empty.
pub fn strip_hidden(tree: &[NavNode]) -> Vec<NavNode> {
    tree.iter().filter_map(strip_node).collect()
}

fn strip_node(node: &NavNode) -> Option<NavNode> {
    if node.is_hidden() {
        return None;
    }
    let rebuild = |branch: &NavBranch| {
        let children = strip_hidden(&branch.children);
        (!children.is_empty()).then(|| NavBranch {
            meta: branch.meta.clone(),
            href: branch.href.clone(),
            children,
        })
    };
    match node {
        NavNode::Persona(branch) => rebuild(branch).map(NavNode::Persona),
        NavNode::Group(branch) => rebuild(branch).map(NavNode::Group),
        NavNode::Link(_) | NavNode::External(_) => Some(node.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gate::tests::CountingAuthority;
    use crate::node::{NodeMeta, count_nodes};
    use crate::CapabilitySet;
    use std::sync::Arc;

    fn ids(tree: &[NavNode]) -> Vec<String> {
        let mut out = Vec::new();
        for node in tree {
            out.push(node.id().to_string());
            out.extend(ids(node.children()));
        }
        out
    }

    fn sample_tree() -> Vec<NavNode> {
        vec![NavNode::persona(
            NodeMeta::new("mark2", "Mark2"),
            Some("/mark2"),
            vec![
                NavNode::link(NodeMeta::new("docs", "Docs"), "/mark2/docs"),
                NavNode::group(
                    NodeMeta::new("admin", "Admin"),
                    None,
                    vec![
                        NavNode::link(
                            NodeMeta::new("users", "Users").with_feature("menu.mark2.admin"),
                            "/mark2/admin/users",
                        ),
                        NavNode::link(
                            NodeMeta::new("audit", "Audit").with_feature("menu.mark2.audit"),
                            "/mark2/admin/audit",
                        ),
                    ],
                ),
                NavNode::group(
                    NodeMeta::new("ops", "Ops"),
                    None,
                    vec![NavNode::link(
                        NodeMeta::new("deploys", "Deploys").with_feature("menu.ops"),
                        "/mark2/ops/deploys",
                    )],
                ),
                NavNode::link(NodeMeta::new("secret", "Secret").hidden(), "/mark2/secret"),
                NavNode::external(
                    NodeMeta::new("gh", "GitHub").with_feature("menu.mark2.admin"),
                    "https://github.com",
                    Some("_blank"),
                ),
            ],
        )]
    }

    fn gate(caps: &[&str], authority: Arc<CountingAuthority>) -> FeatureGate {
        FeatureGate::new(CapabilitySet::build(caps.iter().copied()), authority)
    }

    #[tokio::test]
    async fn prunes_by_capability_and_drops_empty_groups() {
        let authority = Arc::new(CountingAuthority::default());
        let gate = gate(&["menu.mark2.admin"], authority);
        let filtered = filter_tree(&sample_tree(), &gate).await;
        assert_eq!(ids(&filtered), ["mark2", "docs", "admin", "users", "gh"]);
    }

    #[tokio::test]
    async fn anonymous_users_see_public_nodes_only() {
        let authority = Arc::new(CountingAuthority::default());
        let gate = gate(&[], authority.clone());
        let filtered = filter_tree(&sample_tree(), &gate).await;
        assert_eq!(ids(&filtered), ["mark2", "docs"]);
        // Hidden nodes are pruned before any capability lookup.
        assert_eq!(authority.calls(), 3);
    }

    #[tokio::test]
    async fn repeated_features_resolve_once() {
        let authority = Arc::new(CountingAuthority::allowing(&["menu.mark2.admin"]));
        let gate = gate(&[], authority.clone());
        let filtered = filter_tree(&sample_tree(), &gate).await;
        assert_eq!(ids(&filtered), ["mark2", "docs", "admin", "users", "gh"]);
        assert_eq!(authority.calls(), 3);
    }

    #[tokio::test]
    async fn filtering_is_idempotent() {
        let authority = Arc::new(CountingAuthority::allowing(&["menu.ops"]));
        let gate = gate(&["menu.mark2.audit"], authority);
        let once = filter_tree(&sample_tree(), &gate).await;
        let twice = filter_tree(&once, &gate).await;
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn no_empty_parents_survive() {
        fn assert_no_empty_branches(tree: &[NavNode]) {
            for node in tree {
                if node.kind().is_branch() {
                    assert!(!node.children().is_empty(), "empty branch {}", node.id());
                }
                assert_no_empty_branches(node.children());
            }
        }
        let tree = vec![
            NavNode::group(NodeMeta::new("empty", "Empty"), None, Vec::new()),
            NavNode::group(
                NodeMeta::new("nested", "Nested"),
                None,
                vec![NavNode::group(
                    NodeMeta::new("inner", "Inner"),
                    None,
                    vec![NavNode::link(
                        NodeMeta::new("x", "X").with_feature("nope"),
                        "/x",
                    )],
                )],
            ),
        ];
        let gate = gate(&[], Arc::new(CountingAuthority::default()));
        for sample in [tree, sample_tree()] {
            let filtered = filter_tree(&sample, &gate).await;
            assert_no_empty_branches(&filtered);
        }
    }

    #[tokio::test]
    async fn gated_branch_prunes_whole_subtree() {
        let tree = vec![NavNode::group(
            NodeMeta::new("g", "G").with_feature("menu.g"),
            None,
            vec![NavNode::link(NodeMeta::new("l", "L"), "/l")],
        )];
        let gate = gate(&[], Arc::new(CountingAuthority::default()));
        assert!(filter_tree(&tree, &gate).await.is_empty());
    }

    #[tokio::test]
    async fn all_listed_features_are_required() {
        let meta = NodeMeta::new("l", "L")
            .with_feature("menu.a")
            .with_feature("menu.b");
        let tree = vec![NavNode::link(meta, "/l")];
        let partial = gate(&["menu.a"], Arc::new(CountingAuthority::default()));
        assert!(filter_tree(&tree, &partial).await.is_empty());
        let full = gate(&["menu.a", "menu.b"], Arc::new(CountingAuthority::default()));
        assert_eq!(filter_tree(&tree, &full).await.len(), 1);
    }

    #[tokio::test]
    async fn keep_hidden_then_strip_matches_direct_filter() {
        let gate = gate(&["menu.mark2.admin"], Arc::new(CountingAuthority::default()));
        let indexed = filter_tree_with(
            &sample_tree(),
            &gate,
            FilterOptions { keep_hidden: true },
        )
        .await;
        assert!(ids(&indexed).contains(&"secret".to_string()));
        let visible = strip_hidden(&indexed);
        assert_eq!(visible, filter_tree(&sample_tree(), &gate).await);
        assert_eq!(count_nodes(&visible) + 1, count_nodes(&indexed));
    }

    #[test]
    fn strip_hidden_drops_parents_left_empty() {
        let tree = vec![NavNode::group(
            NodeMeta::new("g", "G"),
            None,
            vec![NavNode::link(NodeMeta::new("h", "H").hidden(), "/h")],
        )];
        assert!(strip_hidden(&tree).is_empty());
    }
}
