//! Navigation tree model.
//!
//! # Purpose
//! Defines the four node kinds of a persona-scoped navigation tree and the
//! attributes shared between them.
//!
//! # Key invariants
//! - Only `persona` and `group` nodes carry children; `link` and `external`
//!   nodes are leaves by construction.
//! - Nodes are never mutated after assembly; filtering builds new trees.
//! - `icon` is an opaque identifier. Resolving it is a presentation concern.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    Persona,
    Group,
    Link,
    External,
}

impl NodeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeKind::Persona => "persona",
            NodeKind::Group => "group",
            NodeKind::Link => "link",
            NodeKind::External => "external",
        }
    }

    /// Whether nodes of this kind may hold children.
    pub fn is_branch(&self) -> bool {
        matches!(self, NodeKind::Persona | NodeKind::Group)
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NodeKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "persona" => Ok(NodeKind::Persona),
            "group" => Ok(NodeKind::Group),
            "link" => Ok(NodeKind::Link),
            "external" => Ok(NodeKind::External),
            other => Err(other.to_string()),
        }
    }
}

fn is_false(value: &bool) -> bool {
    !*value
}

/// Attributes every node carries regardless of kind.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeMeta {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    /// Capabilities that must all be granted for the node to be visible.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub features: Vec<String>,
    #[serde(default, skip_serializing_if = "is_false")]
    pub hidden: bool,
}

impl NodeMeta {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            ..Self::default()
        }
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        self.features.push(feature.into());
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavBranch {
    #[serde(flatten)]
    pub meta: NodeMeta,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default)]
    pub children: Vec<NavNode>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavLink {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub href: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavExternal {
    #[serde(flatten)]
    pub meta: NodeMeta,
    pub href: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// One entry of a navigation tree.
///
/// Serialized with an internal `kind` tag, so a link renders as
/// `{"kind":"link","id":"..","label":"..","href":".."}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum NavNode {
    Persona(NavBranch),
    Group(NavBranch),
    Link(NavLink),
    External(NavExternal),
}

impl NavNode {
    pub fn persona(meta: NodeMeta, href: Option<&str>, children: Vec<NavNode>) -> Self {
        NavNode::Persona(NavBranch {
            meta,
            href: href.map(str::to_string),
            children,
        })
    }

    pub fn group(meta: NodeMeta, href: Option<&str>, children: Vec<NavNode>) -> Self {
        NavNode::Group(NavBranch {
            meta,
            href: href.map(str::to_string),
            children,
        })
    }

    pub fn link(meta: NodeMeta, href: impl Into<String>) -> Self {
        NavNode::Link(NavLink {
            meta,
            href: href.into(),
        })
    }

    pub fn external(meta: NodeMeta, href: impl Into<String>, target: Option<&str>) -> Self {
        NavNode::External(NavExternal {
            meta,
            href: href.into(),
            target: target.map(str::to_string),
        })
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            NavNode::Persona(_) => NodeKind::Persona,
            NavNode::Group(_) => NodeKind::Group,
            NavNode::Link(_) => NodeKind::Link,
            NavNode::External(_) => NodeKind::External,
        }
    }

    pub fn meta(&self) -> &NodeMeta {
        match self {
            NavNode::Persona(branch) | NavNode::Group(branch) => &branch.meta,
            NavNode::Link(link) => &link.meta,
            NavNode::External(external) => &external.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    pub fn label(&self) -> &str {
        &self.meta().label
    }

    pub fn href(&self) -> Option<&str> {
        match self {
            NavNode::Persona(branch) | NavNode::Group(branch) => branch.href.as_deref(),
            NavNode::Link(link) => Some(&link.href),
            NavNode::External(external) => Some(&external.href),
        }
    }

    /// Children of a branch; always empty for leaves.
    pub fn children(&self) -> &[NavNode] {
        match self {
            NavNode::Persona(branch) | NavNode::Group(branch) => &branch.children,
            NavNode::Link(_) | NavNode::External(_) => &[],
        }
    }

    pub fn features(&self) -> &[String] {
        &self.meta().features
    }

    pub fn is_hidden(&self) -> bool {
        self.meta().hidden
    }
}

/// Count every node in a forest, branches included.
pub fn count_nodes(tree: &[NavNode]) -> usize {
    tree.iter()
        .map(|node| 1 + count_nodes(node.children()))
        .sum()
}
