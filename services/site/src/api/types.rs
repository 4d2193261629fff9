//! HTTP API request/response types.
//!
//! # Purpose
//! Defines the payload shapes served to the site front end and the OpenAPI
//! schemas generated from them.
use crate::api::icons::IconId;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use wayfinder_nav::{Crumb, NavNode};

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct HealthStatus {
    pub status: String,
    pub storage: String,
    pub durable: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub request_id: Option<String>,
}

/// One node of the rendered menu.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone, PartialEq)]
pub struct MenuItem {
    pub id: String,
    pub kind: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<IconId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn from_node(node: &NavNode) -> Self {
        let meta = node.meta();
        let (href, target) = match node {
            NavNode::Link(link) => (Some(link.href.clone()), None),
            NavNode::External(external) => (
                Some(external.href.clone()),
                Some(external.target.clone().unwrap_or_else(|| "_blank".to_string())),
            ),
            NavNode::Persona(branch) | NavNode::Group(branch) => (branch.href.clone(), None),
        };
        Self {
            id: meta.id.clone(),
            kind: node.kind().as_str().to_string(),
            label: meta.label.clone(),
            href,
            target,
            icon: meta.icon.as_deref().and_then(IconId::lookup),
            badge: meta.badge.clone(),
            children: node.children().iter().map(MenuItem::from_node).collect(),
        }
    }
}

pub fn menu_items(tree: &[NavNode]) -> Vec<MenuItem> {
    tree.iter().map(MenuItem::from_node).collect()
}

#[derive(Debug, Default, Deserialize)]
pub struct MenuQuery {
    pub persona: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct MenuResponse {
    pub persona: String,
    pub items: Vec<MenuItem>,
}

#[derive(Debug, Default, Deserialize)]
pub struct BreadcrumbQuery {
    pub path: Option<String>,
    pub persona: Option<String>,
}

/// Caller-supplied crumb used by the POST form of the breadcrumb endpoint.
#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct CrumbInput {
    pub label: String,
    #[serde(default)]
    pub href: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BreadcrumbRequest {
    pub path: String,
    #[serde(default)]
    pub persona: Option<String>,
    /// Trail registered by the page; used when no forced trail is given.
    #[serde(default)]
    pub registered: Vec<CrumbInput>,
    /// Trail that wins over everything else.
    #[serde(default)]
    pub forced: Vec<CrumbInput>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct BreadcrumbResponse {
    pub persona: String,
    pub path: String,
    #[schema(value_type = Vec<Object>)]
    pub items: Vec<Crumb>,
    #[schema(value_type = Object)]
    pub json_ld: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateQuery {
    pub token: Option<String>,
    pub persona: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema, Clone)]
pub struct RevalidateResponse {
    pub ok: bool,
    pub revalidated: bool,
    pub persona: Option<String>,
    pub dropped: usize,
}
