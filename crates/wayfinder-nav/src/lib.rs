//! Wayfinder navigation primitives shared by the site service and its tools.
//!
//! # Purpose
//! Centralizes the per-request navigation pipeline: capability snapshots,
//! feature gating with an authority fallback, menu tree assembly and
//! filtering, path normalization, and breadcrumb derivation.
//!
//! # How it fits
//! The site service loads raw persona trees through a [`MenuTreeSource`],
//! builds a [`FeatureGate`] from the caller's session, filters the tree, and
//! derives navigation plus breadcrumbs from the filtered result. Nothing in
//! this crate performs I/O on its own; stores and authorities are injected.
//!
//! # Key invariants
//! - A filtered tree never contains a node the gate denied.
//! - A breadcrumb trail has exactly one `root` crumb and it comes first.
//! - Gate decisions live for one request only.
//!
//! # Examples
//! ```rust
//! use std::sync::Arc;
//! use wayfinder_nav::{
//!     CapabilitySet, DenyAllAuthority, FeatureGate, MenuIndex, NavNode, NodeMeta,
//!     filter_tree, get_breadcrumbs,
//! };
//!
//! # tokio_test_block(async {
//! let tree = vec![NavNode::persona(
//!     NodeMeta::new("mark2", "Mark2"),
//!     Some("/mark2"),
//!     vec![NavNode::link(
//!         NodeMeta::new("users", "Users").with_feature("menu.admin"),
//!         "/mark2/users",
//!     )],
//! )];
//! let gate = FeatureGate::new(CapabilitySet::build(["menu.admin"]), Arc::new(DenyAllAuthority));
//! let visible = filter_tree(&tree, &gate).await;
//! let crumbs = get_breadcrumbs("/mark2/users/", &MenuIndex::build(&visible));
//! assert_eq!(crumbs.len(), 3);
//! assert_eq!(crumbs[2].label, "Users");
//! # });
//! # fn tokio_test_block<F: std::future::Future>(fut: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(fut)
//! # }
//! ```
//!
//! # Common pitfalls
//! - Building the breadcrumb index from the hidden-stripped tree loses trails
//!   for pages that are reachable but not listed; index the `keep_hidden` pass.
//! - Reusing a gate across requests leaks one user's decisions to another.

mod breadcrumb;
mod capability;
mod errors;
mod filter;
mod gate;
mod index;
mod node;
mod path;
mod source;
mod tree;

pub use breadcrumb::{
    BreadcrumbOptions, Crumb, CrumbKind, HOME_HREF, HOME_LABEL, breadcrumb_json_ld,
    ensure_single_home, get_breadcrumbs, get_breadcrumbs_with, humanize_segment,
};
pub use capability::CapabilitySet;
pub use errors::{AuthorityError, AuthorityResult, NavError, NavResult};
pub use filter::{FilterOptions, filter_node, filter_tree, filter_tree_with, strip_hidden};
pub use gate::{CapabilityAuthority, DenyAllAuthority, FeatureGate};
pub use index::{IndexEntry, MenuIndex};
pub use node::{NavBranch, NavExternal, NavLink, NavNode, NodeKind, NodeMeta, count_nodes};
pub use path::{
    DEFAULT_LANDING_ALIASES, LandingAliases, canonical_path, encode_path_segment,
    normalize_path_for_crumbs, normalize_path_with, path_segments,
};
pub use source::{MenuTreeSource, StaticMenuSource};
pub use tree::{MenuRow, assemble_tree};
