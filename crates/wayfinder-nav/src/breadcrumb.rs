//! Breadcrumb trail derivation.
//!
//! # Purpose
//! Turns the current request path into an ordered trail of crumbs using the
//! request's menu index, with a path-segment fallback for pages the menu does
//! not list.
//!
//! # Key invariants
//! - Every trail starts with exactly one `root` crumb labelled "Home".
//! - The last crumb never carries an href; a derived last crumb is always
//!   `leaf`, even after Home-like crumbs were collapsed away.
//! - Trail sources are tried in order: forced crumbs, registered crumbs, a
//!   menu index match, then URL segments.
//! - The builder is pure: the same path, index and options give the same
//!   trail.
use crate::index::MenuIndex;
use crate::path::{LandingAliases, encode_path_segment, normalize_path_with, path_segments};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

pub const HOME_LABEL: &str = "Home";
pub const HOME_HREF: &str = "/";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrumbKind {
    Root,
    Segment,
    Leaf,
    Registered,
    Forced,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Crumb {
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub href: Option<String>,
    pub kind: CrumbKind,
}

impl Crumb {
    pub fn new(label: impl Into<String>, href: Option<&str>, kind: CrumbKind) -> Self {
        Self {
            label: label.into(),
            href: href.map(str::to_string),
            kind,
        }
    }

    pub fn home() -> Self {
        Self::new(HOME_LABEL, Some(HOME_HREF), CrumbKind::Root)
    }

    fn is_home(&self) -> bool {
        self.kind == CrumbKind::Root || self.label.trim().eq_ignore_ascii_case("home")
    }
}

/// Page-level inputs that shape a trail beyond the path itself.
#[derive(Debug, Clone, Default)]
pub struct BreadcrumbOptions {
    /// Crumbs a page registered for itself; replace the derived trail.
    pub registered: Vec<Crumb>,
    /// Externally injected crumbs; bypass every other source.
    pub forced: Vec<Crumb>,
    pub aliases: LandingAliases,
}

pub fn get_breadcrumbs(pathname: &str, index: &MenuIndex) -> Vec<Crumb> {
    get_breadcrumbs_with(pathname, index, &BreadcrumbOptions::default())
}

pub fn get_breadcrumbs_with(
    pathname: &str,
    index: &MenuIndex,
    options: &BreadcrumbOptions,
) -> Vec<Crumb> {
    let path = normalize_path_with(pathname, &options.aliases);
    let trail = if !options.forced.is_empty() {
        retag(&options.forced, CrumbKind::Forced)
    } else if !options.registered.is_empty() {
        retag(&options.registered, CrumbKind::Registered)
    } else if let Some(chain) = index.ancestry(&path) {
        let mut trail: Vec<Crumb> = chain
            .iter()
            .map(|entry| Crumb::new(entry.label, entry.href, CrumbKind::Segment))
            .collect();
        mark_leaf(&mut trail);
        trail
    } else {
        segment_trail(&path)
    };

    let mut crumbs = ensure_single_home(trail);
    if let Some(last) = crumbs.last_mut() {
        last.href = None;
        if matches!(last.kind, CrumbKind::Segment) {
            last.kind = CrumbKind::Leaf;
        }
    }
    crumbs
}

/// Collapse every Home-like crumb into one canonical root crumb at the front.
pub fn ensure_single_home(crumbs: Vec<Crumb>) -> Vec<Crumb> {
    let mut trail = Vec::with_capacity(crumbs.len() + 1);
    trail.push(Crumb::home());
    trail.extend(crumbs.into_iter().filter(|crumb| !crumb.is_home()));
    trail
}

fn retag(crumbs: &[Crumb], kind: CrumbKind) -> Vec<Crumb> {
    crumbs
        .iter()
        .map(|crumb| Crumb {
            kind: if crumb.is_home() { CrumbKind::Root } else { kind },
            ..crumb.clone()
        })
        .collect()
}

fn mark_leaf(trail: &mut [Crumb]) {
    if let Some(last) = trail.last_mut() {
        last.kind = CrumbKind::Leaf;
    }
}

fn segment_trail(path: &str) -> Vec<Crumb> {
    let mut href = String::new();
    let mut trail: Vec<Crumb> = path_segments(path)
        .into_iter()
        .map(|segment| {
            href.push('/');
            href.push_str(&encode_path_segment(segment));
            Crumb::new(humanize_segment(segment), Some(&href), CrumbKind::Segment)
        })
        .collect();
    mark_leaf(&mut trail);
    trail
}

/// Best-effort label for a raw URL segment: `blog-posts` → `Blog Posts`.
pub fn humanize_segment(segment: &str) -> String {
    segment
        .split(|ch: char| matches!(ch, '-' | '_' | '+') || ch.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Render a trail as a schema.org `BreadcrumbList` document.
///
/// Relative hrefs are joined onto `base_url`; crumbs without an href omit
/// `item`.
pub fn breadcrumb_json_ld(crumbs: &[Crumb], base_url: &str) -> Value {
    let base = base_url.trim_end_matches('/');
    let items: Vec<Value> = crumbs
        .iter()
        .enumerate()
        .map(|(position, crumb)| {
            let mut item = json!({
                "@type": "ListItem",
                "position": position + 1,
                "name": crumb.label,
            });
            if let Some(href) = &crumb.href {
                let absolute = if href.starts_with('/') {
                    format!("{base}{href}")
                } else {
                    href.clone()
                };
                item["item"] = Value::String(absolute);
            }
            item
        })
        .collect();
    json!({
        "@context": "https://schema.org",
        "@type": "BreadcrumbList",
        "itemListElement": items,
    })
}
