//! URL path canonicalization for breadcrumb matching.
//!
//! # Purpose
//! Reduces request paths and menu hrefs to one canonical form so the menu
//! index and the breadcrumb builder agree on keys.
//!
//! # Key invariants
//! - Output is always rooted and never empty; the site root is `/`.
//! - Query strings, fragments, repeated and trailing slashes are dropped.
//! - Paths are compared percent-decoded: `/blog/caf%C3%A9` and `/blog/café`
//!   are the same key. Dot segments are resolved while parsing.
//! - Landing aliases map a nested marketing path onto its section root, so
//!   `/mark2/blueprint` produces the same trail as `/mark2`.
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};
use std::collections::HashMap;
use std::sync::LazyLock;
use url::Url;

/// Built-in landing alias table (`alias` → `canonical section root`).
pub const DEFAULT_LANDING_ALIASES: &[(&str, &str)] = &[("/mark2/blueprint", "/mark2")];

/// Characters escaped when a decoded segment is turned back into an href.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

static PARSE_BASE: LazyLock<Option<Url>> = LazyLock::new(|| Url::parse("http://localhost/").ok());

static DEFAULT_ALIASES: LazyLock<LandingAliases> = LazyLock::new(LandingAliases::default);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingAliases {
    map: HashMap<String, String>,
}

impl Default for LandingAliases {
    fn default() -> Self {
        Self::from_pairs(DEFAULT_LANDING_ALIASES.iter().copied())
    }
}

impl LandingAliases {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    pub fn from_pairs<I, A, C>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, C)>,
        A: AsRef<str>,
        C: AsRef<str>,
    {
        let mut aliases = Self::empty();
        for (alias, canonical) in pairs {
            aliases.insert(alias.as_ref(), canonical.as_ref());
        }
        aliases
    }

    /// Register an alias; both sides are canonicalized first.
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.map
            .insert(canonical_path(alias), canonical_path(canonical));
    }

    pub fn resolve(&self, path: &str) -> Option<&str> {
        self.map.get(path).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// Normalize a request path using the built-in alias table.
///
/// ```rust
/// use wayfinder_nav::normalize_path_for_crumbs;
///
/// assert_eq!(normalize_path_for_crumbs(""), "/");
/// assert_eq!(normalize_path_for_crumbs("/mark2///?foo=bar"), "/mark2");
/// assert_eq!(normalize_path_for_crumbs("/mark2/blueprint/?utm=test"), "/mark2");
/// ```
pub fn normalize_path_for_crumbs(raw: &str) -> String {
    normalize_path_with(raw, &DEFAULT_ALIASES)
}

pub fn normalize_path_with(raw: &str, aliases: &LandingAliases) -> String {
    let path = canonical_path(raw);
    match aliases.resolve(&path) {
        Some(canonical) => canonical.to_string(),
        None => path,
    }
}

/// Canonical form without alias mapping.
pub fn canonical_path(raw: &str) -> String {
    let encoded = url_path(raw.trim());
    let decoded = percent_decode_str(&encoded)
        .decode_utf8()
        .map(|path| path.into_owned())
        .unwrap_or(encoded);
    let segments = path_segments(&decoded);
    if segments.is_empty() {
        return "/".to_string();
    }
    format!("/{}", segments.join("/"))
}

/// Still-encoded path component of `raw`. Only inputs that parse as a full
/// URL on their own are treated as absolute; everything else is resolved
/// against the site root, so a URL inside a query string stays in the query.
fn url_path(raw: &str) -> String {
    if let Ok(parsed) = Url::parse(raw) {
        if !parsed.cannot_be_a_base() {
            return parsed.path().to_string();
        }
    }
    // A leading `//` would otherwise be read as a host.
    let rooted = format!("/{}", raw.trim_start_matches(['/', '\\']));
    match PARSE_BASE.as_ref().and_then(|base| base.join(&rooted).ok()) {
        Some(joined) => joined.path().to_string(),
        None => rooted
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// Percent-encode one decoded segment for use inside an href.
pub fn encode_path_segment(segment: &str) -> String {
    utf8_percent_encode(segment, SEGMENT).to_string()
}

/// Segments of an already-normalized path; empty for `/`.
pub fn path_segments(normalized: &str) -> Vec<&str> {
    normalized
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect()
}
