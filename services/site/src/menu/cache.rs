//! Tag-addressed cache of raw persona menu trees.
//!
//! # Purpose
//! Keeps assembled, unfiltered trees per persona so requests skip the store,
//! and drops them by tag when the revalidation endpoint fires.
//!
//! # Key invariants
//! - Every entry carries the tags `menu` and `menu:<persona>`; tag names are
//!   part of the revalidation contract and must not change.
//! - Only raw trees are cached. Filtered output depends on the caller and is
//!   never stored here.
//! - A fill that started before an invalidation is discarded, so a slow store
//!   read cannot resurrect data the invalidation meant to drop.
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use wayfinder_nav::NavNode;

pub const MENU_TAG: &str = "menu";

pub fn persona_tag(persona: &str) -> String {
    format!("{MENU_TAG}:{persona}")
}

#[derive(Debug, Clone)]
struct CacheEntry {
    tree: Arc<Vec<NavNode>>,
    tags: [String; 2],
}

#[derive(Debug, Default)]
pub struct MenuCache {
    entries: DashMap<String, CacheEntry>,
    generation: AtomicU64,
}

impl MenuCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, persona: &str) -> Option<Arc<Vec<NavNode>>> {
        self.entries.get(persona).map(|entry| entry.tree.clone())
    }

    /// Token to pass to [`MenuCache::insert`] once a store read completes.
    pub fn begin_fill(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Store `tree` unless an invalidation happened since `fill_token` was taken.
    pub fn insert(&self, persona: &str, tree: Vec<NavNode>, fill_token: u64) -> Arc<Vec<NavNode>> {
        let tree = Arc::new(tree);
        if self.generation.load(Ordering::Acquire) != fill_token {
            tracing::debug!(persona, "discarding menu fill raced by revalidation");
            return tree;
        }
        self.entries.insert(
            persona.to_string(),
            CacheEntry {
                tree: tree.clone(),
                tags: [MENU_TAG.to_string(), persona_tag(persona)],
            },
        );
        tree
    }

    /// Drop every entry carrying `tag`; returns how many were removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| !entry.tags.iter().any(|candidate| candidate == tag));
        before.saturating_sub(self.entries.len())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
