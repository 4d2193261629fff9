//! Menu tree sources.
//!
//! A source hands out the complete, unfiltered tree for one persona. Stores,
//! fixtures and caches all sit behind [`MenuTreeSource`] so the request
//! pipeline never depends on where menus live.
use crate::errors::NavResult;
use crate::node::NavNode;
use crate::tree::{MenuRow, assemble_tree};
use async_trait::async_trait;
use std::collections::HashMap;

#[async_trait]
pub trait MenuTreeSource: Send + Sync {
    /// Full tree for `persona`, before any capability filtering.
    ///
    /// An unknown persona yields an empty tree, not an error.
    async fn fetch_menu_tree(&self, persona: &str) -> NavResult<Vec<NavNode>>;
}

/// Fixed in-process trees keyed by persona.
#[derive(Debug, Clone, Default)]
pub struct StaticMenuSource {
    trees: HashMap<String, Vec<NavNode>>,
}

impl StaticMenuSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_persona(mut self, persona: impl Into<String>, tree: Vec<NavNode>) -> Self {
        self.trees.insert(persona.into(), tree);
        self
    }

    /// Group rows by persona and assemble one tree per persona.
    pub fn from_rows(rows: &[MenuRow], include_unpublished: bool) -> NavResult<Self> {
        let mut grouped: HashMap<&str, Vec<MenuRow>> = HashMap::new();
        for row in rows {
            grouped
                .entry(row.persona.as_str())
                .or_default()
                .push(row.clone());
        }
        let mut source = Self::new();
        for (persona, rows) in grouped {
            let tree = assemble_tree(&rows, include_unpublished)?;
            source.trees.insert(persona.to_string(), tree);
        }
        Ok(source)
    }

    pub fn personas(&self) -> impl Iterator<Item = &str> {
        self.trees.keys().map(String::as_str)
    }
}

#[async_trait]
impl MenuTreeSource for StaticMenuSource {
    async fn fetch_menu_tree(&self, persona: &str) -> NavResult<Vec<NavNode>> {
        Ok(self.trees.get(persona).cloned().unwrap_or_default())
    }
}
