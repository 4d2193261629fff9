//! In-memory implementation of the menu store.
//!
//! # Purpose
//! Holds menu rows and RBAC records in `HashMap`s guarded by
//! `tokio::sync::RwLock`. Used for local development, tests, and deployments
//! whose menus are seeded at startup.
//!
//! # Durability and consistency
//! - **Not durable**: all state is lost on process restart.
//! - Writes take the write lock of one map; reads run concurrently.
use super::{MenuStore, StoreResult};
use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use wayfinder_nav::MenuRow;

#[derive(Clone, Default)]
pub struct InMemoryStore {
    /// Menu rows keyed by persona, in insertion order.
    rows: Arc<RwLock<HashMap<String, Vec<MenuRow>>>>,
    grants: Arc<RwLock<Vec<FeatureGrant>>>,
    /// Role bindings keyed by user id.
    bindings: Arc<RwLock<HashMap<String, Vec<RoleBinding>>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert rows, replacing any existing row with the same persona and id.
    pub async fn upsert_rows(&self, rows: impl IntoIterator<Item = MenuRow>) {
        let mut guard = self.rows.write().await;
        for row in rows {
            let persona_rows = guard.entry(row.persona.clone()).or_default();
            match persona_rows.iter_mut().find(|existing| existing.id == row.id) {
                Some(existing) => *existing = row,
                None => persona_rows.push(row),
            }
        }
    }

    pub async fn remove_persona(&self, persona: &str) -> usize {
        self.rows
            .write()
            .await
            .remove(persona)
            .map_or(0, |rows| rows.len())
    }

    pub async fn add_grant(&self, grant: FeatureGrant) {
        let mut grants = self.grants.write().await;
        if !grants.contains(&grant) {
            grants.push(grant);
        }
    }

    pub async fn add_binding(&self, binding: RoleBinding) {
        let mut bindings = self.bindings.write().await;
        let user_bindings = bindings.entry(binding.user_id.clone()).or_default();
        if !user_bindings.contains(&binding) {
            user_bindings.push(binding);
        }
    }
}

#[async_trait]
impl MenuStore for InMemoryStore {
    async fn menu_rows(&self, persona: &str) -> StoreResult<Vec<MenuRow>> {
        Ok(self
            .rows
            .read()
            .await
            .get(persona)
            .cloned()
            .unwrap_or_default())
    }

    async fn feature_grants(&self) -> StoreResult<Vec<FeatureGrant>> {
        Ok(self.grants.read().await.clone())
    }

    async fn role_bindings(&self, user_id: &str) -> StoreResult<Vec<RoleBinding>> {
        Ok(self
            .bindings
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn health_check(&self) -> StoreResult<()> {
        Ok(())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfinder_nav::NodeKind;

    #[tokio::test]
    async fn upsert_replaces_rows_by_id() {
        let store = InMemoryStore::new();
        store
            .upsert_rows([
                MenuRow::new("docs", None, "mark2", NodeKind::Link, "Docs").with_href("/docs"),
                MenuRow::new("blog", None, "notes", NodeKind::Link, "Blog").with_href("/blog"),
            ])
            .await;
        store
            .upsert_rows([MenuRow::new("docs", None, "mark2", NodeKind::Link, "Guides")
                .with_href("/guides")])
            .await;

        let rows = store.menu_rows("mark2").await.expect("rows");
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].label, "Guides");
        assert!(store.menu_rows("ghost").await.expect("rows").is_empty());
        assert_eq!(store.remove_persona("notes").await, 1);
    }

    #[tokio::test]
    async fn grants_and_bindings_are_deduplicated() {
        let store = InMemoryStore::new();
        let grant = FeatureGrant::new("admin", "menu.mark2.admin");
        store.add_grant(grant.clone()).await;
        store.add_grant(grant).await;
        let binding = RoleBinding::new("alice", "admin");
        store.add_binding(binding.clone()).await;
        store.add_binding(binding).await;

        assert_eq!(store.feature_grants().await.expect("grants").len(), 1);
        assert_eq!(store.role_bindings("alice").await.expect("bindings").len(), 1);
        assert!(store.role_bindings("bob").await.expect("bindings").is_empty());
        assert_eq!(store.backend_name(), "memory");
        assert!(!store.is_durable());
    }
}
