//! YAML fixture menu store.
//!
//! # Purpose
//! Serves menus from a YAML document on disk. The file is re-read on every
//! lookup, so an edit becomes visible as soon as the menu cache is
//! revalidated.
//!
//! # Document shape
//! ```yaml
//! menu_nodes:
//!   - { id: mark2, persona: mark2, kind: persona, label: Mark2, href: /mark2 }
//! feature_grants:
//!   - { role: admin, feature: menu.mark2.admin }
//! role_bindings:
//!   - { user_id: alice, role: admin }
//! ```
use super::{MenuStore, StoreError, StoreResult};
use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use wayfinder_nav::MenuRow;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuFixture {
    #[serde(default)]
    pub menu_nodes: Vec<MenuRow>,
    #[serde(default)]
    pub feature_grants: Vec<FeatureGrant>,
    #[serde(default)]
    pub role_bindings: Vec<RoleBinding>,
}

impl MenuFixture {
    pub fn parse(contents: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(contents)
    }
}

pub struct FixtureStore {
    path: PathBuf,
}

impl FixtureStore {
    /// Open a fixture file, failing fast when it is missing or malformed.
    pub async fn open(path: impl Into<PathBuf>) -> StoreResult<Self> {
        let store = Self { path: path.into() };
        let fixture = store.load().await?;
        tracing::info!(
            path = %store.path.display(),
            rows = fixture.menu_nodes.len(),
            "menu fixture loaded"
        );
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> StoreResult<MenuFixture> {
        let contents =
            tokio::fs::read_to_string(&self.path)
                .await
                .map_err(|err| StoreError::Fixture {
                    path: self.path.clone(),
                    message: err.to_string(),
                })?;
        MenuFixture::parse(&contents).map_err(|err| StoreError::Fixture {
            path: self.path.clone(),
            message: err.to_string(),
        })
    }
}

#[async_trait]
impl MenuStore for FixtureStore {
    async fn menu_rows(&self, persona: &str) -> StoreResult<Vec<MenuRow>> {
        let fixture = self.load().await?;
        Ok(fixture
            .menu_nodes
            .into_iter()
            .filter(|row| row.persona == persona)
            .collect())
    }

    async fn feature_grants(&self) -> StoreResult<Vec<FeatureGrant>> {
        Ok(self.load().await?.feature_grants)
    }

    async fn role_bindings(&self, user_id: &str) -> StoreResult<Vec<RoleBinding>> {
        Ok(self
            .load()
            .await?
            .role_bindings
            .into_iter()
            .filter(|binding| binding.user_id == user_id)
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        self.load().await.map(|_| ())
    }

    fn is_durable(&self) -> bool {
        false
    }

    fn backend_name(&self) -> &'static str {
        "fixture"
    }
}
