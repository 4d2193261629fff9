//! Menu storage backends.
//!
//! # Purpose
//! Defines the [`MenuStore`] boundary the request pipeline reads menus and
//! RBAC records through, plus its in-memory, YAML fixture and Postgres
//! implementations.
//!
//! # Key invariants
//! - Stores return flat rows; tree assembly and publication filtering happen
//!   in the pipeline so every backend behaves the same way.
//! - `menu_rows` for an unknown persona returns an empty list.
use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
use async_trait::async_trait;
use std::path::PathBuf;
use thiserror::Error;
use wayfinder_nav::MenuRow;

pub mod fixture;
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("fixture {path}: {message}")]
    Fixture { path: PathBuf, message: String },
    #[error(transparent)]
    Unexpected(#[from] anyhow::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait MenuStore: Send + Sync {
    /// All rows for one persona, published or not.
    async fn menu_rows(&self, persona: &str) -> StoreResult<Vec<MenuRow>>;
    async fn feature_grants(&self) -> StoreResult<Vec<FeatureGrant>>;
    async fn role_bindings(&self, user_id: &str) -> StoreResult<Vec<RoleBinding>>;

    async fn health_check(&self) -> StoreResult<()>;
    fn is_durable(&self) -> bool;
    fn backend_name(&self) -> &'static str;
}
