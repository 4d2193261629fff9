//! Postgres-backed implementation of the menu store.
//!
//! # What this module is
//! Implements [`MenuStore`] over Postgres (via `sqlx`) for deployments whose
//! menus and RBAC records are edited outside this service.
//!
//! # Key invariants
//! - Rows are read in `(order_index, id)` order; assembly re-sorts anyway so
//!   callers never depend on it.
//! - Migrations run before the store is handed out, so queries may assume the
//!   schema exists.
//!
//! # Operational notes
//! - Migrations are executed at startup via `sqlx::migrate!("./migrations")`.
//! - Pool acquisition is bounded by `acquire_timeout_ms`; a stalled database
//!   surfaces as a failed request rather than a hung one.
//! - Database URLs may contain credentials; never log them.
use super::{MenuStore, StoreResult};
use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
use crate::config::PostgresConfig;
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{FromRow, PgPool};
use std::str::FromStr;
use std::time::Duration;
use wayfinder_nav::MenuRow;

/// Durable menu store backed by Postgres.
///
/// # Example
/// ```rust,no_run
/// use site::config::PostgresConfig;
/// use site::store::postgres::PostgresStore;
///
/// async fn open(pg: PostgresConfig) {
///     let _ = PostgresStore::connect(&pg).await;
/// }
/// ```
pub struct PostgresStore {
    pool: PgPool,
}

/// Row shape for the `menu_nodes` table.
///
/// Kept apart from [`MenuRow`] so column types stay a storage detail.
#[derive(Debug, Clone, FromRow)]
struct DbMenuNode {
    id: String,
    parent_id: Option<String>,
    persona: String,
    kind: String,
    label: String,
    href: Option<String>,
    target: Option<String>,
    icon: Option<String>,
    order_index: i32,
    feature_key: Option<String>,
    hidden: bool,
    meta: Option<Value>,
    published: bool,
}

impl From<DbMenuNode> for MenuRow {
    fn from(row: DbMenuNode) -> Self {
        MenuRow {
            id: row.id,
            parent_id: row.parent_id,
            persona: row.persona,
            kind: row.kind,
            label: row.label,
            href: row.href,
            target: row.target,
            icon: row.icon,
            order_index: row.order_index,
            feature_key: row.feature_key,
            hidden: row.hidden,
            meta: row.meta,
            published: row.published,
        }
    }
}

#[derive(Debug, Clone, FromRow)]
struct DbFeatureGrant {
    role: String,
    feature: String,
}

#[derive(Debug, Clone, FromRow)]
struct DbRoleBinding {
    user_id: String,
    role: String,
}

impl PostgresStore {
    /// Connect, run migrations, and return a ready store.
    pub async fn connect(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, true).await
    }

    /// Connect without touching the schema; for tests that migrate themselves.
    pub async fn connect_without_migrations(pg: &PostgresConfig) -> StoreResult<Self> {
        Self::connect_internal(pg, false).await
    }

    async fn connect_internal(pg: &PostgresConfig, run_migrations: bool) -> StoreResult<Self> {
        let connect_options = PgConnectOptions::from_str(&pg.url)?;
        let pool = tokio::time::timeout(
            Duration::from_millis(pg.connect_timeout_ms),
            PgPoolOptions::new()
                .max_connections(pg.max_connections)
                .acquire_timeout(Duration::from_millis(pg.acquire_timeout_ms))
                .connect_with(connect_options),
        )
        .await
        .map_err(|_| sqlx::Error::PoolTimedOut)??;

        if run_migrations {
            sqlx::migrate!("./migrations").run(&pool).await?;
        }
        Ok(Self { pool })
    }

    pub async fn upsert_menu_row(&self, row: &MenuRow) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO menu_nodes \
             (id, parent_id, persona, kind, label, href, target, icon, order_index, feature_key, hidden, meta, published) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             ON CONFLICT (id) DO UPDATE SET \
             parent_id = EXCLUDED.parent_id, persona = EXCLUDED.persona, kind = EXCLUDED.kind, \
             label = EXCLUDED.label, href = EXCLUDED.href, target = EXCLUDED.target, \
             icon = EXCLUDED.icon, order_index = EXCLUDED.order_index, \
             feature_key = EXCLUDED.feature_key, hidden = EXCLUDED.hidden, \
             meta = EXCLUDED.meta, published = EXCLUDED.published",
        )
        .bind(&row.id)
        .bind(&row.parent_id)
        .bind(&row.persona)
        .bind(&row.kind)
        .bind(&row.label)
        .bind(&row.href)
        .bind(&row.target)
        .bind(&row.icon)
        .bind(row.order_index)
        .bind(&row.feature_key)
        .bind(row.hidden)
        .bind(&row.meta)
        .bind(row.published)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_feature_grant(&self, grant: &FeatureGrant) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO feature_grants (role, feature) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(&grant.role)
        .bind(&grant.feature)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn add_role_binding(&self, binding: &RoleBinding) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO role_bindings (user_id, role) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(&binding.user_id)
        .bind(&binding.role)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl MenuStore for PostgresStore {
    async fn menu_rows(&self, persona: &str) -> StoreResult<Vec<MenuRow>> {
        let rows = sqlx::query_as::<_, DbMenuNode>(
            "SELECT id, parent_id, persona, kind, label, href, target, icon, order_index, \
             feature_key, hidden, meta, published \
             FROM menu_nodes WHERE persona = $1 ORDER BY order_index, id",
        )
        .bind(persona)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(MenuRow::from).collect())
    }

    async fn feature_grants(&self) -> StoreResult<Vec<FeatureGrant>> {
        let rows = sqlx::query_as::<_, DbFeatureGrant>(
            "SELECT role, feature FROM feature_grants ORDER BY role, feature",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| FeatureGrant::new(row.role, row.feature))
            .collect())
    }

    async fn role_bindings(&self, user_id: &str) -> StoreResult<Vec<RoleBinding>> {
        let rows = sqlx::query_as::<_, DbRoleBinding>(
            "SELECT user_id, role FROM role_bindings WHERE user_id = $1 ORDER BY role",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows
            .into_iter()
            .map(|row| RoleBinding::new(row.user_id, row.role))
            .collect())
    }

    async fn health_check(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn is_durable(&self) -> bool {
        true
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
