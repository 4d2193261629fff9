//! Casbin enforcer builder for feature grants.
//!
//! # Purpose and responsibility
//! Constructs an in-memory Casbin enforcer from role → feature grants and
//! user → role bindings, so feature checks follow one policy model.
//!
//! # Key invariants and assumptions
//! - The Casbin model configuration is embedded in `MODEL_CONF`.
//! - Requests are `(user, feature)`; a grant matches with Casbin `keyMatch`,
//!   so `menu.mark2.*` covers every `menu.mark2.` key.
//!
//! # Security considerations
//! - Grants come from the menu store and are trusted as written.
use crate::auth::rbac::MODEL_CONF;
use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
use casbin::{CoreApi, DefaultModel, Enforcer, MemoryAdapter, MgmtApi, Result};

/// Build an in-memory Casbin enforcer for the given grants and bindings.
///
/// # Errors
/// - Returns Casbin errors for an invalid model or policy insertion failures.
///
/// # Example
/// ```rust
/// use site::auth::rbac::enforcer::build_enforcer;
/// use site::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
///
/// # async fn build() -> casbin::Result<()> {
/// let grants = vec![FeatureGrant::new("admin", "menu.admin")];
/// let bindings = vec![RoleBinding::new("alice", "admin")];
/// let _ = build_enforcer(&grants, &bindings).await?;
/// # Ok(())
/// # }
/// ```
pub async fn build_enforcer(grants: &[FeatureGrant], bindings: &[RoleBinding]) -> Result<Enforcer> {
    let model = DefaultModel::from_str(MODEL_CONF).await?;
    let adapter = MemoryAdapter::default();
    let mut enforcer = Enforcer::new(model, adapter).await?;

    for grant in grants {
        enforcer
            .add_policy(vec![grant.role.clone(), grant.feature.clone()])
            .await?;
    }

    for binding in bindings {
        enforcer
            .add_grouping_policy(vec![binding.user_id.clone(), binding.role.clone()])
            .await?;
    }

    // Role links must be rebuilt once every grouping is loaded.
    enforcer.build_role_links()?;
    Ok(enforcer)
}

/// Whether `user_id` holds a role granted `feature`.
pub fn enforce_feature(enforcer: &Enforcer, user_id: &str, feature: &str) -> Result<bool> {
    enforcer.enforce((user_id, feature))
}
