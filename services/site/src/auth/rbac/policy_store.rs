//! RBAC grant and binding records.
//!
//! # Purpose
//! Defines the record shapes shared between stores and the Casbin-backed
//! capability authority.
use serde::{Deserialize, Serialize};

/// A role may see a feature (`feature` may end in `*` to cover a prefix).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureGrant {
    pub role: String,
    pub feature: String,
}

impl FeatureGrant {
    pub fn new(role: impl Into<String>, feature: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            feature: feature.into(),
        }
    }
}

/// A user holds a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleBinding {
    pub user_id: String,
    pub role: String,
}

impl RoleBinding {
    pub fn new(user_id: impl Into<String>, role: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            role: role.into(),
        }
    }
}
