//! RBAC module wiring and shared constants.
//!
//! # Purpose
//! Exposes the Casbin enforcer builder and the grant/binding record types the
//! store-backed capability authority evaluates.
pub mod enforcer;
pub mod policy_store;

// Embed the Casbin model so deployments don't need a separate config file.
pub const MODEL_CONF: &str = include_str!("rbac/model.conf");
