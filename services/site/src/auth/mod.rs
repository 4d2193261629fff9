//! Site authentication and authorization modules.
//!
//! # Purpose
//! Groups session decoding, the capability authorities behind the feature
//! gate, and the Casbin RBAC model they evaluate.
pub mod authority;
pub mod rbac;
pub mod session;
