//! Site HTTP API module.
//!
//! # Purpose
//! Exposes the route handler modules and the payload types they share.
pub mod breadcrumbs;
pub mod error;
pub mod icons;
pub mod menu;
pub mod openapi;
pub mod revalidate;
pub mod system;
pub mod types;
