//! Site service library crate.
//!
//! # Purpose
//! Exposes the menu and breadcrumb HTTP surface, session and authority
//! helpers, configuration, and storage implementations for use by the binary
//! and tests.
//!
//! # Notes
//! Navigation semantics (filtering, indexing, breadcrumbs) live in
//! `wayfinder-nav`; this crate only wires them to storage and HTTP.
pub mod api;
pub mod app;
pub mod auth;
pub mod config;
pub mod menu;
pub mod observability;
pub mod store;
