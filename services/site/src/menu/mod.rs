//! Menu resolution for the site service.
//!
//! # Purpose
//! Hosts the persona-scoped tree cache and the per-request pipeline that turns
//! a session and a persona into visible navigation plus a breadcrumb index.
pub mod cache;
pub mod pipeline;
