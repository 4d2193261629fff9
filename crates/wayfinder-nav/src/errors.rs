use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NavError {
    #[error("unknown node kind `{kind}` for node {id}")]
    UnknownKind { id: String, kind: String },
    #[error("node {0} requires an href")]
    MissingHref(String),
    #[error("duplicate node id {0}")]
    DuplicateId(String),
    #[error("menu source unavailable: {0}")]
    Source(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type NavResult<T> = Result<T, NavError>;

/// Failure reported by a [`crate::CapabilityAuthority`].
///
/// The feature gate never surfaces these to callers; every variant is
/// collapsed into a denied check.
#[derive(Debug, Error)]
pub enum AuthorityError {
    #[error("authority unavailable: {0}")]
    Unavailable(String),
    #[error("authority check timed out after {0:?}")]
    Timeout(Duration),
    #[error("authority backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

pub type AuthorityResult<T> = Result<T, AuthorityError>;
