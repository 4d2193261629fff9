//! Menu revalidation handler.
//!
//! # Purpose
//! Lets the CMS drop cached menu trees after an edit, either for one persona
//! or for every persona at once.
//!
//! # Key invariants
//! - Requires the shared revalidation token; without a configured token the
//!   endpoint always answers 403.
//! - A rejected request never touches the cache.
//!
//! # Security considerations
//! - Tokens are compared in constant time.
//! - The token value is never logged.
use crate::api::error::{ApiError, api_forbidden, api_validation_error};
use crate::api::types::{RevalidateQuery, RevalidateResponse};
use crate::app::AppState;
use crate::menu::cache::{MENU_TAG, persona_tag};
use axum::Json;
use axum::extract::{Query, State};

#[utoipa::path(
    post,
    path = "/api/menu/revalidate",
    tag = "menu",
    params(
        ("token" = String, Query, description = "Shared revalidation secret"),
        ("persona" = Option<String>, Query, description = "Limit revalidation to one persona")
    ),
    responses(
        (status = 200, description = "Cached menus dropped", body = RevalidateResponse),
        (status = 400, description = "Malformed persona", body = crate::api::types::ErrorResponse),
        (status = 403, description = "Missing or wrong token", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn revalidate_menu(
    State(state): State<AppState>,
    Query(query): Query<RevalidateQuery>,
) -> Result<Json<RevalidateResponse>, ApiError> {
    let Some(expected) = state.revalidate_token.as_deref() else {
        tracing::warn!("menu revalidation rejected: no token configured");
        return Err(api_forbidden("invalid token"));
    };
    let provided = query.token.unwrap_or_default();
    if !constant_time_eq(provided.as_bytes(), expected.as_bytes()) {
        tracing::warn!("menu revalidation rejected: token mismatch");
        return Err(api_forbidden("invalid token"));
    }

    let persona = query
        .persona
        .map(|persona| persona.trim().to_string())
        .filter(|persona| !persona.is_empty());
    if let Some(persona) = &persona {
        if !is_persona_key(persona) {
            return Err(api_validation_error("invalid persona"));
        }
    }

    let (tag, scope) = match &persona {
        Some(persona) => (persona_tag(persona), "persona"),
        None => (MENU_TAG.to_string(), "all"),
    };
    let dropped = state.cache.invalidate_tag(&tag);
    metrics::counter!("wayfinder_menu_revalidations_total", "scope" => scope).increment(1);
    tracing::info!(tag = %tag, dropped, "menu cache revalidated");

    Ok(Json(RevalidateResponse {
        ok: true,
        revalidated: true,
        persona,
        dropped,
    }))
}

fn is_persona_key(value: &str) -> bool {
    value.len() <= 64
        && value
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_')
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff = 0u8;
    for (left, right) in a.iter().zip(b.iter()) {
        diff |= left ^ right;
    }
    diff == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constant_time_eq_matches_only_identical_input() {
        assert!(constant_time_eq(b"secret", b"secret"));
        assert!(!constant_time_eq(b"secret", b"secreT"));
        assert!(!constant_time_eq(b"secret", b"secret-longer"));
        assert!(!constant_time_eq(b"", b"secret"));
    }

    #[test]
    fn persona_keys_are_restricted() {
        assert!(is_persona_key("mark2"));
        assert!(is_persona_key("field_notes-2"));
        assert!(!is_persona_key("menu:all"));
        assert!(!is_persona_key("../etc"));
    }
}
