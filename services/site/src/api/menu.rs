//! Menu API handler.
//!
//! # Purpose
//! Serves the caller's filtered navigation tree for one persona.
//!
//! # Key invariants
//! - Responses are per-caller and always marked `private, no-store`.
//! - An unknown persona resolves to the default persona instead of failing.
//! - Store failures map to a generic 500; the cause is only logged.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::{MenuQuery, MenuResponse, menu_items};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::CACHE_CONTROL;
use axum::response::IntoResponse;

pub(crate) const NO_STORE: &str = "private, no-store";

#[utoipa::path(
    get,
    path = "/api/menu",
    tag = "menu",
    params(
        ("persona" = Option<String>, Query, description = "Persona key; unknown values fall back to the default")
    ),
    responses(
        (status = 200, description = "Menu visible to the caller", body = MenuResponse),
        (status = 500, description = "Menu source unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_menu(
    State(state): State<AppState>,
    Query(query): Query<MenuQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let session = state.sessions.decode(&headers);
    let resolved = state
        .pipeline
        .resolve(query.persona.as_deref(), &session)
        .await
        .map_err(|err| api_internal("menu source unavailable", &err))?;
    let body = MenuResponse {
        items: menu_items(&resolved.items),
        persona: resolved.persona,
    };
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(body)))
}
