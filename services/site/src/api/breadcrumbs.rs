//! Breadcrumb API handlers.
//!
//! # Purpose
//! Builds the breadcrumb trail for a path from the caller's filtered menu,
//! together with its schema.org `BreadcrumbList` rendering.
//!
//! # Key invariants
//! - The trail is derived from the same filter pass as `/api/menu`, so a
//!   caller never sees crumbs for branches the gate denied.
//! - GET derives the trail from the path alone; POST additionally accepts
//!   page-registered and forced crumbs.
use crate::api::error::{ApiError, api_internal};
use crate::api::menu::NO_STORE;
use crate::api::types::{BreadcrumbQuery, BreadcrumbRequest, BreadcrumbResponse, CrumbInput};
use crate::app::AppState;
use axum::Json;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::http::header::CACHE_CONTROL;
use axum::response::IntoResponse;
use wayfinder_nav::{
    BreadcrumbOptions, Crumb, CrumbKind, breadcrumb_json_ld, get_breadcrumbs_with,
    normalize_path_with,
};

#[utoipa::path(
    get,
    path = "/api/breadcrumbs",
    tag = "menu",
    params(
        ("path" = Option<String>, Query, description = "Page path; defaults to `/`"),
        ("persona" = Option<String>, Query, description = "Persona key")
    ),
    responses(
        (status = 200, description = "Breadcrumb trail for the path", body = BreadcrumbResponse),
        (status = 500, description = "Menu source unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn get_breadcrumbs(
    State(state): State<AppState>,
    Query(query): Query<BreadcrumbQuery>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let path = query.path.unwrap_or_else(|| "/".to_string());
    let body = build_trail(&state, &headers, &path, query.persona.as_deref(), &[], &[]).await?;
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(body)))
}

#[utoipa::path(
    post,
    path = "/api/breadcrumbs",
    tag = "menu",
    request_body = BreadcrumbRequest,
    responses(
        (status = 200, description = "Breadcrumb trail honoring page overrides", body = BreadcrumbResponse),
        (status = 500, description = "Menu source unavailable", body = crate::api::types::ErrorResponse)
    )
)]
pub(crate) async fn post_breadcrumbs(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<BreadcrumbRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let response = build_trail(
        &state,
        &headers,
        &body.path,
        body.persona.as_deref(),
        &body.registered,
        &body.forced,
    )
    .await?;
    Ok(([(CACHE_CONTROL, NO_STORE)], Json(response)))
}

async fn build_trail(
    state: &AppState,
    headers: &HeaderMap,
    path: &str,
    persona: Option<&str>,
    registered: &[CrumbInput],
    forced: &[CrumbInput],
) -> Result<BreadcrumbResponse, ApiError> {
    let session = state.sessions.decode(headers);
    let resolved = state
        .pipeline
        .resolve(persona, &session)
        .await
        .map_err(|err| api_internal("menu source unavailable", &err))?;
    let options = BreadcrumbOptions {
        registered: to_crumbs(registered, CrumbKind::Registered),
        forced: to_crumbs(forced, CrumbKind::Forced),
        aliases: state.pipeline.aliases().clone(),
    };
    let items = get_breadcrumbs_with(path, &resolved.index, &options);
    let json_ld = breadcrumb_json_ld(&items, &state.site_url);
    Ok(BreadcrumbResponse {
        persona: resolved.persona,
        path: normalize_path_with(path, &options.aliases),
        items,
        json_ld,
    })
}

fn to_crumbs(inputs: &[CrumbInput], kind: CrumbKind) -> Vec<Crumb> {
    inputs
        .iter()
        .filter(|input| !input.label.trim().is_empty())
        .map(|input| Crumb::new(input.label.trim(), input.href.as_deref(), kind))
        .collect()
}
