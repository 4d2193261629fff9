//! Health API handler.
//!
//! # Purpose and responsibility
//! Provides a lightweight readiness check for the site service.
//!
//! # Key invariants and assumptions
//! - Health checks must be fast and side-effect free; they never warm or
//!   drop the menu cache.
use crate::api::error::{ApiError, api_internal};
use crate::api::types::HealthStatus;
use crate::app::AppState;
use axum::Json;
use axum::extract::State;

#[utoipa::path(
    get,
    path = "/api/health",
    tag = "system",
    responses(
        (status = 200, description = "Service health", body = HealthStatus),
        (status = 500, description = "Menu storage unavailable", body = crate::api::types::ErrorResponse)
    )
)]
/// Return service health.
///
/// # Errors
/// - Returns 500 if the storage health check fails.
pub(crate) async fn system_health(
    State(state): State<AppState>,
) -> Result<Json<HealthStatus>, ApiError> {
    if let Err(err) = state.store.health_check().await {
        return Err(api_internal("storage unavailable", &err));
    }
    Ok(Json(HealthStatus {
        status: "ok".to_string(),
        storage: state.store.backend_name().to_string(),
        durable: state.store.is_durable(),
    }))
}
