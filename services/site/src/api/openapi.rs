//! OpenAPI schema aggregation for the site API.
//!
//! # Purpose
//! Collects all routes and schema types into a single OpenAPI document for docs
//! and client generation.
use crate::api::icons::IconId;
use crate::api::types::{
    BreadcrumbRequest, BreadcrumbResponse, CrumbInput, ErrorResponse, HealthStatus, MenuItem,
    MenuResponse, RevalidateResponse,
};
use crate::api::{breadcrumbs, menu, revalidate, system};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "wayfinder-site",
        version = "v1",
        description = "Persona menus and breadcrumbs"
    ),
    paths(
        system::system_health,
        menu::get_menu,
        breadcrumbs::get_breadcrumbs,
        breadcrumbs::post_breadcrumbs,
        revalidate::revalidate_menu
    ),
    components(schemas(
        HealthStatus,
        ErrorResponse,
        IconId,
        MenuItem,
        MenuResponse,
        CrumbInput,
        BreadcrumbRequest,
        BreadcrumbResponse,
        RevalidateResponse
    )),
    tags(
        (name = "system", description = "Health endpoints"),
        (name = "menu", description = "Menus, breadcrumbs and cache revalidation")
    )
)]
pub struct ApiDoc;
