//! Site HTTP application wiring.
//!
//! # Purpose
//! Builds the Axum router, configures middleware, and defines the shared
//! application state injected into handlers.
//!
//! # Notes
//! This module centralizes route composition to keep `main` small and testable.
use crate::api;
use crate::api::openapi::ApiDoc;
use crate::auth::authority::AuthorityFactory;
use crate::auth::session::SessionDecoder;
use crate::config::SiteConfig;
use crate::menu::cache::MenuCache;
use crate::menu::pipeline::{MenuPipeline, Personas, StoreMenuSource};
use crate::observability;
use crate::store::MenuStore;
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use utoipa::OpenApi;
use wayfinder_nav::LandingAliases;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn MenuStore>,
    pub cache: Arc<MenuCache>,
    pub pipeline: Arc<MenuPipeline>,
    pub sessions: SessionDecoder,
    pub revalidate_token: Option<String>,
    pub site_url: String,
}

impl AppState {
    /// Wire cache, authority and pipeline around an already opened store.
    pub fn new(config: &SiteConfig, store: Arc<dyn MenuStore>) -> Self {
        let cache = Arc::new(MenuCache::new());
        let source = StoreMenuSource::new(store.clone(), cache.clone(), config.include_unpublished);
        let authorities =
            AuthorityFactory::new(config.authority, store.clone(), config.authority_url.clone());
        let mut aliases = LandingAliases::default();
        for (alias, canonical) in &config.landing_aliases {
            aliases.insert(alias, canonical);
        }
        let pipeline = MenuPipeline::new(
            Arc::new(source),
            authorities,
            Personas::new(config.personas.clone(), config.default_persona.clone()),
            aliases,
            Duration::from_millis(config.authority_timeout_ms),
        );
        Self {
            store,
            cache,
            pipeline: Arc::new(pipeline),
            sessions: SessionDecoder::new(config.session_secret.as_deref()),
            revalidate_token: config.revalidate_token.clone(),
            site_url: config.site_url.clone(),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let trace_layer =
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let parent = observability::trace_context_from_headers(request.headers());
            let span = tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri().path(),
                version = ?request.version()
            );
            span.set_parent(parent);
            span
        });

    Router::new()
        .route(
            "/api/health",
            axum::routing::get(api::system::system_health),
        )
        .route("/api/menu", axum::routing::get(api::menu::get_menu))
        .route(
            "/api/menu/revalidate",
            axum::routing::post(api::revalidate::revalidate_menu),
        )
        .route(
            "/api/breadcrumbs",
            axum::routing::get(api::breadcrumbs::get_breadcrumbs)
                .post(api::breadcrumbs::post_breadcrumbs),
        )
        .merge(
            utoipa_swagger_ui::SwaggerUi::new("/docs").url("/api/openapi.json", ApiDoc::openapi()),
        )
        .layer(trace_layer)
        .with_state(state)
}
