#![allow(dead_code)]

use axum::body::Body;
use axum::http::Request;
use site::app::{AppState, build_router};
use site::config::SiteConfig;
use site::store::memory::InMemoryStore;
use std::sync::Arc;
use wayfinder_nav::{MenuRow, NodeKind};

pub const SESSION_SECRET: &str = "integration-session-secret";
pub const REVALIDATE_TOKEN: &str = "integration-revalidate-token";

pub type TestApp = axum::routing::RouterIntoService<Body, ()>;

pub async fn read_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    serde_json::from_slice(&bytes).expect("json")
}

pub fn menu_rows() -> Vec<MenuRow> {
    vec![
        MenuRow::new("mark2", None, "mark2", NodeKind::Persona, "Mark2").with_href("/mark2"),
        MenuRow::new("docs", Some("mark2"), "mark2", NodeKind::Link, "Docs")
            .with_href("/mark2/docs")
            .with_order(1),
        MenuRow::new("admin", Some("mark2"), "mark2", NodeKind::Group, "Admin")
            .with_order(2)
            .with_feature("menu.mark2.admin"),
        MenuRow::new("users", Some("admin"), "mark2", NodeKind::Link, "Users")
            .with_href("/mark2/admin/users"),
        MenuRow::new("secret", Some("mark2"), "mark2", NodeKind::Link, "Secret Page")
            .with_href("/mark2/secret")
            .with_order(3)
            .with_hidden(true),
        MenuRow::new("draft", Some("mark2"), "mark2", NodeKind::Link, "Draft")
            .with_href("/mark2/draft")
            .with_order(4)
            .with_published(false),
        MenuRow::new("notes", None, "notes", NodeKind::Persona, "Notes").with_href("/notes"),
        MenuRow::new("journal", Some("notes"), "notes", NodeKind::Link, "Journal")
            .with_href("/notes/journal"),
    ]
}

pub fn test_config() -> SiteConfig {
    SiteConfig {
        personas: vec!["mark2".to_string(), "notes".to_string()],
        default_persona: "mark2".to_string(),
        revalidate_token: Some(REVALIDATE_TOKEN.to_string()),
        session_secret: Some(SESSION_SECRET.to_string()),
        site_url: "https://wayfinder.test".to_string(),
        ..SiteConfig::default()
    }
}

pub async fn seeded_store() -> Arc<InMemoryStore> {
    let store = Arc::new(InMemoryStore::new());
    store.upsert_rows(menu_rows()).await;
    store
}

pub fn app_with(config: &SiteConfig, store: Arc<InMemoryStore>) -> (TestApp, AppState) {
    let state = AppState::new(config, store);
    (build_router(state.clone()).into_service(), state)
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

pub fn get_with_bearer(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .header("authorization", format!("Bearer {token}"))
        .body(Body::empty())
        .expect("request")
}

pub fn post(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}
