//! Capability authorities consulted when a session snapshot lacks a feature.
//!
//! # Purpose
//! Provides the live fallbacks behind the feature gate: a Casbin RBAC check
//! over store grants, and a remote HTTP decision endpoint.
//!
//! # Key invariants
//! - Authorities are built per request for one user and never shared.
//! - Anonymous callers are denied without touching the backend.
//! - The RBAC enforcer is loaded at most once per request, on first use.
use crate::auth::rbac::enforcer::{build_enforcer, enforce_feature};
use crate::auth::session::Session;
use crate::config::AuthorityMode;
use crate::store::MenuStore;
use async_trait::async_trait;
use casbin::Enforcer;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::OnceCell;
use wayfinder_nav::{AuthorityError, AuthorityResult, CapabilityAuthority, DenyAllAuthority};

/// RBAC authority over the store's feature grants and role bindings.
pub struct RbacAuthority {
    store: Arc<dyn MenuStore>,
    user_id: Option<String>,
    enforcer: OnceCell<Enforcer>,
}

impl RbacAuthority {
    pub fn new(store: Arc<dyn MenuStore>, user_id: Option<String>) -> Self {
        Self {
            store,
            user_id,
            enforcer: OnceCell::new(),
        }
    }

    async fn load_enforcer(&self, user_id: &str) -> AuthorityResult<Enforcer> {
        let grants = self
            .store
            .feature_grants()
            .await
            .map_err(|err| AuthorityError::Backend(Box::new(err)))?;
        let bindings = self
            .store
            .role_bindings(user_id)
            .await
            .map_err(|err| AuthorityError::Backend(Box::new(err)))?;
        build_enforcer(&grants, &bindings)
            .await
            .map_err(|err| AuthorityError::Backend(Box::new(err)))
    }
}

#[async_trait]
impl CapabilityAuthority for RbacAuthority {
    async fn check(&self, feature: &str) -> AuthorityResult<bool> {
        let Some(user_id) = self.user_id.as_deref() else {
            return Ok(false);
        };
        let enforcer = self
            .enforcer
            .get_or_try_init(|| self.load_enforcer(user_id))
            .await?;
        enforce_feature(enforcer, user_id, feature)
            .map_err(|err| AuthorityError::Backend(Box::new(err)))
    }
}

#[derive(Debug, Serialize)]
struct DecisionRequest<'a> {
    user_id: &'a str,
    feature: &'a str,
}

#[derive(Debug, Deserialize)]
struct DecisionResponse {
    allowed: bool,
}

/// Remote authority: `POST {url}` with `{user_id, feature}` → `{allowed}`.
pub struct HttpAuthority {
    client: reqwest::Client,
    url: String,
    user_id: Option<String>,
}

impl HttpAuthority {
    pub fn new(client: reqwest::Client, url: impl Into<String>, user_id: Option<String>) -> Self {
        Self {
            client,
            url: url.into(),
            user_id,
        }
    }
}

#[async_trait]
impl CapabilityAuthority for HttpAuthority {
    async fn check(&self, feature: &str) -> AuthorityResult<bool> {
        let Some(user_id) = self.user_id.as_deref() else {
            return Ok(false);
        };
        let response = self
            .client
            .post(&self.url)
            .json(&DecisionRequest { user_id, feature })
            .send()
            .await
            .map_err(|err| AuthorityError::Unavailable(err.to_string()))?;
        if !response.status().is_success() {
            return Err(AuthorityError::Unavailable(format!(
                "decision endpoint returned {}",
                response.status()
            )));
        }
        let decision: DecisionResponse = response
            .json()
            .await
            .map_err(|err| AuthorityError::Backend(Box::new(err)))?;
        Ok(decision.allowed)
    }
}

/// Builds the per-request authority for the configured mode.
#[derive(Clone)]
pub struct AuthorityFactory {
    mode: AuthorityMode,
    store: Arc<dyn MenuStore>,
    client: reqwest::Client,
    url: Option<String>,
}

impl AuthorityFactory {
    pub fn new(mode: AuthorityMode, store: Arc<dyn MenuStore>, url: Option<String>) -> Self {
        Self {
            mode,
            store,
            client: reqwest::Client::new(),
            url,
        }
    }

    pub fn mode(&self) -> AuthorityMode {
        self.mode
    }

    pub fn for_session(&self, session: &Session) -> Arc<dyn CapabilityAuthority> {
        match (self.mode, self.url.as_deref()) {
            (AuthorityMode::Rbac, _) => Arc::new(RbacAuthority::new(
                self.store.clone(),
                session.user_id.clone(),
            )),
            (AuthorityMode::Http, Some(url)) => Arc::new(HttpAuthority::new(
                self.client.clone(),
                url,
                session.user_id.clone(),
            )),
            _ => Arc::new(DenyAllAuthority),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::rbac::policy_store::{FeatureGrant, RoleBinding};
    use crate::store::memory::InMemoryStore;
    use axum::Json;
    use wayfinder_nav::CapabilitySet;

    async fn seeded_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        store
            .add_grant(FeatureGrant::new("admin", "menu.mark2.*"))
            .await;
        store.add_binding(RoleBinding::new("alice", "admin")).await;
        store
    }

    #[tokio::test]
    async fn rbac_authority_resolves_grants() {
        let store = seeded_store().await;
        let authority = RbacAuthority::new(store.clone(), Some("alice".to_string()));
        assert!(authority.check("menu.mark2.admin").await.expect("check"));
        assert!(!authority.check("menu.ops").await.expect("check"));

        let anonymous = RbacAuthority::new(store, None);
        assert!(!anonymous.check("menu.mark2.admin").await.expect("check"));
    }

    #[tokio::test]
    async fn factory_picks_authority_by_mode() {
        let store: Arc<dyn MenuStore> = seeded_store().await;
        let session = Session {
            user_id: Some("alice".to_string()),
            capabilities: CapabilitySet::empty(),
        };

        let rbac = AuthorityFactory::new(AuthorityMode::Rbac, store.clone(), None);
        assert!(rbac.for_session(&session).check("menu.mark2.x").await.expect("check"));

        let none = AuthorityFactory::new(AuthorityMode::None, store.clone(), None);
        assert!(!none.for_session(&session).check("menu.mark2.x").await.expect("check"));

        // Http without a url degrades to deny-all.
        let http = AuthorityFactory::new(AuthorityMode::Http, store, None);
        assert!(!http.for_session(&session).check("menu.mark2.x").await.expect("check"));
    }

    #[tokio::test]
    async fn http_authority_posts_decisions() {
        #[derive(Deserialize)]
        struct Body {
            user_id: String,
            feature: String,
        }
        let app = axum::Router::new().route(
            "/decide",
            axum::routing::post(|Json(body): Json<Body>| async move {
                Json(serde_json::json!({
                    "allowed": body.user_id == "alice" && body.feature == "menu.ops"
                }))
            }),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app.into_make_service()).await;
        });

        let client = reqwest::Client::builder().no_proxy().build().expect("client");
        let url = format!("http://{addr}/decide");
        let alice = HttpAuthority::new(client.clone(), url.clone(), Some("alice".to_string()));
        assert!(alice.check("menu.ops").await.expect("check"));
        assert!(!alice.check("menu.admin").await.expect("check"));

        let missing = HttpAuthority::new(client, format!("http://{addr}/missing"), Some("alice".to_string()));
        assert!(matches!(
            missing.check("menu.ops").await,
            Err(AuthorityError::Unavailable(_))
        ));
        server.abort();
    }
}
