//! Per-request menu pipeline.
//!
//! # Purpose
//! Wires session, persona, store and gate together: fetch the raw tree for a
//! persona, filter it for one caller, and build the breadcrumb index from the
//! same filter pass.
//!
//! # Key invariants
//! - An unknown persona is replaced by the configured default, never rejected.
//! - The gate and index are created here and dropped with the request.
//! - The index sees hidden nodes that passed the capability check; the
//!   visible tree does not.
use crate::auth::authority::AuthorityFactory;
use crate::auth::session::Session;
use crate::menu::cache::MenuCache;
use crate::store::MenuStore;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use wayfinder_nav::{
    FeatureGate, FilterOptions, LandingAliases, MenuIndex, MenuTreeSource, NavError, NavNode,
    NavResult, assemble_tree, filter_tree_with, strip_hidden,
};

/// Known personas and the fallback used for anything else.
#[derive(Debug, Clone)]
pub struct Personas {
    known: Vec<String>,
    default: String,
}

impl Personas {
    pub fn new(known: Vec<String>, default: impl Into<String>) -> Self {
        Self {
            known,
            default: default.into(),
        }
    }

    pub fn resolve(&self, requested: Option<&str>) -> &str {
        let requested = requested.map(str::trim).unwrap_or_default();
        match self.known.iter().find(|persona| persona.as_str() == requested) {
            Some(persona) => persona.as_str(),
            None => {
                if !requested.is_empty() {
                    tracing::debug!(requested, fallback = %self.default, "unknown persona");
                }
                self.default.as_str()
            }
        }
    }

    /// Exact lookup without fallback, for revalidation scopes.
    pub fn find(&self, requested: &str) -> Option<&str> {
        self.known
            .iter()
            .find(|persona| persona.as_str() == requested.trim())
            .map(String::as_str)
    }

    pub fn default_persona(&self) -> &str {
        &self.default
    }
}

/// Store-backed menu source with a per-persona tree cache.
pub struct StoreMenuSource {
    store: Arc<dyn MenuStore>,
    cache: Arc<MenuCache>,
    include_unpublished: bool,
}

impl StoreMenuSource {
    pub fn new(store: Arc<dyn MenuStore>, cache: Arc<MenuCache>, include_unpublished: bool) -> Self {
        Self {
            store,
            cache,
            include_unpublished,
        }
    }
}

#[async_trait]
impl MenuTreeSource for StoreMenuSource {
    async fn fetch_menu_tree(&self, persona: &str) -> NavResult<Vec<NavNode>> {
        if let Some(tree) = self.cache.get(persona) {
            metrics::counter!("wayfinder_menu_cache_total", "result" => "hit").increment(1);
            return Ok(tree.as_ref().clone());
        }
        metrics::counter!("wayfinder_menu_cache_total", "result" => "miss").increment(1);
        let fill_token = self.cache.begin_fill();
        let rows = self
            .store
            .menu_rows(persona)
            .await
            .map_err(|err| NavError::Source(Box::new(err)))?;
        let tree = assemble_tree(&rows, self.include_unpublished)?;
        tracing::debug!(persona, rows = rows.len(), "menu tree assembled");
        Ok(self.cache.insert(persona, tree, fill_token).as_ref().clone())
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct ResolvedMenu {
    pub persona: String,
    pub items: Vec<NavNode>,
    pub index: MenuIndex,
}

pub struct MenuPipeline {
    source: Arc<dyn MenuTreeSource>,
    authorities: AuthorityFactory,
    personas: Personas,
    aliases: LandingAliases,
    gate_timeout: Duration,
}

impl MenuPipeline {
    pub fn new(
        source: Arc<dyn MenuTreeSource>,
        authorities: AuthorityFactory,
        personas: Personas,
        aliases: LandingAliases,
        gate_timeout: Duration,
    ) -> Self {
        Self {
            source,
            authorities,
            personas,
            aliases,
            gate_timeout,
        }
    }

    pub fn personas(&self) -> &Personas {
        &self.personas
    }

    pub fn aliases(&self) -> &LandingAliases {
        &self.aliases
    }

    pub async fn resolve(
        &self,
        requested: Option<&str>,
        session: &Session,
    ) -> NavResult<ResolvedMenu> {
        let persona = self.personas.resolve(requested).to_string();
        let tree = self.source.fetch_menu_tree(&persona).await?;

        let gate = FeatureGate::new(
            session.capabilities.clone(),
            self.authorities.for_session(session),
        )
        .with_timeout(self.gate_timeout);
        let indexed = filter_tree_with(&tree, &gate, FilterOptions { keep_hidden: true }).await;
        let index = MenuIndex::build_with(&indexed, &self.aliases);
        let items = strip_hidden(&indexed);
        tracing::debug!(
            persona = %persona,
            anonymous = session.is_anonymous(),
            visible = wayfinder_nav::count_nodes(&items),
            "menu resolved"
        );
        Ok(ResolvedMenu {
            persona,
            items,
            index,
        })
    }
}
