//! Site service configuration.
//!
//! # Purpose
//! Loads service settings from `WAYFINDER_*` environment variables, then
//! applies an optional YAML override file named by `WAYFINDER_CONFIG`.
//!
//! # Key invariants
//! - The default persona is always one of the known personas.
//! - Fixture storage requires a fixture path; Postgres storage requires a URL.
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_METRICS_BIND: &str = "0.0.0.0:9090";
pub const DEFAULT_PERSONA: &str = "mark2";
pub const DEFAULT_AUTHORITY_TIMEOUT_MS: u64 = 750;
pub const DEFAULT_SITE_URL: &str = "http://localhost:3000";
pub const DEFAULT_PG_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_PG_CONNECT_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_PG_ACQUIRE_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    Fixture,
    Postgres,
}

impl FromStr for StorageBackend {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "fixture" => Ok(Self::Fixture),
            "postgres" | "pg" => Ok(Self::Postgres),
            other => bail!("unknown storage backend: {other}"),
        }
    }
}

/// Where the feature gate goes when the session snapshot lacks a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityMode {
    None,
    Rbac,
    Http,
}

impl FromStr for AuthorityMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "rbac" => Ok(Self::Rbac),
            "http" => Ok(Self::Http),
            other => bail!("unknown authority mode: {other}"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresConfig {
    pub url: String,
    #[serde(default = "default_pg_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_pg_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    #[serde(default = "default_pg_acquire_timeout_ms")]
    pub acquire_timeout_ms: u64,
}

fn default_pg_max_connections() -> u32 {
    DEFAULT_PG_MAX_CONNECTIONS
}

fn default_pg_connect_timeout_ms() -> u64 {
    DEFAULT_PG_CONNECT_TIMEOUT_MS
}

fn default_pg_acquire_timeout_ms() -> u64 {
    DEFAULT_PG_ACQUIRE_TIMEOUT_MS
}

// Site configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct SiteConfig {
    pub bind_addr: SocketAddr,
    pub metrics_bind: SocketAddr,
    pub storage: StorageBackend,
    pub fixture_path: Option<PathBuf>,
    pub postgres: Option<PostgresConfig>,
    pub personas: Vec<String>,
    pub default_persona: String,
    pub revalidate_token: Option<String>,
    pub session_secret: Option<String>,
    pub authority: AuthorityMode,
    pub authority_url: Option<String>,
    pub authority_timeout_ms: u64,
    pub include_unpublished: bool,
    pub landing_aliases: BTreeMap<String, String>,
    pub site_url: String,
}

#[derive(Debug, Deserialize)]
struct SiteConfigOverride {
    bind_addr: Option<String>,
    metrics_bind: Option<String>,
    storage: Option<StorageBackend>,
    fixture_path: Option<PathBuf>,
    postgres: Option<PostgresConfig>,
    personas: Option<Vec<String>>,
    default_persona: Option<String>,
    revalidate_token: Option<String>,
    session_secret: Option<String>,
    authority: Option<AuthorityMode>,
    authority_url: Option<String>,
    authority_timeout_ms: Option<u64>,
    include_unpublished: Option<bool>,
    landing_aliases: Option<BTreeMap<String, String>>,
    site_url: Option<String>,
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(key) {
        Some(raw) => raw
            .parse()
            .map_err(|err| anyhow::anyhow!("parse {key}: {err}")),
        None => Ok(default),
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            metrics_bind: SocketAddr::from(([0, 0, 0, 0], 9090)),
            storage: StorageBackend::Memory,
            fixture_path: None,
            postgres: None,
            personas: vec![DEFAULT_PERSONA.to_string()],
            default_persona: DEFAULT_PERSONA.to_string(),
            revalidate_token: None,
            session_secret: None,
            authority: AuthorityMode::None,
            authority_url: None,
            authority_timeout_ms: DEFAULT_AUTHORITY_TIMEOUT_MS,
            include_unpublished: false,
            landing_aliases: BTreeMap::new(),
            site_url: DEFAULT_SITE_URL.to_string(),
        }
    }
}

impl SiteConfig {
    pub fn from_env() -> Result<Self> {
        let bind_addr = env_opt("WAYFINDER_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse()
            .with_context(|| "parse WAYFINDER_BIND")?;
        let metrics_bind = env_opt("WAYFINDER_METRICS_BIND")
            .unwrap_or_else(|| DEFAULT_METRICS_BIND.to_string())
            .parse()
            .with_context(|| "parse WAYFINDER_METRICS_BIND")?;
        let storage = env_parse("WAYFINDER_STORAGE", StorageBackend::Memory)?;
        let postgres = match env_opt("WAYFINDER_POSTGRES_URL") {
            Some(url) => Some(PostgresConfig {
                url,
                max_connections: env_parse(
                    "WAYFINDER_POSTGRES_MAX_CONNECTIONS",
                    DEFAULT_PG_MAX_CONNECTIONS,
                )?,
                connect_timeout_ms: env_parse(
                    "WAYFINDER_POSTGRES_CONNECT_TIMEOUT_MS",
                    DEFAULT_PG_CONNECT_TIMEOUT_MS,
                )?,
                acquire_timeout_ms: env_parse(
                    "WAYFINDER_POSTGRES_ACQUIRE_TIMEOUT_MS",
                    DEFAULT_PG_ACQUIRE_TIMEOUT_MS,
                )?,
            }),
            None => None,
        };
        let personas = env_opt("WAYFINDER_PERSONAS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|persona| !persona.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_else(|| vec![DEFAULT_PERSONA.to_string()]);
        let default_persona = env_opt("WAYFINDER_DEFAULT_PERSONA")
            .or_else(|| personas.first().cloned())
            .unwrap_or_else(|| DEFAULT_PERSONA.to_string());

        let config = Self {
            bind_addr,
            metrics_bind,
            storage,
            fixture_path: env_opt("WAYFINDER_FIXTURE_PATH").map(PathBuf::from),
            postgres,
            personas,
            default_persona,
            revalidate_token: env_opt("WAYFINDER_REVALIDATE_TOKEN"),
            session_secret: env_opt("WAYFINDER_SESSION_SECRET"),
            authority: env_parse("WAYFINDER_AUTHORITY", AuthorityMode::None)?,
            authority_url: env_opt("WAYFINDER_AUTHORITY_URL"),
            authority_timeout_ms: env_parse(
                "WAYFINDER_AUTHORITY_TIMEOUT_MS",
                DEFAULT_AUTHORITY_TIMEOUT_MS,
            )?,
            include_unpublished: env_parse("WAYFINDER_INCLUDE_UNPUBLISHED", false)?,
            landing_aliases: BTreeMap::new(),
            site_url: env_opt("WAYFINDER_SITE_URL").unwrap_or_else(|| DEFAULT_SITE_URL.to_string()),
        };
        Ok(config)
    }

    pub fn from_env_or_yaml() -> Result<Self> {
        let mut config = Self::from_env()?;
        if let Ok(path) = std::env::var("WAYFINDER_CONFIG") {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("read WAYFINDER_CONFIG: {path}"))?;
            config.apply_yaml(&contents)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Overlay values from a YAML document; absent keys keep their current value.
    pub fn apply_yaml(&mut self, contents: &str) -> Result<()> {
        let override_cfg: SiteConfigOverride =
            serde_yaml::from_str(contents).with_context(|| "parse site config yaml")?;
        if let Some(value) = override_cfg.bind_addr {
            self.bind_addr = value.parse().with_context(|| "parse bind_addr")?;
        }
        if let Some(value) = override_cfg.metrics_bind {
            self.metrics_bind = value.parse().with_context(|| "parse metrics_bind")?;
        }
        if let Some(value) = override_cfg.storage {
            self.storage = value;
        }
        if let Some(value) = override_cfg.fixture_path {
            self.fixture_path = Some(value);
        }
        if let Some(value) = override_cfg.postgres {
            self.postgres = Some(value);
        }
        if let Some(value) = override_cfg.personas {
            self.personas = value;
        }
        if let Some(value) = override_cfg.default_persona {
            self.default_persona = value;
        }
        if let Some(value) = override_cfg.revalidate_token {
            self.revalidate_token = Some(value);
        }
        if let Some(value) = override_cfg.session_secret {
            self.session_secret = Some(value);
        }
        if let Some(value) = override_cfg.authority {
            self.authority = value;
        }
        if let Some(value) = override_cfg.authority_url {
            self.authority_url = Some(value);
        }
        if let Some(value) = override_cfg.authority_timeout_ms {
            self.authority_timeout_ms = value;
        }
        if let Some(value) = override_cfg.include_unpublished {
            self.include_unpublished = value;
        }
        if let Some(value) = override_cfg.landing_aliases {
            self.landing_aliases = value;
        }
        if let Some(value) = override_cfg.site_url {
            self.site_url = value;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.personas.is_empty() {
            bail!("at least one persona must be configured");
        }
        if !self.personas.contains(&self.default_persona) {
            bail!(
                "default persona {} is not a configured persona",
                self.default_persona
            );
        }
        if self.storage == StorageBackend::Fixture && self.fixture_path.is_none() {
            bail!("fixture storage requires fixture_path");
        }
        if self.authority == AuthorityMode::Http && self.authority_url.is_none() {
            bail!("http authority requires authority_url");
        }
        Ok(())
    }
}
