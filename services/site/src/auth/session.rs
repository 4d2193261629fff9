//! Session decoding.
//!
//! # Purpose
//! Turns the caller's session token into a user id and a [`CapabilitySet`].
//! Tokens are HS256 JWTs carried in `Authorization: Bearer` or in the
//! `session` cookie.
//!
//! # Key invariants
//! - Any decoding failure yields an anonymous session; requests never fail
//!   because of a bad token.
//! - Non-string entries in the `features` claim are ignored; a `features`
//!   claim that is not an array grants nothing but keeps the user id.
//! - Without a configured secret every caller is anonymous.
use axum::http::HeaderMap;
use axum::http::header::{AUTHORIZATION, COOKIE};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use wayfinder_nav::CapabilitySet;

pub const SESSION_COOKIE: &str = "session";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub exp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub features: Option<Value>,
}

impl SessionClaims {
    /// Entries of the `features` claim when it is an array.
    pub fn feature_values(&self) -> &[Value] {
        match &self.features {
            Some(Value::Array(values)) => values,
            _ => &[],
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub user_id: Option<String>,
    pub capabilities: CapabilitySet,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn is_anonymous(&self) -> bool {
        self.user_id.is_none()
    }
}

#[derive(Clone)]
pub struct SessionDecoder {
    key: Option<DecodingKey>,
    validation: Validation,
}

impl SessionDecoder {
    pub fn new(secret: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 30;
        Self {
            key: secret.map(|secret| DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }

    pub fn decode(&self, headers: &HeaderMap) -> Session {
        let (Some(key), Some(token)) = (&self.key, session_token(headers)) else {
            return Session::anonymous();
        };
        match jsonwebtoken::decode::<SessionClaims>(&token, key, &self.validation) {
            Ok(data) => Session {
                capabilities: CapabilitySet::from_json_values(data.claims.feature_values()),
                user_id: Some(data.claims.sub),
            },
            Err(err) => {
                tracing::debug!(error = %err, "ignoring invalid session token");
                Session::anonymous()
            }
        }
    }
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let bearer = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, token)| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Sign a session token; used by login flows and tests.
pub fn mint_session(
    secret: &str,
    user_id: &str,
    features: Vec<Value>,
    ttl: Duration,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        exp: (now + ttl).as_secs(),
        features: Some(Value::Array(features)),
    };
    jsonwebtoken::encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}
