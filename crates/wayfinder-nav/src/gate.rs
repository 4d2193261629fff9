//! Request-scoped feature gate.
//!
//! # Purpose
//! Answers "may this request see feature X" by consulting the session
//! capability snapshot first and falling back to a live authority.
//!
//! # Key invariants
//! - Blank feature keys are always denied and never reach the authority.
//! - Keys present in the capability set are allowed without an authority call.
//! - Each key is resolved by the authority at most once per gate; concurrent
//!   checks of the same key share one resolution.
//! - Authority errors and timeouts deny (fail closed) and are only logged.
//!
//! # Concurrency
//! A gate is built per request and dropped with it. Nothing here is shared
//! across users, so a cached decision can never leak between sessions.
use crate::errors::{AuthorityError, AuthorityResult};
use crate::CapabilitySet;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Live source of truth consulted when the session snapshot lacks a key.
#[async_trait]
pub trait CapabilityAuthority: Send + Sync {
    async fn check(&self, feature: &str) -> AuthorityResult<bool>;
}

/// Authority that grants nothing beyond the session snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAllAuthority;

#[async_trait]
impl CapabilityAuthority for DenyAllAuthority {
    async fn check(&self, _feature: &str) -> AuthorityResult<bool> {
        Ok(false)
    }
}

pub struct FeatureGate {
    capabilities: CapabilitySet,
    authority: Arc<dyn CapabilityAuthority>,
    timeout: Option<Duration>,
    resolved: Mutex<HashMap<String, Arc<OnceCell<bool>>>>,
}

impl FeatureGate {
    pub fn new(capabilities: CapabilitySet, authority: Arc<dyn CapabilityAuthority>) -> Self {
        Self {
            capabilities,
            authority,
            timeout: None,
            resolved: Mutex::new(HashMap::new()),
        }
    }

    /// Bound every authority call; an expired check counts as denied.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn capabilities(&self) -> &CapabilitySet {
        &self.capabilities
    }

    /// Resolve whether `feature` is allowed for this request.
    pub async fn allows(&self, feature: &str) -> bool {
        if feature.trim().is_empty() {
            return false;
        }
        if self.capabilities.has(feature) {
            return true;
        }
        let cell = {
            let mut resolved = self.resolved.lock();
            resolved.entry(feature.to_string()).or_default().clone()
        };
        *cell.get_or_init(|| self.resolve(feature)).await
    }

    async fn resolve(&self, feature: &str) -> bool {
        let outcome = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, self.authority.check(feature)).await
            {
                Ok(result) => result,
                Err(_) => Err(AuthorityError::Timeout(limit)),
            },
            None => self.authority.check(feature).await,
        };
        match outcome {
            Ok(allowed) => {
                let label = if allowed { "allowed" } else { "denied" };
                metrics::counter!("wayfinder_gate_fallback_total", "outcome" => label)
                    .increment(1);
                tracing::debug!(feature, allowed, "authority resolved feature");
                allowed
            }
            Err(err) => {
                metrics::counter!("wayfinder_gate_fallback_total", "outcome" => "error")
                    .increment(1);
                tracing::warn!(feature, error = %err, "authority check failed; denying");
                false
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Authority with a fixed allow-list that counts every call.
    #[derive(Default)]
    pub(crate) struct CountingAuthority {
        pub(crate) allowed: HashSet<String>,
        pub(crate) calls: AtomicUsize,
        pub(crate) fail: bool,
        pub(crate) delay: Option<Duration>,
    }

    impl CountingAuthority {
        pub(crate) fn allowing(keys: &[&str]) -> Self {
            Self {
                allowed: keys.iter().map(|key| key.to_string()).collect(),
                ..Self::default()
            }
        }

        pub(crate) fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl CapabilityAuthority for CountingAuthority {
        async fn check(&self, feature: &str) -> AuthorityResult<bool> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(AuthorityError::Unavailable("authority offline".to_string()));
            }
            Ok(self.allowed.contains(feature))
        }
    }

    fn gate_with(caps: &[&str], authority: Arc<CountingAuthority>) -> FeatureGate {
        FeatureGate::new(CapabilitySet::build(caps.iter().copied()), authority)
    }

    #[tokio::test]
    async fn snapshot_keys_skip_the_authority() {
        let authority = Arc::new(CountingAuthority::default());
        let gate = gate_with(&["menu.mark2.admin", "menu.blog"], authority.clone());
        for key in ["menu.mark2.admin", "menu.blog", "menu.mark2.admin"] {
            assert!(gate.allows(key).await);
        }
        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn blank_keys_deny_without_fallback() {
        let authority = Arc::new(CountingAuthority::allowing(&[""]));
        let gate = gate_with(&[], authority.clone());
        assert!(!gate.allows("").await);
        assert!(!gate.allows("   ").await);
        assert_eq!(authority.calls(), 0);
    }

    #[tokio::test]
    async fn missing_keys_hit_the_authority_once() {
        let authority = Arc::new(CountingAuthority::allowing(&["menu.live"]));
        let gate = gate_with(&[], authority.clone());
        for _ in 0..5 {
            assert!(gate.allows("menu.live").await);
            assert!(!gate.allows("menu.other").await);
        }
        assert_eq!(authority.calls(), 2);
    }

    #[tokio::test]
    async fn concurrent_checks_share_one_resolution() {
        let authority = Arc::new(CountingAuthority {
            delay: Some(Duration::from_millis(20)),
            ..CountingAuthority::allowing(&["menu.slow"])
        });
        let gate = gate_with(&[], authority.clone());
        let checks = (0..8).map(|_| gate.allows("menu.slow"));
        let results = futures::future::join_all(checks).await;
        assert!(results.into_iter().all(|allowed| allowed));
        assert_eq!(authority.calls(), 1);
    }

    #[tokio::test]
    async fn authority_errors_fail_closed_and_are_memoized() {
        let authority = Arc::new(CountingAuthority {
            fail: true,
            ..CountingAuthority::allowing(&["menu.broken"])
        });
        let gate = gate_with(&[], authority.clone());
        assert!(!gate.allows("menu.broken").await);
        assert!(!gate.allows("menu.broken").await);
        assert_eq!(authority.calls(), 1);
    }

    #[tokio::test]
    async fn slow_authority_times_out_to_denied() {
        let authority = Arc::new(CountingAuthority {
            delay: Some(Duration::from_millis(200)),
            ..CountingAuthority::allowing(&["menu.slow"])
        });
        let gate = gate_with(&[], authority).with_timeout(Duration::from_millis(10));
        assert!(!gate.allows("menu.slow").await);
    }

    #[tokio::test]
    async fn deny_all_authority_only_honours_snapshot() {
        let gate = FeatureGate::new(
            CapabilitySet::build(["menu.a"]),
            Arc::new(DenyAllAuthority),
        );
        assert!(gate.allows("menu.a").await);
        assert!(!gate.allows("menu.b").await);
        assert_eq!(gate.capabilities().all(), ["menu.a"]);
    }
}
