//! Token storage seam.
//!
//! The auth gateway owns the access/refresh token pair. Token
//! cryptography and login flows live outside the core; consumers only
//! need these accessors plus the replace/clear operations the
//! refresh-and-replay wrapper performs.

use std::sync::RwLock;

/// An access/refresh token pair as returned by the token endpoint.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenPair {
    pub access: String,
    pub refresh: String,
}

/// Holds and returns the session tokens.
pub trait AuthGateway: Send + Sync {
    fn access_token(&self) -> Option<String>;
    fn refresh_token(&self) -> Option<String>;
    fn set_tokens(&self, access: &str, refresh: &str);
    fn clear_tokens(&self);

    fn is_authenticated(&self) -> bool {
        self.access_token().is_some()
    }

    fn has_refresh_token(&self) -> bool {
        self.refresh_token().is_some()
    }
}

/// In-memory gateway. The browser original kept tokens in
/// `localStorage`; in-process storage satisfies the same contract for
/// everything the core needs.
#[derive(Debug, Default)]
pub struct MemoryAuthGateway {
    tokens: RwLock<Option<TokenPair>>,
}

impl MemoryAuthGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tokens(access: &str, refresh: &str) -> Self {
        let gateway = Self::new();
        gateway.set_tokens(access, refresh);
        gateway
    }
}

impl AuthGateway for MemoryAuthGateway {
    fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap()
            .as_ref()
            .map(|t| t.access.clone())
    }

    fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .unwrap()
            .as_ref()
            .map(|t| t.refresh.clone())
    }

    fn set_tokens(&self, access: &str, refresh: &str) {
        tracing::debug!("auth tokens replaced");
        *self.tokens.write().unwrap() = Some(TokenPair {
            access: access.to_string(),
            refresh: refresh.to_string(),
        });
    }

    fn clear_tokens(&self) {
        tracing::debug!("auth tokens cleared");
        *self.tokens.write().unwrap() = None;
    }
}
