//! Preferences client and the single-refresh retry contract.
//!
//! Two seams: [`PreferencesTransport`] is the raw wire (every call takes
//! an access token and can come back `Unauthorized`), and
//! [`PreferencesClient`] is what the store consumes. [`RetryingClient`]
//! bridges them: on a 401 it refreshes once via the auth gateway and
//! replays the original call once; a second 401 clears the session and
//! surfaces `PrefsError::Auth`. Never a retry loop.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, warn};

use prefkit_core::{PartialDocument, PasswordChange, PrefsError, SectionData};

use crate::auth::{AuthGateway, TokenPair};

/// Raw transport failure. `Unauthorized` is the only variant the retry
/// wrapper acts on; everything else passes through as a network error.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("unauthorized")]
    Unauthorized,

    #[error("transport error: {0}")]
    Transport(String),
}

/// The wire. Implementations perform the actual HTTP calls; the core
/// only depends on this shape.
#[async_trait]
pub trait PreferencesTransport: Send + Sync {
    /// `Ok(None)` means "no preferences exist yet" and is distinct from
    /// a transport failure.
    async fn fetch(&self, access_token: &str) -> Result<Option<PartialDocument>, ApiError>;

    /// Returns the server-confirmed section value.
    async fn save(&self, access_token: &str, data: &SectionData) -> Result<SectionData, ApiError>;

    async fn change_password(
        &self,
        access_token: &str,
        change: &PasswordChange,
    ) -> Result<(), ApiError>;

    /// Exchange a refresh token for a new token pair.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError>;
}

/// What the store talks to. Token handling is already resolved at this
/// level; omitted sections are already filled with defaults.
#[async_trait]
pub trait PreferencesClient: Send + Sync {
    async fn fetch(&self) -> Result<Option<prefkit_core::PreferencesDocument>, PrefsError>;

    async fn save(&self, data: SectionData) -> Result<SectionData, PrefsError>;

    async fn change_password(&self, change: PasswordChange) -> Result<(), PrefsError>;
}

/// [`PreferencesClient`] over a transport and gateway, implementing the
/// refresh-then-replay-exactly-once contract.
pub struct RetryingClient<T, G> {
    transport: T,
    gateway: G,
}

impl<T, G> RetryingClient<T, G>
where
    T: PreferencesTransport,
    G: AuthGateway,
{
    pub fn new(transport: T, gateway: G) -> Self {
        Self { transport, gateway }
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn access_token(&self) -> Result<String, PrefsError> {
        self.gateway.access_token().ok_or(PrefsError::Auth)
    }

    /// One refresh attempt. Any failure here ends the session.
    async fn refresh_once(&self) -> Result<String, PrefsError> {
        let Some(refresh) = self.gateway.refresh_token() else {
            warn!("401 with no refresh token, session over");
            self.gateway.clear_tokens();
            return Err(PrefsError::Auth);
        };
        match self.transport.refresh(&refresh).await {
            Ok(pair) => {
                debug!("access token refreshed after 401");
                self.gateway.set_tokens(&pair.access, &pair.refresh);
                Ok(pair.access)
            }
            Err(err) => {
                warn!("token refresh failed: {err}");
                self.gateway.clear_tokens();
                Err(PrefsError::Auth)
            }
        }
    }

    /// Map a replayed call's failure. A second 401 is an auth failure,
    /// never another retry.
    fn replay_error(&self, err: ApiError) -> PrefsError {
        match err {
            ApiError::Unauthorized => {
                warn!("401 after refresh, session over");
                self.gateway.clear_tokens();
                PrefsError::Auth
            }
            ApiError::Transport(msg) => PrefsError::Network(msg),
        }
    }
}

#[async_trait]
impl<T, G> PreferencesClient for RetryingClient<T, G>
where
    T: PreferencesTransport,
    G: AuthGateway,
{
    async fn fetch(&self) -> Result<Option<prefkit_core::PreferencesDocument>, PrefsError> {
        let token = self.access_token()?;
        let partial = match self.transport.fetch(&token).await {
            Ok(partial) => partial,
            Err(ApiError::Unauthorized) => {
                let token = self.refresh_once().await?;
                self.transport
                    .fetch(&token)
                    .await
                    .map_err(|e| self.replay_error(e))?
            }
            Err(ApiError::Transport(msg)) => return Err(PrefsError::Network(msg)),
        };
        Ok(partial.map(PartialDocument::into_document))
    }

    async fn save(&self, data: SectionData) -> Result<SectionData, PrefsError> {
        let token = self.access_token()?;
        match self.transport.save(&token, &data).await {
            Ok(confirmed) => Ok(confirmed),
            Err(ApiError::Unauthorized) => {
                let token = self.refresh_once().await?;
                self.transport
                    .save(&token, &data)
                    .await
                    .map_err(|e| self.replay_error(e))
            }
            Err(ApiError::Transport(msg)) => Err(PrefsError::Network(msg)),
        }
    }

    async fn change_password(&self, change: PasswordChange) -> Result<(), PrefsError> {
        let token = self.access_token()?;
        match self.transport.change_password(&token, &change).await {
            Ok(()) => Ok(()),
            Err(ApiError::Unauthorized) => {
                let token = self.refresh_once().await?;
                self.transport
                    .change_password(&token, &change)
                    .await
                    .map_err(|e| self.replay_error(e))
            }
            Err(ApiError::Transport(msg)) => Err(PrefsError::Network(msg)),
        }
    }
}
