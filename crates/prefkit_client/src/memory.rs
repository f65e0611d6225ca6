//! In-memory preferences server.
//!
//! Reference transport for examples and integration tests: holds one
//! document, validates bearer tokens, and can expire the access token
//! on demand to exercise the refresh path.

use std::sync::Mutex;

use async_trait::async_trait;

use prefkit_core::{PartialDocument, PasswordChange, PreferencesDocument, SectionData};

use crate::auth::TokenPair;
use crate::client::{ApiError, PreferencesTransport};

struct ServerInner {
    document: Option<PreferencesDocument>,
    password: String,
    valid_access: Option<String>,
    valid_refresh: Option<String>,
    issued: u64,
}

pub struct MemoryServer {
    inner: Mutex<ServerInner>,
}

impl MemoryServer {
    /// `document: None` models an account with no stored preferences.
    pub fn new(document: Option<PreferencesDocument>) -> Self {
        Self {
            inner: Mutex::new(ServerInner {
                document,
                password: "Default123".to_string(),
                valid_access: None,
                valid_refresh: None,
                issued: 0,
            }),
        }
    }

    /// Issue a fresh token pair, invalidating earlier ones.
    pub fn issue_tokens(&self) -> TokenPair {
        let mut inner = self.inner.lock().unwrap();
        inner.issued += 1;
        let pair = TokenPair {
            access: format!("access-{}", inner.issued),
            refresh: format!("refresh-{}", inner.issued),
        };
        inner.valid_access = Some(pair.access.clone());
        inner.valid_refresh = Some(pair.refresh.clone());
        pair
    }

    /// Expire the current access token; the refresh token stays valid.
    pub fn expire_access(&self) {
        self.inner.lock().unwrap().valid_access = None;
    }

    /// Kill the whole session, refresh token included.
    pub fn revoke_session(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.valid_access = None;
        inner.valid_refresh = None;
    }

    pub fn document(&self) -> Option<PreferencesDocument> {
        self.inner.lock().unwrap().document.clone()
    }

    fn check_access(inner: &ServerInner, token: &str) -> Result<(), ApiError> {
        if inner.valid_access.as_deref() == Some(token) {
            Ok(())
        } else {
            Err(ApiError::Unauthorized)
        }
    }
}

#[async_trait]
impl PreferencesTransport for MemoryServer {
    async fn fetch(&self, access_token: &str) -> Result<Option<PartialDocument>, ApiError> {
        let inner = self.inner.lock().unwrap();
        Self::check_access(&inner, access_token)?;
        Ok(inner.document.clone().map(PartialDocument::from))
    }

    async fn save(&self, access_token: &str, data: &SectionData) -> Result<SectionData, ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_access(&inner, access_token)?;
        let document = inner.document.get_or_insert_with(PreferencesDocument::default);
        document.set_section(data.clone());
        Ok(document.section(data.section()))
    }

    async fn change_password(
        &self,
        access_token: &str,
        change: &PasswordChange,
    ) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_access(&inner, access_token)?;
        if inner.password != change.current_password {
            return Err(ApiError::Transport("current password is incorrect".to_string()));
        }
        inner.password = change.new_password.clone();
        Ok(())
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ApiError> {
        {
            let inner = self.inner.lock().unwrap();
            if inner.valid_refresh.as_deref() != Some(refresh_token) {
                return Err(ApiError::Unauthorized);
            }
        }
        Ok(self.issue_tokens())
    }
}
