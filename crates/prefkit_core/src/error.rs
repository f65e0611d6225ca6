//! Error taxonomy for the preferences core.
//!
//! `PrefsError` is what operations return; `ErrorInfo` is the cloneable
//! projection that lives in store state for subscribers to display.
//! Nothing here is fatal: the worst outcome anywhere in the core is a
//! stale, unsaved UI state with a reported error.

use std::fmt;

use rustc_hash::FxHashMap;
use thiserror::Error;

/// Per-field validation failures, keyed by wire field name.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ValidationErrors {
    fields: FxHashMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Fold another error set into this one.
    pub fn merge(&mut self, other: ValidationErrors) {
        self.fields.extend(other.fields);
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self.fields.iter().collect();
        entries.sort();
        let joined = entries
            .iter()
            .map(|(field, msg)| format!("{field}: {msg}"))
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Everything a core operation can fail with.
#[derive(Debug, Error)]
pub enum PrefsError {
    /// Field-level failure. Resolved before any network call is made.
    #[error("validation failed ({0})")]
    Validation(ValidationErrors),

    /// A 401 survived the single refresh-and-replay attempt. The caller
    /// must send the user back to login.
    #[error("authentication required")]
    Auth,

    /// Fetch or save rejected for a non-auth reason. Prior state is
    /// preserved and the operation may be retried.
    #[error("network error: {0}")]
    Network(String),

    /// Theme application failed. Logged and non-fatal; the engine
    /// returns to idle.
    #[error("theme apply failed: {0}")]
    Apply(String),
}

/// Coarse error class, mirrored into [`ErrorInfo`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Auth,
    Network,
    Apply,
}

/// Cloneable error summary stored in `StoreState.error`.
#[derive(Clone, Debug, PartialEq)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
}

impl From<&PrefsError> for ErrorInfo {
    fn from(err: &PrefsError) -> Self {
        let kind = match err {
            PrefsError::Validation(_) => ErrorKind::Validation,
            PrefsError::Auth => ErrorKind::Auth,
            PrefsError::Network(_) => ErrorKind::Network,
            PrefsError::Apply(_) => ErrorKind::Apply,
        };
        ErrorInfo {
            kind,
            message: err.to_string(),
        }
    }
}
