//! PrefKit Core
//!
//! Foundational types for the PrefKit preferences engine:
//!
//! - **Sections**: the four preference categories and the always-fully-
//!   populated document they form, with compiled-in defaults
//! - **Validation**: pure field predicates and form-level aggregation
//! - **Errors**: the `PrefsError` taxonomy and its state-resident
//!   `ErrorInfo` projection
//!
//! # Example
//!
//! ```rust
//! use prefkit_core::{validate_form, PreferencesDocument, SchemeSetting};
//!
//! let mut doc = PreferencesDocument::default();
//! assert!(validate_form(&doc).is_valid);
//!
//! doc.theme.color_scheme = SchemeSetting::Auto;
//! assert!(validate_form(&doc).is_valid);
//! ```

pub mod error;
pub mod section;
pub mod validate;

pub use error::{ErrorInfo, ErrorKind, PrefsError, ValidationErrors};
pub use section::{
    AccountSettings, FontSize, LayoutMode, NotificationFrequency, NotificationSettings,
    PartialDocument, PasswordChange, PreferenceSection, PreferencesDocument, PrivacySettings,
    ProfileVisibility, SchemeSetting, SectionData, ThemeSettings,
};
pub use validate::{
    validate_email, validate_form, validate_password, validate_password_change, validate_phone,
    validate_required, validate_section, validate_username, FormValidation,
};
