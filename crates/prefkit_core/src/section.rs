//! Preference sections and the document they form.
//!
//! Every preference the editor knows about lives in one of four flat
//! sections. The server may omit sections (or the whole document) for a
//! fresh account; [`PartialDocument`] captures that wire shape and
//! merging it over [`PreferencesDocument::default()`] guarantees every
//! field always has a defined value on the client.

use serde::{Deserialize, Serialize};

/// One of the four preference categories.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferenceSection {
    Account,
    Notifications,
    Theme,
    Privacy,
}

impl PreferenceSection {
    pub const ALL: [PreferenceSection; 4] = [
        PreferenceSection::Account,
        PreferenceSection::Notifications,
        PreferenceSection::Theme,
        PreferenceSection::Privacy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PreferenceSection::Account => "account",
            PreferenceSection::Notifications => "notifications",
            PreferenceSection::Theme => "theme",
            PreferenceSection::Privacy => "privacy",
        }
    }

    /// Stable index into per-section bookkeeping tables.
    pub fn index(&self) -> usize {
        match self {
            PreferenceSection::Account => 0,
            PreferenceSection::Notifications => 1,
            PreferenceSection::Theme => 2,
            PreferenceSection::Privacy => 3,
        }
    }
}

/// Account identity fields. Phone is the only optional entry; an empty
/// string means "not provided".
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccountSettings {
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: String,
}

impl Default for AccountSettings {
    fn default() -> Self {
        Self {
            username: "default_user".to_string(),
            email: "default@example.com".to_string(),
            first_name: "Default".to_string(),
            last_name: "User".to_string(),
            phone: String::new(),
        }
    }
}

/// How often digest notifications are delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationFrequency {
    Immediate,
    Hourly,
    Daily,
    Weekly,
    Never,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationSettings {
    pub email_notifications: bool,
    pub push_notifications: bool,
    pub sms_notifications: bool,
    pub frequency: NotificationFrequency,
    pub marketing_emails: bool,
    pub security_alerts: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            email_notifications: true,
            push_notifications: true,
            sms_notifications: false,
            frequency: NotificationFrequency::Daily,
            marketing_emails: false,
            security_alerts: true,
        }
    }
}

/// The user-facing color scheme choice. `Auto` defers to the OS signal
/// and is resolved to an effective light/dark scheme at apply time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemeSetting {
    Light,
    Dark,
    Auto,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontSize {
    Small,
    Medium,
    Large,
    ExtraLarge,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LayoutMode {
    Standard,
    Compact,
    Spacious,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ThemeSettings {
    pub color_scheme: SchemeSetting,
    pub font_size: FontSize,
    pub layout: LayoutMode,
    pub animations: bool,
    pub compact_mode: bool,
}

impl Default for ThemeSettings {
    fn default() -> Self {
        Self {
            color_scheme: SchemeSetting::Light,
            font_size: FontSize::Medium,
            layout: LayoutMode::Standard,
            animations: true,
            compact_mode: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfileVisibility {
    Public,
    Friends,
    Private,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivacySettings {
    pub profile_visibility: ProfileVisibility,
    pub data_sharing: bool,
    pub analytics_tracking: bool,
    pub location_sharing: bool,
    pub activity_status: bool,
    pub searchable_profile: bool,
}

impl Default for PrivacySettings {
    fn default() -> Self {
        Self {
            profile_visibility: ProfileVisibility::Friends,
            data_sharing: false,
            analytics_tracking: true,
            location_sharing: false,
            activity_status: true,
            searchable_profile: true,
        }
    }
}

/// A fully populated preferences document. Invariant: every field has a
/// defined value at all times; there is no "unset" state on the client.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferencesDocument {
    pub account: AccountSettings,
    pub notifications: NotificationSettings,
    pub theme: ThemeSettings,
    pub privacy: PrivacySettings,
}

impl PreferencesDocument {
    /// Extract one section's values as an update payload.
    pub fn section(&self, section: PreferenceSection) -> SectionData {
        match section {
            PreferenceSection::Account => SectionData::Account(self.account.clone()),
            PreferenceSection::Notifications => {
                SectionData::Notifications(self.notifications.clone())
            }
            PreferenceSection::Theme => SectionData::Theme(self.theme.clone()),
            PreferenceSection::Privacy => SectionData::Privacy(self.privacy.clone()),
        }
    }

    /// Replace one section wholesale.
    pub fn set_section(&mut self, data: SectionData) {
        match data {
            SectionData::Account(v) => self.account = v,
            SectionData::Notifications(v) => self.notifications = v,
            SectionData::Theme(v) => self.theme = v,
            SectionData::Privacy(v) => self.privacy = v,
        }
    }
}

/// Wire shape of a fetched document: the server may omit any section.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PartialDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account: Option<AccountSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notifications: Option<NotificationSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privacy: Option<PrivacySettings>,
}

impl PartialDocument {
    /// Fill omitted sections from the compiled-in defaults.
    pub fn into_document(self) -> PreferencesDocument {
        PreferencesDocument {
            account: self.account.unwrap_or_default(),
            notifications: self.notifications.unwrap_or_default(),
            theme: self.theme.unwrap_or_default(),
            privacy: self.privacy.unwrap_or_default(),
        }
    }
}

impl From<PreferencesDocument> for PartialDocument {
    fn from(doc: PreferencesDocument) -> Self {
        PartialDocument {
            account: Some(doc.account),
            notifications: Some(doc.notifications),
            theme: Some(doc.theme),
            privacy: Some(doc.privacy),
        }
    }
}

/// One section's values, tagged by section. Serializes as
/// `{"<section>": { ... }}`, the shape the preferences API accepts for
/// updates and returns as the confirmed value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SectionData {
    Account(AccountSettings),
    Notifications(NotificationSettings),
    Theme(ThemeSettings),
    Privacy(PrivacySettings),
}

impl SectionData {
    pub fn section(&self) -> PreferenceSection {
        match self {
            SectionData::Account(_) => PreferenceSection::Account,
            SectionData::Notifications(_) => PreferenceSection::Notifications,
            SectionData::Theme(_) => PreferenceSection::Theme,
            SectionData::Privacy(_) => PreferenceSection::Privacy,
        }
    }
}

/// Payload for the password-change flow. Never stored in the document.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}
