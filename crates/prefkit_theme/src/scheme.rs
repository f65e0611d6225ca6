//! Effective color scheme and its resolution against the OS signal.

use prefkit_core::{FontSize, SchemeSetting};

/// A concrete scheme as rendered. Unlike [`SchemeSetting`] there is no
/// `Auto` here; auto has already been resolved against the OS signal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorScheme {
    Light,
    Dark,
}

impl ColorScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColorScheme::Light => "light",
            ColorScheme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for ColorScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Resolves the stored scheme setting to a concrete scheme.
pub fn resolve_scheme(setting: SchemeSetting, os: ColorScheme) -> ColorScheme {
    match setting {
        SchemeSetting::Light => ColorScheme::Light,
        SchemeSetting::Dark => ColorScheme::Dark,
        SchemeSetting::Auto => os,
    }
}

/// Base font size in pixels for each named size.
pub fn font_size_px(size: FontSize) -> u16 {
    match size {
        FontSize::Small => 14,
        FontSize::Medium => 16,
        FontSize::Large => 18,
        FontSize::ExtraLarge => 20,
    }
}
