//! Fully resolved theme values, ready to hand to an apply target.

use std::collections::BTreeMap;

use prefkit_core::{LayoutMode, ThemeSettings};

use crate::scheme::{font_size_px, resolve_scheme, ColorScheme};

/// The resolved form of [`ThemeSettings`]: auto is replaced by a concrete
/// scheme and the named font size by its pixel value. Resolution is pure,
/// so equal inputs always produce an equal snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ThemeSnapshot {
    pub scheme: ColorScheme,
    pub font_size_px: u16,
    pub layout: LayoutMode,
    pub animations: bool,
    pub compact_mode: bool,
}

impl ThemeSnapshot {
    /// Resolves settings against the current OS scheme.
    pub fn resolve(settings: &ThemeSettings, os: ColorScheme) -> Self {
        Self {
            scheme: resolve_scheme(settings.color_scheme, os),
            font_size_px: font_size_px(settings.font_size),
            layout: settings.layout,
            animations: settings.animations,
            compact_mode: settings.compact_mode,
        }
    }

    /// The CSS custom properties this snapshot renders to. Animations are
    /// suppressed by pinning every transition to zero duration; when they
    /// are enabled the property is absent so stylesheet defaults apply.
    pub fn css_variable_map(&self) -> BTreeMap<&'static str, String> {
        let (background, text, border) = match self.scheme {
            ColorScheme::Dark => ("#1e1e1e", "#ffffff", "#333333"),
            ColorScheme::Light => ("#ffffff", "#000000", "#dadada"),
        };
        let mut vars = BTreeMap::new();
        vars.insert("--background-color", background.to_owned());
        vars.insert("--text-color", text.to_owned());
        vars.insert("--border-color", border.to_owned());
        vars.insert("--base-font-size", format!("{}px", self.font_size_px));
        if !self.animations {
            vars.insert("--animation-duration", "0ms".to_owned());
        }
        vars
    }
}
