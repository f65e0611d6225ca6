//! PrefKit Theme
//!
//! Turns stored theme settings into applied themes. Triggers are
//! debounced so a burst of edits produces a single apply carrying the
//! latest values; `auto` is resolved against the OS color scheme, and an
//! OS watcher is kept installed exactly while the setting is `auto`.
//!
//! The engine itself ([`ThemeEngine`]) is a pure state machine. The
//! driver ([`spawn_engine`]) runs it on a tokio task and
//! [`bind_store`] connects it to a [`prefkit_store::PreferencesStore`].
//!
//! # Example
//!
//! ```rust,ignore
//! let source = Arc::new(SharedSchemeSource::new(ColorScheme::Light));
//! let engine = ThemeEngine::new(store.state().document.theme.clone());
//! let (handle, _task) = spawn_engine(engine, target, source.clone());
//! let _sub = bind_store(&store, &handle);
//! ```

pub mod apply;
pub mod driver;
pub mod engine;
pub mod scheme;
pub mod snapshot;
pub mod source;

pub use apply::{ApplyError, ApplyTarget, RecordingTarget};
pub use driver::{bind_store, spawn_engine, ThemeEngineHandle};
pub use engine::{AfterApply, EnginePhase, ThemeEngine, TimerDecision, WatchDirective, DEBOUNCE_WINDOW};
pub use scheme::{font_size_px, resolve_scheme, ColorScheme};
pub use snapshot::ThemeSnapshot;
pub use source::{SchemeSource, SharedSchemeSource, WatchGuard};
