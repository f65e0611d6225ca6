//! Debounce state machine for theme application.
//!
//! The engine is a pure state machine; the driver owns the timer and the
//! apply target and feeds events in. Triggers within the debounce window
//! coalesce into one apply carrying the most recent settings. A trigger
//! that lands while an apply is in flight is captured and starts a fresh
//! cycle once the apply completes.

use tokio::time::{Duration, Instant};

use prefkit_core::{SchemeSetting, ThemeSettings};

use crate::scheme::ColorScheme;
use crate::snapshot::ThemeSnapshot;

/// How long a burst of triggers is allowed to coalesce.
pub const DEBOUNCE_WINDOW: Duration = Duration::from_millis(100);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnginePhase {
    /// No work pending.
    Idle,
    /// Debounce timer armed; more triggers reset it.
    Pending,
    /// A snapshot has been handed to the target.
    Applying,
}

/// Outcome of a timer expiry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TimerDecision {
    /// The timer woke before the (reset) deadline; sleep again.
    NotYet { deadline: Instant },
    /// The window closed; apply this snapshot.
    Apply(ThemeSnapshot),
}

/// Watcher bookkeeping emitted when an apply completes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WatchDirective {
    Keep,
    /// Entered auto: install the OS scheme watcher.
    Install,
    /// Left auto: remove it.
    Remove,
}

/// What the driver does after reporting an apply result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AfterApply {
    /// Set when a trigger arrived mid-apply and a fresh cycle is armed.
    pub next_deadline: Option<Instant>,
    pub watch: WatchDirective,
}

pub struct ThemeEngine {
    phase: EnginePhase,
    debounce: Duration,
    /// Settings as of the last apply (or construction).
    settings: ThemeSettings,
    /// Most recent trigger payload, not yet applied.
    queued: Option<ThemeSettings>,
    deadline: Option<Instant>,
    /// An OS event landed mid-apply and must re-arm afterwards.
    rearm: bool,
    watching: bool,
    last_applied: Option<ThemeSnapshot>,
}

impl ThemeEngine {
    pub fn new(settings: ThemeSettings) -> Self {
        Self::with_debounce(settings, DEBOUNCE_WINDOW)
    }

    pub fn with_debounce(settings: ThemeSettings, debounce: Duration) -> Self {
        Self {
            phase: EnginePhase::Idle,
            debounce,
            settings,
            queued: None,
            deadline: None,
            rearm: false,
            watching: false,
            last_applied: None,
        }
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    pub fn settings(&self) -> &ThemeSettings {
        &self.settings
    }

    pub fn last_applied(&self) -> Option<&ThemeSnapshot> {
        self.last_applied.as_ref()
    }

    /// The settings the next apply would use.
    fn effective_settings(&self) -> &ThemeSettings {
        self.queued.as_ref().unwrap_or(&self.settings)
    }

    /// Theme settings changed. Returns the new deadline when the timer
    /// must be (re)armed.
    pub fn theme_changed(&mut self, settings: ThemeSettings, now: Instant) -> Option<Instant> {
        self.queued = Some(settings);
        self.arm(now)
    }

    /// The OS scheme flipped. Ignored unless the effective setting is
    /// auto; an explicit light or dark choice does not track the OS.
    pub fn os_scheme_changed(&mut self, now: Instant) -> Option<Instant> {
        if self.effective_settings().color_scheme != SchemeSetting::Auto {
            tracing::debug!("os scheme change ignored, scheme is explicit");
            return None;
        }
        self.arm(now)
    }

    fn arm(&mut self, now: Instant) -> Option<Instant> {
        match self.phase {
            EnginePhase::Idle | EnginePhase::Pending => {
                // Every trigger restarts the window.
                let deadline = now + self.debounce;
                self.phase = EnginePhase::Pending;
                self.deadline = Some(deadline);
                Some(deadline)
            }
            EnginePhase::Applying => {
                self.rearm = true;
                None
            }
        }
    }

    /// The driver's timer fired. Only meaningful in the pending phase.
    pub fn timer_fired(&mut self, now: Instant, os: ColorScheme) -> TimerDecision {
        debug_assert_eq!(self.phase, EnginePhase::Pending);
        if let Some(deadline) = self.deadline {
            if now < deadline {
                return TimerDecision::NotYet { deadline };
            }
        }
        if let Some(settings) = self.queued.take() {
            self.settings = settings;
        }
        self.deadline = None;
        self.phase = EnginePhase::Applying;
        TimerDecision::Apply(ThemeSnapshot::resolve(&self.settings, os))
    }

    /// The apply finished. `applied` is `None` when the target failed;
    /// the engine still returns to idle so later triggers recover.
    pub fn apply_finished(&mut self, applied: Option<ThemeSnapshot>, now: Instant) -> AfterApply {
        debug_assert_eq!(self.phase, EnginePhase::Applying);
        if let Some(snapshot) = applied {
            self.last_applied = Some(snapshot);
        }

        let wants_watch = self.settings.color_scheme == SchemeSetting::Auto;
        let watch = match (self.watching, wants_watch) {
            (false, true) => {
                self.watching = true;
                WatchDirective::Install
            }
            (true, false) => {
                self.watching = false;
                WatchDirective::Remove
            }
            _ => WatchDirective::Keep,
        };

        self.phase = EnginePhase::Idle;
        let rearm = self.queued.is_some() || self.rearm;
        self.rearm = false;
        let next_deadline = if rearm { self.arm(now) } else { None };
        AfterApply {
            next_deadline,
            watch,
        }
    }
}
