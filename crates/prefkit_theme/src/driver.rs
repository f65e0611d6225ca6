//! Tokio task that owns the engine, the debounce timer, the apply target
//! and the OS watcher guard.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;

use prefkit_core::ThemeSettings;
use prefkit_store::{PreferencesStore, Subscription};

use crate::apply::ApplyTarget;
use crate::engine::{ThemeEngine, TimerDecision, WatchDirective};
use crate::source::{SchemeSource, WatchGuard};

enum Command {
    ThemeChanged(ThemeSettings),
    OsChanged,
}

/// Cheap, cloneable front door to a running engine task. The task shuts
/// down once every handle is dropped.
#[derive(Clone)]
pub struct ThemeEngineHandle {
    tx: mpsc::UnboundedSender<Command>,
}

impl ThemeEngineHandle {
    /// Feeds new theme settings into the debounce window.
    pub fn theme_changed(&self, settings: ThemeSettings) {
        let _ = self.tx.send(Command::ThemeChanged(settings));
    }

    /// Reports an OS scheme flip. Ignored unless the scheme is auto.
    pub fn os_scheme_changed(&self) {
        let _ = self.tx.send(Command::OsChanged);
    }

    /// Hook for save-success handlers. Same debounce path as a store
    /// notification, so a burst of saves still applies once.
    pub fn apply_now(&self, settings: ThemeSettings) {
        self.theme_changed(settings);
    }
}

/// The watcher callback holds only a weak sender so it never keeps the
/// task alive on its own.
struct WeakHandle {
    tx: mpsc::WeakUnboundedSender<Command>,
}

impl WeakHandle {
    fn os_scheme_changed(&self) {
        if let Some(tx) = self.tx.upgrade() {
            let _ = tx.send(Command::OsChanged);
        }
    }
}

/// Spawns the engine task. Must be called from within a tokio runtime.
pub fn spawn_engine<T>(
    mut engine: ThemeEngine,
    mut target: T,
    source: Arc<dyn SchemeSource>,
) -> (ThemeEngineHandle, JoinHandle<()>)
where
    T: ApplyTarget,
{
    let (tx, mut rx) = mpsc::unbounded_channel();
    let weak = tx.downgrade();
    let handle = ThemeEngineHandle { tx };

    let task = tokio::spawn(async move {
        let mut deadline: Option<Instant> = None;
        let mut watch_guard: Option<WatchGuard> = None;

        loop {
            tokio::select! {
                cmd = rx.recv() => {
                    let Some(cmd) = cmd else { break };
                    let now = Instant::now();
                    let armed = match cmd {
                        Command::ThemeChanged(settings) => {
                            tracing::debug!("theme trigger");
                            engine.theme_changed(settings, now)
                        }
                        Command::OsChanged => engine.os_scheme_changed(now),
                    };
                    if let Some(next) = armed {
                        deadline = Some(next);
                    }
                }
                _ = sleep_until_or_never(deadline) => {
                    match engine.timer_fired(Instant::now(), source.current()) {
                        TimerDecision::NotYet { deadline: next } => deadline = Some(next),
                        TimerDecision::Apply(snapshot) => {
                            let applied = match target.apply(&snapshot) {
                                Ok(()) => {
                                    tracing::debug!(scheme = %snapshot.scheme, "theme applied");
                                    Some(snapshot)
                                }
                                Err(err) => {
                                    tracing::warn!("{err}");
                                    None
                                }
                            };
                            let after = engine.apply_finished(applied, Instant::now());
                            match after.watch {
                                WatchDirective::Install => {
                                    let weak = WeakHandle { tx: weak.clone() };
                                    watch_guard = Some(source.watch(Box::new(move || {
                                        weak.os_scheme_changed();
                                    })));
                                }
                                WatchDirective::Remove => {
                                    watch_guard = None;
                                }
                                WatchDirective::Keep => {}
                            }
                            deadline = after.next_deadline;
                        }
                    }
                }
            }
        }

        drop(watch_guard);
    });

    (handle, task)
}

async fn sleep_until_or_never(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Forwards the store's theme notifications into the engine, replaying
/// the current theme immediately. Dropping the subscription disconnects
/// the store from the engine.
pub fn bind_store(store: &PreferencesStore, handle: &ThemeEngineHandle) -> Subscription {
    let handle = handle.clone();
    store.subscribe_theme(move |theme| handle.theme_changed(theme.clone()))
}
