//! The preferences store.
//!
//! Owns [`StoreState`] and is the only component permitted to mutate
//! it. Updates are proposals: nothing is written to the shared document
//! until the server confirms a value, so failure rollback is a no-op
//! rather than a reconstructed diff. Saves for the same section queue
//! in submission order behind a fair per-section mutex; saves for
//! different sections run concurrently.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{debug, warn};

use prefkit_client::PreferencesClient;
use prefkit_core::{
    validate_password_change, validate_section, AccountSettings, ErrorInfo, NotificationSettings,
    PasswordChange, PreferenceSection, PreferencesDocument, PrefsError, PrivacySettings,
    SectionData, ThemeSettings,
};

use crate::state::{
    Registry, StateCallback, StoreState, SubscriberKind, Subscription, ThemeCallback,
};

/// Per-section bookkeeping: a fair FIFO queue for in-flight saves and a
/// generation counter that detects when the document moved on while a
/// save was in flight.
struct SectionLane {
    queue: tokio::sync::Mutex<()>,
    generation: AtomicU64,
}

impl SectionLane {
    fn new() -> Self {
        Self {
            queue: tokio::sync::Mutex::new(()),
            generation: AtomicU64::new(0),
        }
    }
}

struct StoreInner {
    client: Arc<dyn PreferencesClient>,
    state: Mutex<StoreState>,
    registry: Arc<Mutex<Registry>>,
    /// Serializes snapshot-and-deliver so no subscriber ever receives an
    /// older snapshot after a newer one.
    notify: Mutex<()>,
    in_flight: AtomicUsize,
    lanes: [SectionLane; 4],
}

/// Reactive store for preference data. Cheap to clone; clones share
/// state and subscribers.
#[derive(Clone)]
pub struct PreferencesStore {
    inner: Arc<StoreInner>,
}

/// Partial state merge for auxiliary flows. `None` fields are left
/// untouched; `error: Some(None)` clears the current error.
#[derive(Clone, Debug, Default)]
pub struct StatePatch {
    pub account: Option<AccountSettings>,
    pub notifications: Option<NotificationSettings>,
    pub theme: Option<ThemeSettings>,
    pub privacy: Option<PrivacySettings>,
    pub loading: Option<bool>,
    pub error: Option<Option<ErrorInfo>>,
}

impl PreferencesStore {
    pub fn new(client: Arc<dyn PreferencesClient>) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                client,
                state: Mutex::new(StoreState::default()),
                registry: Arc::new(Mutex::new(Registry::default())),
                notify: Mutex::new(()),
                in_flight: AtomicUsize::new(0),
                lanes: [
                    SectionLane::new(),
                    SectionLane::new(),
                    SectionLane::new(),
                    SectionLane::new(),
                ],
            }),
        }
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> StoreState {
        self.inner.state.lock().unwrap().clone()
    }

    /// Register a callback for every state change. The callback is
    /// invoked immediately with the current state.
    ///
    /// Deliveries are serialized: the replay happens before any later
    /// change is handed to this subscriber. Callbacks must not
    /// synchronously write back into the store.
    pub fn subscribe(&self, cb: impl Fn(&StoreState) + Send + Sync + 'static) -> Subscription {
        let cb: StateCallback = Arc::new(cb);
        // Same critical section as `mutate`: register and replay before
        // any concurrent change can reach this subscriber.
        let _order = self.inner.notify.lock().unwrap();
        let id = self
            .inner
            .registry
            .lock()
            .unwrap()
            .add_state(Arc::clone(&cb));
        let snapshot = self.state();
        cb(&snapshot);
        Subscription::new(
            Arc::downgrade(&self.inner.registry),
            SubscriberKind::State,
            id,
        )
    }

    /// Register a callback invoked only when the theme section changes.
    /// Replays the current theme immediately.
    pub fn subscribe_theme(
        &self,
        cb: impl Fn(&ThemeSettings) + Send + Sync + 'static,
    ) -> Subscription {
        let cb: ThemeCallback = Arc::new(cb);
        let _order = self.inner.notify.lock().unwrap();
        let id = self
            .inner
            .registry
            .lock()
            .unwrap()
            .add_theme(Arc::clone(&cb));
        let theme = self.state().document.theme.clone();
        cb(&theme);
        Subscription::new(
            Arc::downgrade(&self.inner.registry),
            SubscriberKind::Theme,
            id,
        )
    }

    /// Apply a mutation and notify subscribers with a consistent
    /// snapshot. Theme subscribers fire first when the theme section
    /// changed, then every state subscriber, matching the original
    /// notification order.
    fn mutate(&self, f: impl FnOnce(&mut StoreState)) {
        // Held across snapshot and delivery so two concurrent mutations
        // cannot reach subscribers in the wrong order.
        let _order = self.inner.notify.lock().unwrap();
        let (snapshot, theme_changed) = {
            let mut state = self.inner.state.lock().unwrap();
            let old_theme = state.document.theme.clone();
            f(&mut state);
            let changed = state.document.theme != old_theme;
            (state.clone(), changed)
        };

        let (theme_cbs, state_cbs) = {
            let registry = self.inner.registry.lock().unwrap();
            (
                if theme_changed {
                    registry.theme_callbacks()
                } else {
                    Vec::new()
                },
                registry.state_callbacks(),
            )
        };

        for cb in theme_cbs {
            cb(&snapshot.document.theme);
        }
        for cb in state_cbs {
            cb(&snapshot);
        }
    }

    fn begin(&self) {
        self.inner.in_flight.fetch_add(1, Ordering::SeqCst);
        self.mutate(|state| {
            state.loading = true;
            state.error = None;
        });
    }

    fn finish(&self, f: impl FnOnce(&mut StoreState)) {
        self.inner.in_flight.fetch_sub(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        self.mutate(move |state| {
            f(state);
            state.loading = inner.in_flight.load(Ordering::SeqCst) > 0;
        });
    }

    fn lane(&self, section: PreferenceSection) -> &SectionLane {
        &self.inner.lanes[section.index()]
    }

    /// Fetch the full document from the server.
    ///
    /// On success the document is replaced wholesale; a server `null`
    /// falls back to the compiled-in defaults so every field stays
    /// defined. On failure the previous document is preserved, the
    /// error is recorded, and the error is rethrown for the caller to
    /// decide on fallback display.
    pub async fn load_preferences(&self) -> Result<PreferencesDocument, PrefsError> {
        self.begin();
        match self.inner.client.fetch().await {
            Ok(fetched) => {
                if fetched.is_none() {
                    debug!("no preferences stored, using defaults");
                }
                let document = fetched.unwrap_or_default();
                let committed = document.clone();
                let lanes = &self.inner.lanes;
                // Bumping inside the same critical section as the
                // replacement keeps in-flight saves from landing between
                // the two.
                self.finish(move |state| {
                    for lane in lanes {
                        lane.generation.fetch_add(1, Ordering::SeqCst);
                    }
                    state.document = committed;
                    state.error = None;
                });
                Ok(document)
            }
            Err(err) => {
                warn!("preferences load failed: {err}");
                let info = ErrorInfo::from(&err);
                self.finish(move |state| state.error = Some(info));
                Err(err)
            }
        }
    }

    /// Propose new values for one section.
    ///
    /// Validation runs first; an invalid payload is refused before any
    /// network call and without mutating state. A valid proposal is
    /// sent to the server and the **server-returned** value is
    /// committed — client input is a proposal, never truth. On failure
    /// the section keeps its prior value and the error is recorded.
    ///
    /// Saves for the same section queue in submission order; a save
    /// whose result arrives after the document already moved on (for
    /// example a reload finished mid-flight) is discarded.
    pub async fn update_section(&self, data: SectionData) -> Result<SectionData, PrefsError> {
        validate_section(&data).map_err(PrefsError::Validation)?;

        let section = data.section();
        let lane = self.lane(section);
        let _slot = lane.queue.lock().await;
        let ticket = lane.generation.load(Ordering::SeqCst);

        self.begin();
        match self.inner.client.save(data).await {
            Ok(confirmed) => {
                let committed = confirmed.clone();
                // Compare-and-commit is a single step under the state
                // lock; a reload cannot slip between the generation
                // check and the write.
                self.finish(move |state| {
                    if lane.generation.load(Ordering::SeqCst) == ticket {
                        lane.generation.fetch_add(1, Ordering::SeqCst);
                        state.document.set_section(committed);
                        state.error = None;
                    } else {
                        debug!(
                            section = section.as_str(),
                            "discarding save result, document moved on"
                        );
                    }
                });
                Ok(confirmed)
            }
            Err(err) => {
                // The proposal was never written, so the prior value
                // already stands.
                warn!(section = section.as_str(), "save failed: {err}");
                let info = ErrorInfo::from(&err);
                self.finish(move |state| state.error = Some(info));
                Err(err)
            }
        }
    }

    /// Low-level partial merge used by auxiliary flows. Feeds the same
    /// notification pipeline as `update_section`.
    pub fn set_state(&self, patch: StatePatch) {
        let lanes = &self.inner.lanes;
        self.mutate(move |state| {
            if let Some(account) = patch.account {
                lanes[PreferenceSection::Account.index()]
                    .generation
                    .fetch_add(1, Ordering::SeqCst);
                state.document.account = account;
            }
            if let Some(notifications) = patch.notifications {
                lanes[PreferenceSection::Notifications.index()]
                    .generation
                    .fetch_add(1, Ordering::SeqCst);
                state.document.notifications = notifications;
            }
            if let Some(theme) = patch.theme {
                lanes[PreferenceSection::Theme.index()]
                    .generation
                    .fetch_add(1, Ordering::SeqCst);
                state.document.theme = theme;
            }
            if let Some(privacy) = patch.privacy {
                lanes[PreferenceSection::Privacy.index()]
                    .generation
                    .fetch_add(1, Ordering::SeqCst);
                state.document.privacy = privacy;
            }
            if let Some(loading) = patch.loading {
                state.loading = loading;
            }
            if let Some(error) = patch.error {
                state.error = error;
            }
        });
    }

    /// Change the account password. Not part of the document; the
    /// result flows through [`PreferencesStore::set_state`]-style
    /// loading/error bookkeeping only.
    pub async fn change_password(&self, change: PasswordChange) -> Result<(), PrefsError> {
        if let Err(errors) = validate_password_change(&change) {
            let err = PrefsError::Validation(errors);
            let info = ErrorInfo::from(&err);
            self.set_state(StatePatch {
                error: Some(Some(info)),
                ..StatePatch::default()
            });
            return Err(err);
        }

        self.begin();
        match self.inner.client.change_password(change).await {
            Ok(()) => {
                self.finish(|state| state.error = None);
                Ok(())
            }
            Err(err) => {
                warn!("password change failed: {err}");
                let info = ErrorInfo::from(&err);
                self.finish(move |state| state.error = Some(info));
                Err(err)
            }
        }
    }
}
