//! Store state and the subscriber registry.

use std::sync::{Arc, Mutex, Weak};

use slotmap::{new_key_type, SlotMap};

use prefkit_core::{ErrorInfo, PreferencesDocument, ThemeSettings};

new_key_type! {
    /// Identifies one subscriber in the registry.
    pub struct SubscriberId;
}

/// Callback receiving the full state on every change.
pub type StateCallback = Arc<dyn Fn(&StoreState) + Send + Sync>;

/// Callback receiving the theme section only when it actually changed.
pub type ThemeCallback = Arc<dyn Fn(&ThemeSettings) + Send + Sync>;

/// The single source of truth the UI renders from.
///
/// Notifications always carry an internally consistent snapshot; a
/// subscriber never observes a half-updated document.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StoreState {
    pub document: PreferencesDocument,
    pub loading: bool,
    pub error: Option<ErrorInfo>,
}

#[derive(Clone, Copy, Debug)]
pub(crate) enum SubscriberKind {
    State,
    Theme,
}

/// Subscriber registry. Iteration follows insertion order, though
/// callers must not depend on cross-subscriber ordering.
#[derive(Default)]
pub(crate) struct Registry {
    state_subs: SlotMap<SubscriberId, StateCallback>,
    state_order: Vec<SubscriberId>,
    theme_subs: SlotMap<SubscriberId, ThemeCallback>,
    theme_order: Vec<SubscriberId>,
}

impl Registry {
    pub(crate) fn add_state(&mut self, cb: StateCallback) -> SubscriberId {
        let id = self.state_subs.insert(cb);
        self.state_order.push(id);
        id
    }

    pub(crate) fn add_theme(&mut self, cb: ThemeCallback) -> SubscriberId {
        let id = self.theme_subs.insert(cb);
        self.theme_order.push(id);
        id
    }

    pub(crate) fn remove(&mut self, kind: SubscriberKind, id: SubscriberId) {
        match kind {
            SubscriberKind::State => {
                self.state_subs.remove(id);
                self.state_order.retain(|entry| *entry != id);
            }
            SubscriberKind::Theme => {
                self.theme_subs.remove(id);
                self.theme_order.retain(|entry| *entry != id);
            }
        }
    }

    pub(crate) fn state_callbacks(&self) -> Vec<StateCallback> {
        self.state_order
            .iter()
            .filter_map(|id| self.state_subs.get(*id).cloned())
            .collect()
    }

    pub(crate) fn theme_callbacks(&self) -> Vec<ThemeCallback> {
        self.theme_order
            .iter()
            .filter_map(|id| self.theme_subs.get(*id).cloned())
            .collect()
    }
}

/// Disposer returned by `subscribe`. Dropping it (or calling
/// [`Subscription::unsubscribe`]) removes the callback; call
/// [`Subscription::detach`] to keep the subscription for the life of
/// the store.
pub struct Subscription {
    registry: Weak<Mutex<Registry>>,
    kind: SubscriberKind,
    id: SubscriberId,
    detached: bool,
}

impl Subscription {
    pub(crate) fn new(
        registry: Weak<Mutex<Registry>>,
        kind: SubscriberKind,
        id: SubscriberId,
    ) -> Self {
        Self {
            registry,
            kind,
            id,
            detached: false,
        }
    }

    /// Remove the callback now.
    pub fn unsubscribe(self) {
        // Drop does the work.
    }

    /// Leave the callback registered for the store's lifetime.
    pub fn detach(mut self) {
        self.detached = true;
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if self.detached {
            return;
        }
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().unwrap().remove(self.kind, self.id);
        }
    }
}
