//! Where the OS color-scheme signal comes from.

use std::sync::{Arc, Mutex, Weak};

use slotmap::{new_key_type, SlotMap};

use crate::scheme::ColorScheme;

new_key_type! {
    struct WatchId;
}

type WatchCallback = Arc<dyn Fn() + Send + Sync>;

/// Exposes the platform's preferred color scheme and change notifications
/// for it. The engine installs at most one watcher at a time, only while
/// the stored setting is auto.
pub trait SchemeSource: Send + Sync {
    /// The scheme the platform currently prefers.
    fn current(&self) -> ColorScheme;

    /// Registers a change callback. Dropping the guard removes it.
    fn watch(&self, on_change: Box<dyn Fn() + Send + Sync>) -> WatchGuard;
}

/// Removes the associated watcher on drop.
pub struct WatchGuard {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl WatchGuard {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for WatchGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

struct SourceInner {
    scheme: ColorScheme,
    watchers: SlotMap<WatchId, WatchCallback>,
}

/// A settable scheme source. Embedders bridge the real platform signal
/// into [`set`](SharedSchemeSource::set); tests drive it directly.
#[derive(Clone)]
pub struct SharedSchemeSource {
    inner: Arc<Mutex<SourceInner>>,
}

impl SharedSchemeSource {
    pub fn new(scheme: ColorScheme) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SourceInner {
                scheme,
                watchers: SlotMap::with_key(),
            })),
        }
    }

    /// Updates the scheme and notifies watchers. A write of the current
    /// value is a no-op.
    pub fn set(&self, scheme: ColorScheme) {
        let callbacks: Vec<WatchCallback> = {
            let mut inner = self.inner.lock().unwrap();
            if inner.scheme == scheme {
                return;
            }
            inner.scheme = scheme;
            inner.watchers.values().cloned().collect()
        };
        // Callbacks run outside the lock so they may re-enter the source.
        for callback in callbacks {
            callback();
        }
    }

    /// Number of live watchers. The engine keeps this at zero or one.
    pub fn watcher_count(&self) -> usize {
        self.inner.lock().unwrap().watchers.len()
    }
}

impl SchemeSource for SharedSchemeSource {
    fn current(&self) -> ColorScheme {
        self.inner.lock().unwrap().scheme
    }

    fn watch(&self, on_change: Box<dyn Fn() + Send + Sync>) -> WatchGuard {
        let id = self
            .inner
            .lock()
            .unwrap()
            .watchers
            .insert(Arc::from(on_change));
        let weak: Weak<Mutex<SourceInner>> = Arc::downgrade(&self.inner);
        WatchGuard::new(move || {
            if let Some(inner) = weak.upgrade() {
                inner.lock().unwrap().watchers.remove(id);
            }
        })
    }
}
