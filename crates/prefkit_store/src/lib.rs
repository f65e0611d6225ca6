//! PrefKit Store
//!
//! The single mutable owner of preference state. Subscribers get a
//! consistent snapshot on every change (replay-on-subscribe included);
//! updates are validated before the network is touched, serialized per
//! section, and committed with the server-returned value so persisted
//! state never silently drifts from what the server holds.
//!
//! # Example
//!
//! ```rust,ignore
//! let store = PreferencesStore::new(client);
//! let _sub = store.subscribe(|state| render(state));
//!
//! store.load_preferences().await?;
//! store
//!     .update_section(SectionData::Theme(new_theme))
//!     .await?;
//! ```

pub mod state;
pub mod store;

pub use state::{StoreState, SubscriberId, Subscription};
pub use store::{PreferencesStore, StatePatch};
