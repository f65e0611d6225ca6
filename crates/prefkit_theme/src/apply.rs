//! The seam between the engine and whatever actually renders the theme.

use std::sync::{Arc, Mutex};

use thiserror::Error;

use crate::snapshot::ThemeSnapshot;

/// A theme could not be written to the render surface.
#[derive(Debug, Error)]
#[error("theme apply failed: {0}")]
pub struct ApplyError(pub String);

/// Receives resolved snapshots from the engine. Implementations write
/// them to the actual surface (a DOM root, a style registry, a terminal
/// palette). Applying the same snapshot twice must be harmless.
pub trait ApplyTarget: Send + 'static {
    fn apply(&mut self, snapshot: &ThemeSnapshot) -> Result<(), ApplyError>;
}

/// Records every applied snapshot. Used in tests and demos.
#[derive(Clone, Default)]
pub struct RecordingTarget {
    log: Arc<Mutex<Vec<ThemeSnapshot>>>,
}

impl RecordingTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn applied(&self) -> Vec<ThemeSnapshot> {
        self.log.lock().unwrap().clone()
    }
}

impl ApplyTarget for RecordingTarget {
    fn apply(&mut self, snapshot: &ThemeSnapshot) -> Result<(), ApplyError> {
        self.log.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}
