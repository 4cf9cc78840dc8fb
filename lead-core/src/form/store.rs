use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::models::FormState;

use super::patch::{FormPatch, PatchError};

/// Holds the current answer snapshot.
///
/// Snapshots are immutable: each update swaps in a new [`Arc`], so a caller
/// holding an earlier snapshot keeps seeing exactly what it saw.
#[derive(Debug, Clone, Default)]
pub struct FormStateStore {
    current: Arc<FormState>,
}

impl FormStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> Arc<FormState> {
        Arc::clone(&self.current)
    }

    /// Merges `patch` into the current snapshot.
    ///
    /// An empty patch returns the current snapshot itself.
    pub fn update(&mut self, patch: &FormPatch) -> Arc<FormState> {
        if patch.is_empty() {
            return self.current();
        }
        debug!(modules = ?patch.modules(), "applying form patch");
        self.current = Arc::new(self.current.apply(patch));
        self.current()
    }

    /// Validates and merges a loosely-typed patch document.
    ///
    /// # Errors
    ///
    /// Returns [`PatchError`] when the document is malformed; the current
    /// snapshot is left as it was.
    pub fn update_json(&mut self, patch: &Value) -> Result<Arc<FormState>, PatchError> {
        let patch = FormPatch::from_json(patch)?;
        Ok(self.update(&patch))
    }

    pub fn reset(&mut self) -> Arc<FormState> {
        self.current = Arc::new(FormState::default());
        self.current()
    }
}
