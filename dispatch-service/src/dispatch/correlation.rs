// Callback Correlation Store
// Associates callback ids with pending step identity, consumed exactly once

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::models::{PublishConfig, StepKind};

/// Identity of a dispatched step awaiting its callback
#[derive(Debug, Clone)]
pub struct PendingStep {
    pub step_identifier: String,
    pub kind: StepKind,
    /// Publish configuration kept for artifact resolution on success
    pub publish: Option<PublishConfig>,
    pub stage_runtime_id: String,
    pub step_runtime_id: String,
}

/// Typed correlation store keyed by callback id. Entries are inserted at
/// submission time and removed on consumption (reconciliation or abort),
/// bounding memory to the number of in-flight steps.
#[derive(Debug, Default)]
pub struct CorrelationStore {
    inner: Mutex<HashMap<String, PendingStep>>,
}

impl CorrelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a pending step under its callback id
    pub fn insert(&self, callback_id: impl Into<String>, pending: PendingStep) {
        self.lock().insert(callback_id.into(), pending);
    }

    /// Consume the pending step for a callback id. A second take for the
    /// same id returns None.
    pub fn take(&self, callback_id: &str) -> Option<PendingStep> {
        self.lock().remove(callback_id)
    }

    /// Number of in-flight steps
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, PendingStep>> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}
