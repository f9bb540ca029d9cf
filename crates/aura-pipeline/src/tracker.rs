//! Process-lifetime request tracking.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use chrono::Utc;
use uuid::Uuid;

use aura_types::{AggregatedResult, RequestRecord, RequestStatus, StageKind};

/// Cloneable handle over the id-keyed request map.
///
/// Uses `std::sync::RwLock` intentionally: all lock acquisitions are brief
/// HashMap operations (insert/get/update) that never span `.await` points,
/// making a synchronous lock safe and more efficient than
/// `tokio::sync::RwLock`.
///
/// Storage is process-lifetime only: entries are created on submission,
/// mutated by the orchestrator as stages advance, and removed only by
/// [`RequestTracker::clear`].
#[derive(Debug, Clone, Default)]
pub struct RequestTracker {
    requests: Arc<RwLock<HashMap<String, RequestRecord>>>,
}

impl RequestTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new request and returns its id.
    ///
    /// Ids are `req-<uuid v4>`: collision-free under concurrent submission,
    /// unlike wall-clock-derived schemes.
    pub fn submit(&self) -> String {
        let id = format!("req-{}", Uuid::new_v4());
        let record = RequestRecord {
            id: id.clone(),
            status: RequestStatus::Processing,
            started_at: Utc::now(),
            current_stage: None,
            result: None,
            error: None,
        };
        self.write().insert(id.clone(), record);
        id
    }

    /// Returns a snapshot of the request, or `None` for unknown ids.
    pub fn get(&self, id: &str) -> Option<RequestRecord> {
        self.read().get(id).cloned()
    }

    /// Marks the stage currently running. Called by the orchestrator only;
    /// this is the sole mutation path for request state during execution.
    pub fn advance(&self, id: &str, stage: StageKind) {
        if let Some(record) = self.write().get_mut(id) {
            record.current_stage = Some(stage);
        }
    }

    /// Transitions a request to its completed terminal state.
    pub fn complete(&self, id: &str, result: AggregatedResult) {
        if let Some(record) = self.write().get_mut(id) {
            record.status = RequestStatus::Completed;
            record.result = Some(result);
        }
    }

    /// Transitions a request to its error terminal state.
    pub fn fail(&self, id: &str, error: impl Into<String>) {
        if let Some(record) = self.write().get_mut(id) {
            record.status = RequestStatus::Error;
            record.error = Some(error.into());
        }
    }

    /// Administrative wipe of all tracked requests. Returns how many were
    /// removed. Never called implicitly.
    pub fn clear(&self) -> usize {
        let mut requests = self.write();
        let removed = requests.len();
        requests.clear();
        removed
    }

    /// Number of tracked requests.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// True when nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    // A poisoned lock means a writer panicked mid-update; the map itself is
    // still structurally sound, so recover the guard rather than unwinding
    // every caller.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, HashMap<String, RequestRecord>> {
        self.requests
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<String, RequestRecord>> {
        self.requests
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
