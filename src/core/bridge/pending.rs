//! Table of requests waiting for a worker response.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::core::deferred::Deferred;
use crate::core::protocol::CorrelationId;

/// Maps correlation ids to the deferred awaiting that request.
///
/// An id is present exactly while its request is dispatched and unanswered.
pub(crate) struct PendingTable {
    entries: Mutex<HashMap<CorrelationId, Deferred<serde_json::Value>>>,
}

impl PendingTable {
    pub(crate) fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub(crate) fn insert(&self, id: CorrelationId, deferred: Deferred<serde_json::Value>) {
        let previous = self.entries.lock().insert(id, deferred);
        debug_assert!(previous.is_none(), "correlation id {id} reused");
    }

    pub(crate) fn remove(&self, id: CorrelationId) -> Option<Deferred<serde_json::Value>> {
        self.entries.lock().remove(&id)
    }

    pub(crate) fn contains(&self, id: CorrelationId) -> bool {
        self.entries.lock().contains_key(&id)
    }

    /// Empty the table, handing back what was outstanding.
    pub(crate) fn drain(&self) -> Vec<(CorrelationId, Deferred<serde_json::Value>)> {
        self.entries.lock().drain().collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
