use crate::message::WorkReport;
use dashmap::DashMap;
use std::fmt;
use tokio::sync::oneshot;

/// Correlation id for one outstanding work item, `<kind>_<uuid-v4>`.
///
/// The kind prefix keeps ids human-readable in logs; the uuid makes them
/// unique within (and across) process lifetimes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(String);

impl RequestId {
    /// Generate a fresh id for the given work kind, e.g. `email_3f2a…`.
    pub fn generate(kind: &str) -> Self {
        Self(format!("{}_{}", kind, uuid::Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for RequestId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Table of work items awaiting an asynchronous result, keyed by
/// correlation id.
///
/// [`PendingTable::remove`] is the single consumption point: whichever
/// caller removes an entry owns the right to complete its parked response,
/// so a report and a timeout racing for the same id can never both win.
pub struct PendingTable {
    pending: DashMap<RequestId, oneshot::Sender<WorkReport>>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self {
            pending: DashMap::new(),
        }
    }

    pub fn insert(&self, request_id: RequestId, responder: oneshot::Sender<WorkReport>) {
        self.pending.insert(request_id, responder);
    }

    /// Consume the entry for `request_id`, if still present.
    pub fn remove(&self, request_id: &RequestId) -> Option<oneshot::Sender<WorkReport>> {
        self.pending.remove(request_id).map(|(_, responder)| responder)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Default for PendingTable {
    fn default() -> Self {
        Self::new()
    }
}
