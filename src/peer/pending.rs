// src/peer/pending.rs
// Pending-request table: one entry per outstanding request id, each holding
// the oneshot sender that settles the caller's future exactly once.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;
use tokio::sync::oneshot;
use tracing::debug;

use super::errors::PeerError;

type Settlement = oneshot::Sender<Result<Value, PeerError>>;

struct PendingEntry {
    // Kept for diagnostics only; the id is the map key.
    method: String,
    tx: Settlement,
}

/// Correlation map from request id to the caller awaiting its response.
///
/// Membership in the map means "awaiting a response, not yet closed, not yet
/// resolved". Settlement always removes the entry first, under the lock, so
/// for any id at most one of resolve/reject/close ever takes effect; the
/// losers find the id absent and do nothing.
#[derive(Clone, Default)]
pub struct PendingRequestTable {
    entries: Arc<Mutex<HashMap<u64, PendingEntry>>>,
}

impl PendingRequestTable {
    pub fn new() -> Self {
        PendingRequestTable {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Registers an outstanding request and returns the receiver its caller
    /// awaits. A duplicate id is refused rather than overwriting the entry
    /// already in flight.
    pub fn track(
        &self,
        id: u64,
        method: &str,
    ) -> Result<oneshot::Receiver<Result<Value, PeerError>>, PeerError> {
        let (tx, rx) = oneshot::channel();
        let mut entries = self.entries.lock().unwrap();

        if entries.contains_key(&id) {
            return Err(PeerError::DuplicateRequestId(id));
        }

        entries.insert(
            id,
            PendingEntry {
                method: method.to_string(),
                tx,
            },
        );

        Ok(rx)
    }

    /// Completes the entry for `id` with a success payload. Returns false
    /// when the id is not in the table (late duplicate, already swept), in
    /// which case nothing happens.
    pub fn resolve(&self, id: u64, data: Value) -> bool {
        let entry = self.entries.lock().unwrap().remove(&id);
        match entry {
            Some(entry) => {
                // The caller may have dropped its receiver; that is its
                // business, the entry is gone either way.
                let _ = entry.tx.send(Ok(data));
                true
            }
            None => false,
        }
    }

    /// Completes the entry for `id` with a failure. Same no-op contract as
    /// [`PendingRequestTable::resolve`] when the id is absent.
    pub fn reject(&self, id: u64, error: PeerError) -> bool {
        let entry = self.entries.lock().unwrap().remove(&id);
        match entry {
            Some(entry) => {
                let _ = entry.tx.send(Err(error));
                true
            }
            None => false,
        }
    }

    /// Sweeps the table on connection teardown: every still-pending caller
    /// gets a `PeerClosed` rejection and the table ends up empty.
    pub fn close_all(&self) {
        let drained: Vec<(u64, PendingEntry)> =
            self.entries.lock().unwrap().drain().collect();

        for (id, entry) in drained {
            debug!(id, method = %entry.method, "rejecting pending request, peer closed");
            let _ = entry.tx.send(Err(PeerError::PeerClosed));
        }
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}
