//! Session-scoped cost accounting.
//!
//! The ledger is the only state shared between concurrently executing tasks.
//! All writes go through one synchronized append path so the running total
//! always equals the exact sum of committed entries, under any interleaving.

use crate::types::{CapabilityUsage, CostEntry, CostSummary};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Append-only, thread-safe ledger of billable and free provider calls.
///
/// Entries are never mutated or removed; `reset` is the only operation that
/// clears them, and it starts a new session id.
pub struct CostLedger {
    inner: Mutex<LedgerState>,
}

struct LedgerState {
    session_id: Uuid,
    entries: Vec<CostEntry>,
}

impl Default for CostLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl CostLedger {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(LedgerState {
                session_id: Uuid::new_v4(),
                entries: Vec::new(),
            }),
        }
    }

    /// Current session id. Changes only on `reset`.
    pub fn session_id(&self) -> Uuid {
        self.inner.lock().session_id
    }

    /// Commit one entry. Called before the provider call is issued; the
    /// charge covers the attempt, not the outcome.
    pub fn append(&self, entry: CostEntry) {
        tracing::debug!(
            capability = %entry.capability,
            units = entry.units,
            unit_price = entry.unit_price,
            "ledger append"
        );
        self.inner.lock().entries.push(entry);
    }

    /// Convenience: build and commit an entry for one call to `capability`
    /// under the current session. Stamping and pushing happen under a
    /// single lock acquisition so a concurrent `reset` can never leave an
    /// old-session entry in the new session's list.
    pub fn charge(&self, capability: crate::types::Capability) {
        let mut state = self.inner.lock();
        let entry = CostEntry {
            session_id: state.session_id,
            capability,
            units: 1,
            unit_price: capability.cost_model().unit_price(),
            timestamp: chrono::Utc::now(),
        };
        tracing::debug!(
            capability = %entry.capability,
            units = entry.units,
            unit_price = entry.unit_price,
            "ledger append"
        );
        state.entries.push(entry);
    }

    /// Exact sum of all committed entries.
    pub fn total(&self) -> f64 {
        self.inner.lock().entries.iter().map(CostEntry::cost).sum()
    }

    /// Number of committed entries (free entries included).
    pub fn entry_count(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Snapshot of all entries, in commit order.
    pub fn entries(&self) -> Vec<CostEntry> {
        self.inner.lock().entries.clone()
    }

    /// Per-capability units and cost plus the session total.
    pub fn summary(&self) -> CostSummary {
        let state = self.inner.lock();
        let mut per_capability: BTreeMap<_, CapabilityUsage> = BTreeMap::new();
        let mut total = 0.0;

        for entry in &state.entries {
            let usage = per_capability.entry(entry.capability).or_default();
            usage.units += entry.units;
            usage.cost += entry.cost();
            total += entry.cost();
        }

        CostSummary {
            session_id: Some(state.session_id),
            per_capability,
            total,
        }
    }

    /// Clear accumulated entries and start a new session. Used once per
    /// top-level research run.
    pub fn reset(&self) {
        let mut state = self.inner.lock();
        let old = state.session_id;
        state.session_id = Uuid::new_v4();
        state.entries.clear();
        tracing::info!(old_session = %old, new_session = %state.session_id, "ledger reset");
    }
}
