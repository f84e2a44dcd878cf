//! Live usage ledger.

use parking_lot::Mutex;
use tracing::debug;

use super::snapshot::{MergeResult, ModelSnapshot, SourceSnapshot, UsageSnapshot};

/// Outcome of a proxied request, for accounting purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Success,
    Failure,
}

/// In-memory request/token statistics, updated continuously by the request
/// pipeline and read via consistent snapshots.
///
/// All counters live behind a single mutex: every mutation and every
/// snapshot is one exclusive section, so a snapshot can never observe a
/// source whose totals disagree with the sum of its models. Statistics
/// updates are not on the admission hot path, so the coarse lock is fine.
pub struct UsageLedger {
    inner: Mutex<UsageSnapshot>,
}

impl UsageLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(UsageSnapshot::default()),
        }
    }

    /// Record one completed request against a (source, model) pair.
    ///
    /// Grand totals, the source's totals, and the model's totals are all
    /// updated in the same critical section. Cost is not tracked in memory;
    /// the persistent layer owns cost figures.
    pub fn record(&self, source: &str, model: &str, tokens: u64, outcome: Outcome) {
        let mut inner = self.inner.lock();

        inner.total_requests += 1;
        inner.total_tokens += tokens;
        match outcome {
            Outcome::Success => inner.success_count += 1,
            Outcome::Failure => inner.failure_count += 1,
        }

        let source_entry = inner.sources.entry(source.to_string()).or_default();
        source_entry.total_requests += 1;
        source_entry.total_tokens += tokens;

        let model_entry = source_entry.models.entry(model.to_string()).or_default();
        model_entry.total_requests += 1;
        model_entry.total_tokens += tokens;
    }

    /// Take a consistent point-in-time copy of all counters.
    pub fn snapshot(&self) -> UsageSnapshot {
        self.inner.lock().clone()
    }

    /// Incorporate another snapshot without double-counting history.
    ///
    /// Merge proceeds source-by-source, then model-by-model: a (source,
    /// model) pair absent from the live ledger is inserted wholesale and
    /// counted as added; a pair already present is reconciled by element-wise
    /// maximum of its counters and counted as skipped. Counters are
    /// monotonically increasing, so max-merge is commutative and idempotent:
    /// merging the same payload twice reports every pair as skipped and
    /// changes no aggregate.
    ///
    /// After the pair pass, source totals are recomputed as the sum over
    /// their models and the grand request/token totals as the sum over
    /// sources, preserving the hierarchy invariant. `success_count`,
    /// `failure_count`, and the cost figures have no per-model breakdown and
    /// merge by maximum directly.
    pub fn merge_snapshot(&self, incoming: &UsageSnapshot) -> MergeResult {
        let mut inner = self.inner.lock();
        let mut result = MergeResult::default();

        for (source_id, incoming_source) in &incoming.sources {
            // A source with no model pairs contributes nothing; materializing
            // it would leave a phantom key in every later snapshot.
            if incoming_source.models.is_empty() {
                continue;
            }

            let live_source = inner.sources.entry(source_id.clone()).or_default();

            for (model_id, incoming_model) in &incoming_source.models {
                match live_source.models.get_mut(model_id) {
                    Some(live_model) => {
                        *live_model = live_model.merged_max(incoming_model);
                        result.skipped += 1;
                    }
                    None => {
                        live_source.models.insert(model_id.clone(), *incoming_model);
                        result.added += 1;
                    }
                }
            }

            live_source.recompute_totals();
        }

        inner.total_requests = inner.sources.values().map(|s| s.total_requests).sum();
        inner.total_tokens = inner.sources.values().map(|s| s.total_tokens).sum();
        inner.success_count = inner.success_count.max(incoming.success_count);
        inner.failure_count = inner.failure_count.max(incoming.failure_count);
        inner.total_cost = inner.total_cost.max(incoming.total_cost);
        inner.cost_24h = inner.cost_24h.max(incoming.cost_24h);
        inner.cost_7d = inner.cost_7d.max(incoming.cost_7d);

        debug!(
            added = result.added,
            skipped = result.skipped,
            "Merged usage snapshot"
        );
        result
    }

    /// Drop all counters.
    ///
    /// This is primarily useful for testing.
    pub fn clear(&self) {
        *self.inner.lock() = UsageSnapshot::default();
    }
}

impl Default for UsageLedger {
    fn default() -> Self {
        Self::new()
    }
}
