//! Read-time composition of the overview response.

use serde::Serialize;
use tracing::debug;

use crate::usage::{ModelSnapshot, SourceSnapshot, UsageSnapshot};

use super::providers::PersistentStats;

/// Reserved source identifier for the synthetic entry built from persistent
/// per-model aggregates. Distinct from any in-memory source key so readers
/// can tell where the data came from.
pub const PERSISTENT_SOURCE: &str = "persistent_db_source";

/// Composed statistics overview returned to management clients.
#[derive(Debug, Clone, Serialize)]
pub struct Overview {
    pub usage: UsageSnapshot,
    pub failed_requests: u64,
}

/// Combine a live snapshot with persistent statistics.
///
/// Persistent data dominates wherever the provider succeeds, because the
/// in-memory counters reset to zero on restart:
///
/// 1. the four grand totals are overwritten from `global_totals()`;
/// 2. the three cost figures are overwritten from `period_costs()`
///    (in-memory cost is typically zero, cost is not tracked there);
/// 3. a non-empty `model_aggregates()` result replaces the entire source
///    map with one synthetic source under [`PERSISTENT_SOURCE`] whose
///    totals are the sum over its models — merging with the live map would
///    risk double-counting, and replacement keeps top-model computations
///    correct in the composed view while leaving the ledger untouched.
///
/// Every provider failure falls back to the live snapshot's values and
/// never aborts the request. No component state is mutated.
pub async fn compose(mut snapshot: UsageSnapshot, stats: &dyn PersistentStats) -> Overview {
    match stats.global_totals().await {
        Ok(totals) => {
            snapshot.total_requests = totals.total_requests;
            snapshot.total_tokens = totals.total_tokens;
            snapshot.success_count = totals.success_count;
            snapshot.failure_count = totals.failure_count;
        }
        Err(err) => debug!(error = %err, "Global totals unavailable, using in-memory values"),
    }

    match stats.period_costs().await {
        Ok(costs) => {
            snapshot.cost_24h = costs.cost_24h;
            snapshot.cost_7d = costs.cost_7d;
            snapshot.total_cost = costs.lifetime;
        }
        Err(err) => debug!(error = %err, "Period costs unavailable"),
    }

    match stats.model_aggregates().await {
        Ok(aggregates) if !aggregates.is_empty() => {
            let mut synthetic = SourceSnapshot::default();
            for aggregate in aggregates {
                synthetic.total_requests += aggregate.total_requests;
                synthetic.total_tokens += aggregate.total_tokens;
                synthetic.models.insert(
                    aggregate.model,
                    ModelSnapshot {
                        total_requests: aggregate.total_requests,
                        total_tokens: aggregate.total_tokens,
                    },
                );
            }
            snapshot.sources.clear();
            snapshot.sources.insert(PERSISTENT_SOURCE.to_string(), synthetic);
        }
        Ok(_) => {}
        Err(err) => debug!(error = %err, "Model aggregates unavailable, keeping live sources"),
    }

    let failed_requests = snapshot.failure_count;
    Overview {
        usage: snapshot,
        failed_requests,
    }
}
