//! Usage statistics data model.
//!
//! Snapshots are point-in-time, internally consistent copies of the live
//! ledger, organized hierarchically: grand totals, per-source totals, and
//! per-model totals within each source. The serialized form is the wire
//! format of the export/import endpoints, so field names are stable.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Point-in-time projection of all usage counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UsageSnapshot {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub success_count: u64,
    #[serde(default)]
    pub failure_count: u64,
    /// Lifetime cost; owned by the persistent layer, zero for in-memory data
    #[serde(default)]
    pub total_cost: f64,
    /// Cost accrued in the trailing 24 hours
    #[serde(default)]
    pub cost_24h: f64,
    /// Cost accrued in the trailing 7 days
    #[serde(default)]
    pub cost_7d: f64,
    /// Per-source breakdown, keyed by source identifier
    #[serde(default, rename = "apis")]
    pub sources: HashMap<String, SourceSnapshot>,
}

/// Totals for one source, with a per-model breakdown.
///
/// Invariant (maintained by the ledger, not by construction): the source's
/// totals equal the sum over its models.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSnapshot {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default)]
    pub models: HashMap<String, ModelSnapshot>,
}

/// Totals for one model within a source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSnapshot {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

impl ModelSnapshot {
    /// Element-wise maximum of two model counters.
    ///
    /// Counters are monotonically increasing, so the larger value is the
    /// more recent observation; taking the max is commutative and
    /// idempotent, which is what makes merges safe to repeat.
    pub fn merged_max(&self, other: &ModelSnapshot) -> ModelSnapshot {
        ModelSnapshot {
            total_requests: self.total_requests.max(other.total_requests),
            total_tokens: self.total_tokens.max(other.total_tokens),
        }
    }
}

impl SourceSnapshot {
    /// Recompute this source's totals as the sum over its models.
    pub fn recompute_totals(&mut self) {
        self.total_requests = self.models.values().map(|m| m.total_requests).sum();
        self.total_tokens = self.models.values().map(|m| m.total_tokens).sum();
    }
}

/// Counts returned by a merge: (source, model) pairs newly incorporated
/// versus pairs already present (reconciled, never double-counted).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MergeResult {
    pub added: u64,
    pub skipped: u64,
}
