//! Seam to the externally owned persistent statistics layer.

use async_trait::async_trait;

use crate::error::{Result, TollgateError};

/// Lifetime counters kept by the persistent layer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GlobalTotals {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub success_count: u64,
    pub failure_count: u64,
}

/// Cost figures over fixed trailing windows plus lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeriodCosts {
    pub cost_24h: f64,
    pub cost_7d: f64,
    pub lifetime: f64,
}

/// Lifetime per-model aggregate from the persistent layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelAggregate {
    pub model: String,
    pub total_requests: u64,
    pub total_tokens: u64,
}

/// Persistent statistics provider.
///
/// Implemented by the database layer; the overview composer treats every
/// failure as non-fatal and falls back to in-memory data. Calls may block
/// on I/O, so any timeout boundary belongs at the call site.
#[async_trait]
pub trait PersistentStats: Send + Sync {
    /// Lifetime request/token/outcome counters.
    async fn global_totals(&self) -> Result<GlobalTotals>;

    /// Cost over the trailing 24 hours, trailing 7 days, and lifetime.
    async fn period_costs(&self) -> Result<PeriodCosts>;

    /// Lifetime aggregates per model, across all sources.
    async fn model_aggregates(&self) -> Result<Vec<ModelAggregate>>;
}

/// Null provider for gateways running without a persistent layer.
///
/// Every call fails, which leaves the composed overview on its in-memory
/// fallback path.
pub struct NoPersistence;

#[async_trait]
impl PersistentStats for NoPersistence {
    async fn global_totals(&self) -> Result<GlobalTotals> {
        Err(TollgateError::Provider("no persistent layer configured".to_string()))
    }

    async fn period_costs(&self) -> Result<PeriodCosts> {
        Err(TollgateError::Provider("no persistent layer configured".to_string()))
    }

    async fn model_aggregates(&self) -> Result<Vec<ModelAggregate>> {
        Err(TollgateError::Provider("no persistent layer configured".to_string()))
    }
}
