//! Versioned export/import envelopes for usage snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TollgateError};

use super::ledger::UsageLedger;
use super::snapshot::UsageSnapshot;

/// Current export format version.
pub const EXPORT_VERSION: i64 = 1;

/// Envelope produced by an export, suitable for backup or migration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportPayload {
    pub version: i64,
    pub exported_at: DateTime<Utc>,
    pub usage: UsageSnapshot,
}

/// Envelope accepted by an import.
///
/// `version` defaults to 0 for exports that predate versioning; 0 is
/// treated as equivalent to 1. The field is signed so an out-of-range
/// negative version is rejected as unsupported rather than as a decode
/// failure.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportPayload {
    #[serde(default)]
    pub version: i64,
    #[serde(default)]
    pub usage: UsageSnapshot,
}

/// Result of a successful import: merge counts plus fresh ledger totals.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ImportOutcome {
    pub added: u64,
    pub skipped: u64,
    pub total_requests: u64,
    pub failed_requests: u64,
}

/// Produce a complete export of the ledger's current state.
pub fn export(ledger: &UsageLedger) -> ExportPayload {
    ExportPayload {
        version: EXPORT_VERSION,
        exported_at: Utc::now(),
        usage: ledger.snapshot(),
    }
}

/// Decode raw bytes as an import payload and merge it into the ledger.
///
/// Malformed bytes or a version outside {0, 1} reject the import and leave
/// the ledger untouched.
pub fn import_bytes(ledger: &UsageLedger, data: &[u8]) -> Result<ImportOutcome> {
    let payload: ImportPayload = serde_json::from_slice(data)?;

    if payload.version != 0 && payload.version != EXPORT_VERSION {
        return Err(TollgateError::UnsupportedVersion(payload.version));
    }

    let result = ledger.merge_snapshot(&payload.usage);
    let snapshot = ledger.snapshot();
    Ok(ImportOutcome {
        added: result.added,
        skipped: result.skipped,
        total_requests: snapshot.total_requests,
        failed_requests: snapshot.failure_count,
    })
}
