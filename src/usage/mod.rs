//! Usage accounting: the live ledger and its transfer formats.

mod ledger;
mod snapshot;
mod transfer;

pub use ledger::{Outcome, UsageLedger};
pub use snapshot::{MergeResult, ModelSnapshot, SourceSnapshot, UsageSnapshot};
pub use transfer::{export, import_bytes, ExportPayload, ImportOutcome, ImportPayload, EXPORT_VERSION};
