//! Tollgate - API Gateway Admission and Usage Core
//!
//! This crate implements the admission-control and usage-accounting core of
//! an API gateway: per-key token-bucket rate limiting, an in-memory usage
//! ledger with export/import/merge, and read-time composition of statistics
//! overviews from persistent providers.

pub mod admission;
pub mod usage;
pub mod overview;
pub mod policy;
pub mod http;
pub mod config;
pub mod error;
