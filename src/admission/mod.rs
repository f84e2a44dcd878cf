//! Per-key request admission control.

mod bucket;
mod registry;

pub use bucket::RateLimiter;
pub use registry::{AdmissionRegistry, Decision};
