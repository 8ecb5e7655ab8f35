//! Shared retention sweep domain primitives.
//!
//! This crate owns the retention configuration contract, the age cutoff and
//! partition policy, and the per-key outcome report. It intentionally excludes
//! AWS SDK and Lambda runtime concerns.

pub mod contract;
pub mod policy;
pub mod report;
