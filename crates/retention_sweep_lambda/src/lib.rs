//! AWS-oriented adapters and handlers for the scheduled retention sweep.
//!
//! This crate owns runtime integration details (the scheduled Lambda handler,
//! the object-store seam, deploy-time configuration and log setup). Retention
//! decisions themselves live in `retention_sweep_core`.

pub mod adapters;
pub mod config;
pub mod handlers;
pub mod logging;
