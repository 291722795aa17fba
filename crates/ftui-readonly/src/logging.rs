#![forbid(unsafe_code)]

//! Tracing target shared by every event this crate emits.
//!
//! The library never installs a subscriber. Filter with
//! `RUST_LOG=ftui_readonly=debug` (or `trace` to see each forwarded event).

/// Target for all `tracing` events from this crate.
pub const TARGET: &str = "ftui_readonly";
