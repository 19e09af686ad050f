//! `ado-worker` library crate.
//!
//! Re-exports internal modules for integration testing. The binary
//! entrypoint lives in `main.rs`.

pub mod client;
pub mod poller;
pub mod shutdown;
pub mod telemetry;
