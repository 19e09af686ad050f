//! `ado-core` -- configuration and domain types for the Azure DevOps poller.
//!
//! Holds everything that does not touch the network: settings loading and
//! validation, error enums, and the status classification the poll loop
//! branches on.

pub mod config;
pub mod error;
pub mod poll;
