//! `price-adjust` library crate.
//!
//! The binary (`padj`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes or touching the network
//! - the CPI aggregator and catalog client are reusable on their own

pub mod app;
pub mod cli;
pub mod config;
pub mod data;
pub mod domain;
pub mod error;
pub mod io;
pub mod logging;
pub mod plot;
pub mod report;
pub mod validate;
