//! Output sinks that write files.
//!
//! - enriched records to CSV (`export`)

pub mod export;

pub use export::*;
