//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - catalog query configuration (`SortSpec`, `FilterSpec`)
//! - catalog records and their enrichment fields (`CatalogRecord`)
//! - validation diagnostics and policy (`ValidationWarning`, `ValidationPolicy`)

pub mod record;
pub mod types;

pub use record::*;
pub use types::*;
