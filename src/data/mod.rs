//! External data: the CPI feed and the paginated catalog.
//!
//! - CPI download (`fred`) and yearly aggregation (`cpi`)
//! - catalog paging (`catalog`)

pub mod catalog;
pub mod cpi;
pub mod fred;

pub use catalog::{CatalogClient, CatalogPage, HttpPageFetcher, PAGE_SIZE, PageFetcher, PageRequest, RecordStream};
pub use cpi::CpiData;
pub use fred::{FeedSource, FredClient};
