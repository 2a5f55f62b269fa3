//! Command-line parsing for the inflation-adjusted price tool.
//!
//! The goal of this module is to keep **argument parsing** separate from the
//! pipeline code. Conversion into [`crate::config::Settings`] lives in `app`.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::{DEFAULT_CATALOG_RESOURCE, DEFAULT_CATALOG_URL, DEFAULT_CPI_FILE, DEFAULT_CPI_URL, DEFAULT_FIELDS};
use crate::domain::{SortSpec, ValidationPolicy, parse_filter_pair};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "padj", version, about = "Inflation-adjusted catalog prices (FRED CPI + Giant Bomb)")]
pub struct Cli {
    /// Enable debug logging (overridden by RUST_LOG).
    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Fetch the catalog, adjust every price for inflation, and print/export the result.
    Run(RunArgs),
    /// Convert a single amount between years.
    Adjust(AdjustArgs),
    /// Print the yearly CPI averages.
    Cpi(CpiArgs),
}

/// Where CPI data is read from.
#[derive(Debug, Parser, Clone)]
pub struct CpiArgs {
    /// Local CPI file; downloaded from --cpi-url when it does not exist.
    #[arg(long, default_value = DEFAULT_CPI_FILE)]
    pub cpi_file: PathBuf,

    /// CPI feed URL (FRED text format).
    #[arg(long, env = "PADJ_CPI_URL", default_value = DEFAULT_CPI_URL)]
    pub cpi_url: String,

    /// HTTP timeout in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,
}

/// Options for the full pipeline.
#[derive(Debug, Parser, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub cpi: CpiArgs,

    /// Catalog API key.
    #[arg(long, env = "GIANTBOMB_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Catalog API base URL.
    #[arg(long, default_value = DEFAULT_CATALOG_URL)]
    pub base_url: String,

    /// Catalog resource to list.
    #[arg(long, default_value = DEFAULT_CATALOG_RESOURCE)]
    pub resource: String,

    /// Sort as field:asc|desc.
    #[arg(long, default_value = "release_date:desc")]
    pub sort: SortSpec,

    /// Filter as field:value (repeatable).
    #[arg(long = "filter", value_parser = parse_filter_pair)]
    pub filters: Vec<(String, String)>,

    /// Comma-separated field projection.
    #[arg(long, value_delimiter = ',', default_values_t = DEFAULT_FIELDS.map(String::from).to_vec())]
    pub fields: Vec<String>,

    /// Express prices in this year's money (default: current year).
    #[arg(long)]
    pub target_year: Option<i32>,

    /// Stop after this many kept records.
    #[arg(long)]
    pub limit: Option<usize>,

    /// What to do with records that fail validation.
    #[arg(long, value_enum, default_value_t = ValidationPolicy::Keep)]
    pub on_invalid: ValidationPolicy,

    /// Write enriched records to CSV.
    #[arg(long, value_name = "CSV")]
    pub csv: Option<PathBuf>,

    /// Write a bar chart of adjusted prices to SVG.
    #[arg(long, value_name = "SVG")]
    pub plot: Option<PathBuf>,

    /// Print a text bar chart.
    #[arg(long)]
    pub ascii: bool,

    /// Leave records priced at or above this out of charts.
    #[arg(long, default_value_t = 2000.0)]
    pub price_ceiling: f64,

    /// Chart labels use the abbreviation when the name is longer than this.
    #[arg(long, default_value_t = 15)]
    pub name_limit: usize,

    /// Text chart width (columns).
    #[arg(long, default_value_t = 60)]
    pub width: usize,

    /// Minimum delay between catalog requests, in milliseconds.
    #[arg(long, default_value_t = 1000)]
    pub request_interval_ms: u64,
}

/// Options for converting one amount.
#[derive(Debug, Parser, Clone)]
pub struct AdjustArgs {
    #[command(flatten)]
    pub cpi: CpiArgs,

    /// Amount of money.
    #[arg(long)]
    pub amount: f64,

    /// Year the amount is from.
    #[arg(long)]
    pub year: i32,

    /// Year to express it in (default: current year).
    #[arg(long)]
    pub target: Option<i32>,
}
