//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments and sets up logging
//! - loads CPI data (cache or FRED download)
//! - walks the catalog and enriches records
//! - prints reports/charts
//! - writes optional exports

use std::time::Duration;

use chrono::Datelike;
use clap::Parser;

use crate::cli::{AdjustArgs, Command, CpiArgs, RunArgs};
use crate::config::{CatalogConfig, CpiConfig, OutputConfig, QueryConfig, Settings};
use crate::data::FredClient;
use crate::domain::FilterSpec;
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `padj` binary.
pub fn run() -> Result<(), AppError> {
    // `.env` may carry GIANTBOMB_API_KEY; load it before clap reads the environment.
    dotenvy::dotenv().ok();

    let argv = rewrite_args(std::env::args().collect());
    let cli = crate::cli::Cli::parse_from(argv);
    crate::logging::init(cli.debug)?;

    match cli.command {
        Command::Run(args) => handle_run(args),
        Command::Adjust(args) => handle_adjust(args),
        Command::Cpi(args) => handle_cpi(args),
    }
}

fn handle_run(args: RunArgs) -> Result<(), AppError> {
    let settings = settings_from_args(&args);
    let target_year = resolve_target_year(settings.target_year);

    println!("{}\n", crate::report::DISCLAIMER);

    let run = pipeline::run(&settings, target_year)?;
    println!("{}", crate::report::format_run_summary(&run));

    let output = &settings.output;
    if output.ascii || output.plot.is_some() {
        let bars = crate::plot::chart_bars(&run.records, output.price_ceiling, output.name_limit);
        if output.ascii {
            println!("{}", crate::plot::render_ascii_bars(&bars, output.chart_width));
        }
        if let Some(path) = &output.plot {
            crate::plot::write_svg_chart(path, &bars)?;
        }
    }

    // Optional exports.
    if let Some(path) = &output.csv {
        crate::io::write_records_csv_file(path, &run.records)?;
    }

    Ok(())
}

fn handle_adjust(args: AdjustArgs) -> Result<(), AppError> {
    let config = cpi_config_from_args(&args.cpi);
    let fred = FredClient::new(&config)?;
    let cpi = pipeline::load_cpi(&config, &fred)?;

    let target = resolve_target_year(args.target);
    let adjusted = cpi.adjusted_price(args.amount, args.year, target)?;

    println!("{}", crate::report::format_cpi_range(&cpi));
    println!("{}", crate::report::format_adjustment(args.amount, args.year, target, adjusted));
    Ok(())
}

fn handle_cpi(args: CpiArgs) -> Result<(), AppError> {
    let config = cpi_config_from_args(&args);
    let fred = FredClient::new(&config)?;
    let cpi = pipeline::load_cpi(&config, &fred)?;

    print!("{}", crate::report::format_cpi_table(&cpi));
    Ok(())
}

/// Default target year: the current calendar year (the CPI lookup clamps it).
fn resolve_target_year(requested: Option<i32>) -> i32 {
    requested.unwrap_or_else(|| chrono::Local::now().year())
}

pub fn cpi_config_from_args(args: &CpiArgs) -> CpiConfig {
    CpiConfig {
        url: args.cpi_url.clone(),
        cache_file: args.cpi_file.clone(),
        timeout: Duration::from_secs(args.timeout_secs),
        ..CpiConfig::default()
    }
}

pub fn settings_from_args(args: &RunArgs) -> Settings {
    let mut catalog = CatalogConfig::new(args.api_key.clone().unwrap_or_default());
    catalog.base_url = args.base_url.clone();
    catalog.resource = args.resource.clone();
    catalog.timeout = Duration::from_secs(args.cpi.timeout_secs);
    catalog.request_interval = Duration::from_millis(args.request_interval_ms);

    Settings {
        catalog,
        cpi: cpi_config_from_args(&args.cpi),
        query: QueryConfig {
            sort: Some(args.sort.clone()),
            filter: FilterSpec::new(args.filters.clone()),
            field_list: args.fields.clone(),
        },
        target_year: args.target_year,
        limit: args.limit,
        on_invalid: args.on_invalid,
        output: OutputConfig {
            csv: args.csv.clone(),
            plot: args.plot.clone(),
            ascii: args.ascii,
            price_ceiling: args.price_ceiling,
            name_limit: args.name_limit,
            chart_width: args.width,
        },
    }
}

/// Rewrite argv so `padj` defaults to `padj run`.
///
/// Rules:
/// - `padj`                        -> `padj run`
/// - `padj --csv out.csv ...`      -> `padj run --csv out.csv ...`
/// - `padj --debug cpi`            -> unchanged (a subcommand is present)
/// - `padj --resource cpi`         -> `padj run --resource cpi`
/// - `padj --help/--version/-h`    -> unchanged (show top-level help/version)
fn rewrite_args(mut argv: Vec<String>) -> Vec<String> {
    let Some(arg1) = argv.get(1).cloned() else {
        argv.push("run".to_string());
        return argv;
    };

    let is_top_level_help_or_version = matches!(
        arg1.as_str(),
        "-h" | "--help" | "-V" | "--version" | "help"
    );
    if is_top_level_help_or_version {
        return argv;
    }

    // `--debug` is the only top-level flag and takes no value, so the first
    // other token decides. Flag values (`--resource cpi`) are never inspected.
    let first_word = argv.iter().skip(1).find(|a| a.as_str() != "--debug");
    let has_subcommand = first_word.is_some_and(|w| matches!(w.as_str(), "run" | "adjust" | "cpi"));
    if has_subcommand {
        return argv;
    }

    argv.insert(1, "run".to_string());
    argv
}
