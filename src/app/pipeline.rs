//! Shared "run pipeline" logic used by the `run` command.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! CPI load -> catalog traversal -> validation -> year/price enrichment
//!
//! The CLI can then focus on presentation (printing and sinks).

use tracing::{debug, info};

use crate::config::{CpiConfig, Settings};
use crate::data::{CatalogClient, CpiData, FeedSource, FredClient, HttpPageFetcher, PageFetcher};
use crate::domain::{CatalogRecord, ValidationPolicy};
use crate::error::AppError;
use crate::validate::validate_record;

/// Per-run enrichment knobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    pub target_year: i32,
    pub on_invalid: ValidationPolicy,
    /// Stop pulling once this many records were kept.
    pub limit: Option<usize>,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Records pulled off the catalog stream.
    pub fetched: usize,
    pub kept: usize,
    pub dropped: usize,
    /// Records with at least one validation warning (kept or dropped).
    pub flagged: usize,
    /// Kept records that received an adjusted price.
    pub adjusted: usize,
}

/// All computed outputs of a single `padj run`.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub cpi: CpiData,
    pub records: Vec<CatalogRecord>,
    pub stats: RunStats,
    pub target_year: i32,
}

/// Execute the full pipeline against the live services.
pub fn run(settings: &Settings, target_year: i32) -> Result<RunOutput, AppError> {
    settings.validate()?;

    // 1) CPI data (cached file or FRED download).
    let fred = FredClient::new(&settings.cpi)?;
    let cpi = load_cpi(&settings.cpi, &fred)?;

    // 2) Catalog traversal + enrichment.
    let fetcher = HttpPageFetcher::new(&settings.catalog)?;
    run_with_cpi(settings, cpi, fetcher, target_year)
}

/// Execute the catalog half of the pipeline with pre-loaded CPI data.
pub fn run_with_cpi<F: PageFetcher>(
    settings: &Settings,
    cpi: CpiData,
    fetcher: F,
    target_year: i32,
) -> Result<RunOutput, AppError> {
    let client = CatalogClient::new(fetcher);
    let stream = client.list_records(
        settings.query.sort.clone(),
        settings.query.filter.clone(),
        settings.query.field_list.clone(),
    );

    let options = EnrichOptions {
        target_year,
        on_invalid: settings.on_invalid,
        limit: settings.limit,
    };
    let (records, stats) = enrich_records(&cpi, stream, &options)?;

    info!(
        "Kept {} of {} catalog records ({} flagged, {} dropped)",
        stats.kept, stats.fetched, stats.flagged, stats.dropped
    );

    Ok(RunOutput {
        cpi,
        records,
        stats,
        target_year,
    })
}

/// Load CPI data from the local cache, downloading it on first use.
pub fn load_cpi<S: FeedSource + ?Sized>(config: &CpiConfig, source: &S) -> Result<CpiData, AppError> {
    let mut cpi = CpiData::new();
    cpi.load_cached_or_remote(source, &config.cache_file, &config.url)?;
    if cpi.is_empty() {
        return Err(AppError::Range(format!(
            "CPI data from '{}' contains no observations.",
            config.cache_file.display()
        )));
    }
    Ok(cpi)
}

/// Validate records and attach `year` / `adjusted_price`.
///
/// Records without a usable release year or price are kept (policy
/// permitting) but get no adjusted price. The first stream error aborts.
pub fn enrich_records<I>(
    cpi: &CpiData,
    records: I,
    options: &EnrichOptions,
) -> Result<(Vec<CatalogRecord>, RunStats), AppError>
where
    I: IntoIterator<Item = Result<CatalogRecord, AppError>>,
{
    let mut out = Vec::new();
    let mut stats = RunStats::default();

    for item in records {
        let mut record = item?;
        stats.fetched += 1;

        let warnings = validate_record(&record);
        if !warnings.is_empty() {
            stats.flagged += 1;
            if options.on_invalid == ValidationPolicy::Drop {
                debug!("Dropping {}", record.display_name());
                stats.dropped += 1;
                continue;
            }
            for w in warnings {
                record.flag(w);
            }
        }

        if let Some(year) = record.release_year() {
            record.set_year(year);
            if let Some(price) = record.original_price() {
                let adjusted = cpi.adjusted_price(price, year, options.target_year)?;
                record.set_adjusted_price(adjusted);
                stats.adjusted += 1;
            }
        }

        out.push(record);
        stats.kept += 1;

        if options.limit.is_some_and(|limit| stats.kept >= limit) {
            debug!("Reached limit of {} records", stats.kept);
            break;
        }
    }

    Ok((out, stats))
}
