//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the pipeline code stays clean and testable
//! - output changes are localized (important for snapshot tests)

use crate::app::pipeline::RunOutput;
use crate::data::CpiData;

pub const DISCLAIMER: &str = "Disclaimer: this tool uses data provided by FRED, Federal Reserve Economic Data, \
from the Federal Reserve Bank of St. Louis, and by Giant Bomb:\n- https://fred.stlouisfed.org/\n- https://www.giantbomb.com/api/";

/// One-line description of the loaded CPI range.
pub fn format_cpi_range(cpi: &CpiData) -> String {
    match (cpi.first_year(), cpi.last_year()) {
        (Some(first), Some(last)) => format!("CPI data: {first}-{last} ({} years)", cpi.len()),
        _ => "CPI data: none loaded".to_string(),
    }
}

/// Summary of a `padj run`: data ranges, counters and the kept records.
pub fn format_run_summary(run: &RunOutput) -> String {
    let mut out = String::new();

    out.push_str("=== padj - inflation-adjusted catalog prices ===\n");
    out.push_str(&format_cpi_range(&run.cpi));
    out.push('\n');
    out.push_str(&format!("Prices expressed in {} dollars", run.target_year));
    if let Some(last) = run.cpi.last_year() {
        if run.target_year > last {
            out.push_str(&format!(" (CPI held at {last})"));
        }
    }
    out.push('\n');
    out.push_str(&format!(
        "Records: fetched={} kept={} flagged={} dropped={} adjusted={}\n",
        run.stats.fetched, run.stats.kept, run.stats.flagged, run.stats.dropped, run.stats.adjusted
    ));

    if run.records.is_empty() {
        return out;
    }

    out.push('\n');
    out.push_str(&format!(
        "{:<8} {:<34} {:>4} {:>10} {:>12}\n",
        "Abbr", "Name", "Year", "Price", "Adjusted"
    ));
    for r in &run.records {
        let name: String = r.name().unwrap_or("").chars().take(34).collect();
        out.push_str(&format!(
            "{:<8} {:<34} {:>4} {:>10} {:>12}{}\n",
            r.abbreviation().unwrap_or("-"),
            name,
            r.year().map(|y| y.to_string()).unwrap_or_else(|| "-".to_string()),
            r.original_price().map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".to_string()),
            r.adjusted_price().map(|p| format!("{p:.2}")).unwrap_or_else(|| "-".to_string()),
            if r.is_flagged() { " *" } else { "" },
        ));
    }
    if run.records.iter().any(|r| r.is_flagged()) {
        out.push_str("(* record has validation warnings)\n");
    }

    out
}

/// Table of yearly CPI averages.
pub fn format_cpi_table(cpi: &CpiData) -> String {
    let mut out = String::new();
    out.push_str(&format_cpi_range(cpi));
    out.push('\n');
    for (year, value) in cpi.years() {
        out.push_str(&format!("{year}  {value:>10.3}\n"));
    }
    out
}

/// Result line of `padj adjust`.
pub fn format_adjustment(amount: f64, source_year: i32, target_year: i32, adjusted: f64) -> String {
    format!("${amount:.2} in {source_year} is worth ${adjusted:.2} in {target_year}")
}
