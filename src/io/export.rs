//! Export enriched records to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::Serialize;

use crate::domain::CatalogRecord;
use crate::error::AppError;

pub const CSV_HEADER: [&str; 5] = ["Abbreviation", "Name", "Year", "Price", "Adjusted price"];

/// One CSV row; `None` becomes an empty cell.
#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    abbreviation: Option<&'a str>,
    name: Option<&'a str>,
    year: Option<i32>,
    price: Option<String>,
    adjusted_price: Option<String>,
}

impl<'a> From<&'a CatalogRecord> for CsvRow<'a> {
    fn from(r: &'a CatalogRecord) -> Self {
        Self {
            abbreviation: r.abbreviation(),
            name: r.name(),
            year: r.year(),
            price: r.original_price().map(|p| p.to_string()),
            adjusted_price: r.adjusted_price().map(|p| format!("{p:.2}")),
        }
    }
}

/// Write one row per record, in order, to any writer.
///
/// The header is always written, even for an empty slice.
pub fn write_records_csv<W: Write>(writer: W, records: &[CatalogRecord]) -> Result<(), AppError> {
    let mut csv = csv::WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(CSV_HEADER)?;

    for r in records {
        csv.serialize(CsvRow::from(r))?;
    }

    csv.flush().map_err(|e| AppError::io("<csv output>", e))?;
    Ok(())
}

/// Write records to a CSV file (created or truncated).
pub fn write_records_csv_file(path: &Path, records: &[CatalogRecord]) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| AppError::io(path, e))?;
    write_records_csv(file, records)
}
