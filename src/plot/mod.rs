//! Bar charts of adjusted prices.
//!
//! - SVG image via Plotters (`chart`)
//! - plain-text bars for the terminal (`ascii`)
//!
//! Both render the same selection, built by [`chart_bars`].

pub mod ascii;
pub mod chart;

pub use ascii::render_ascii_bars;
pub use chart::write_svg_chart;

use crate::domain::CatalogRecord;

/// One bar: a short label plus original and adjusted price.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartBar {
    pub label: String,
    pub price: f64,
    pub adjusted: f64,
}

/// Select and label the records to chart.
///
/// Records without both prices, or priced at/above `price_ceiling`, are
/// skipped. Names longer than `name_limit` characters are replaced by the
/// abbreviation. Bars come out in reverse input order, so a newest-first
/// listing is charted oldest-first.
pub fn chart_bars(records: &[CatalogRecord], price_ceiling: f64, name_limit: usize) -> Vec<ChartBar> {
    records
        .iter()
        .rev()
        .filter_map(|r| {
            let price = r.original_price()?;
            let adjusted = r.adjusted_price()?;
            if price >= price_ceiling {
                return None;
            }
            Some(ChartBar {
                label: bar_label(r, name_limit),
                price,
                adjusted,
            })
        })
        .collect()
}

fn bar_label(record: &CatalogRecord, name_limit: usize) -> String {
    match record.name() {
        Some(name) if name.chars().count() <= name_limit => name.to_string(),
        Some(name) => record.abbreviation().unwrap_or(name).to_string(),
        None => record.display_name().to_string(),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use serde_json::json;

    use crate::domain::CatalogRecord;

    pub fn enriched(name: &str, abbreviation: &str, price: f64, adjusted: f64) -> CatalogRecord {
        let serde_json::Value::Object(map) = json!({
            "name": name,
            "abbreviation": abbreviation,
            "original_price": price,
        }) else {
            unreachable!()
        };
        let mut r = CatalogRecord::from_fields(map);
        r.set_adjusted_price(adjusted);
        r
    }
}
