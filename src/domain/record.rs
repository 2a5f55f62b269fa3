//! Catalog records.
//!
//! A record is a loose bag of named fields (whatever `field_list` projected),
//! with typed accessors for the handful of fields the pipeline cares about.

use serde_json::{Map, Value};

use super::types::{ValidationWarning, parse_year};

pub const FIELD_ABBREVIATION: &str = "abbreviation";
pub const FIELD_NAME: &str = "name";
pub const FIELD_ORIGINAL_PRICE: &str = "original_price";
pub const FIELD_RELEASE_DATE: &str = "release_date";
pub const FIELD_YEAR: &str = "year";
pub const FIELD_ADJUSTED_PRICE: &str = "adjusted_price";

/// One catalog entry.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRecord {
    fields: Map<String, Value>,
    warnings: Vec<ValidationWarning>,
}

impl CatalogRecord {
    pub fn from_fields(fields: Map<String, Value>) -> Self {
        Self {
            fields,
            warnings: Vec::new(),
        }
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Non-empty, trimmed string value of `field`.
    pub fn text(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn abbreviation(&self) -> Option<&str> {
        self.text(FIELD_ABBREVIATION)
    }

    pub fn name(&self) -> Option<&str> {
        self.text(FIELD_NAME)
    }

    pub fn release_date(&self) -> Option<&str> {
        self.text(FIELD_RELEASE_DATE)
    }

    /// Numeric original price. `None` when absent (not zero).
    pub fn original_price(&self) -> Option<f64> {
        self.fields.get(FIELD_ORIGINAL_PRICE).and_then(Value::as_f64)
    }

    pub fn release_year(&self) -> Option<i32> {
        self.release_date().and_then(parse_year)
    }

    /// Year attached during enrichment.
    pub fn year(&self) -> Option<i32> {
        self.fields
            .get(FIELD_YEAR)
            .and_then(Value::as_i64)
            .and_then(|y| i32::try_from(y).ok())
    }

    /// Adjusted price attached during enrichment.
    pub fn adjusted_price(&self) -> Option<f64> {
        self.fields.get(FIELD_ADJUSTED_PRICE).and_then(Value::as_f64)
    }

    pub fn set_year(&mut self, year: i32) {
        self.fields.insert(FIELD_YEAR.to_string(), Value::from(year));
    }

    pub fn set_adjusted_price(&mut self, price: f64) {
        self.fields.insert(FIELD_ADJUSTED_PRICE.to_string(), Value::from(price));
    }

    pub fn flag(&mut self, warning: ValidationWarning) {
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[ValidationWarning] {
        &self.warnings
    }

    pub fn is_flagged(&self) -> bool {
        !self.warnings.is_empty()
    }

    /// Best human label: name, then abbreviation.
    pub fn display_name(&self) -> &str {
        self.name().or_else(|| self.abbreviation()).unwrap_or("<unnamed>")
    }
}
