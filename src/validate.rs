//! Record-level validation.
//!
//! Validation never fails a record outright: it reports what is missing and
//! leaves the keep/drop decision to [`crate::domain::ValidationPolicy`].

use tracing::warn;

use crate::domain::{
    CatalogRecord, FIELD_ABBREVIATION, FIELD_NAME, FIELD_ORIGINAL_PRICE, FIELD_RELEASE_DATE, ValidationWarning,
};

/// Check the fields the enrichment step and sinks rely on.
pub fn validate_record(record: &CatalogRecord) -> Vec<ValidationWarning> {
    let label = record.display_name().to_string();
    let mut warnings = Vec::new();

    match record.release_date() {
        None => warnings.push(ValidationWarning::MissingField {
            record: label.clone(),
            field: FIELD_RELEASE_DATE,
        }),
        Some(date) if record.release_year().is_none() => warnings.push(ValidationWarning::UnparsableField {
            record: label.clone(),
            field: FIELD_RELEASE_DATE,
            value: date.to_string(),
        }),
        Some(_) => {}
    }

    if record.original_price().is_none() {
        warnings.push(ValidationWarning::MissingField {
            record: label.clone(),
            field: FIELD_ORIGINAL_PRICE,
        });
    }
    if record.name().is_none() {
        warnings.push(ValidationWarning::MissingField {
            record: label.clone(),
            field: FIELD_NAME,
        });
    }
    if record.abbreviation().is_none() {
        warnings.push(ValidationWarning::MissingField {
            record: label,
            field: FIELD_ABBREVIATION,
        });
    }

    for w in &warnings {
        warn!("{w}");
    }
    warnings
}
