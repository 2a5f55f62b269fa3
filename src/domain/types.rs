//! Shared domain types.
//!
//! These types are intentionally kept lightweight so they can be:
//!
//! - parsed straight from CLI arguments (`SortSpec`, filter pairs, `ValidationPolicy`)
//! - rendered into catalog query parameters
//! - attached to records as diagnostics (`ValidationWarning`)

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;

/// Sort direction understood by the catalog API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SortDirection::Asc => "asc",
            SortDirection::Desc => "desc",
        }
    }
}

/// Sort specification, rendered as `field:direction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub field: String,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(field: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            field: field.into(),
            direction,
        }
    }
}

impl fmt::Display for SortSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.field, self.direction.as_str())
    }
}

impl FromStr for SortSpec {
    type Err = String;

    /// Accepts `field:asc|desc`; a bare `field` sorts ascending.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (field, direction) = match s.split_once(':') {
            Some((field, dir)) => {
                let direction = match dir.trim().to_ascii_lowercase().as_str() {
                    "asc" => SortDirection::Asc,
                    "desc" => SortDirection::Desc,
                    other => return Err(format!("Invalid sort direction '{other}'. Expected asc or desc.")),
                };
                (field.trim(), direction)
            }
            None => (s, SortDirection::Asc),
        };
        if field.is_empty() {
            return Err("Sort field must not be empty.".to_string());
        }
        Ok(SortSpec::new(field, direction))
    }
}

/// Ordered `field:value` filter pairs, rendered comma-joined.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSpec {
    pairs: Vec<(String, String)>,
}

impl FilterSpec {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    pub fn push(&mut self, field: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((field.into(), value.into()));
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, (field, value)) in self.pairs.iter().enumerate() {
            if idx > 0 {
                f.write_str(",")?;
            }
            write!(f, "{field}:{value}")?;
        }
        Ok(())
    }
}

/// Parse one `field:value` filter pair (used as a clap value parser).
pub fn parse_filter_pair(s: &str) -> Result<(String, String), String> {
    let (field, value) = s
        .split_once(':')
        .ok_or_else(|| format!("Invalid filter '{s}'. Expected field:value."))?;
    let field = field.trim();
    if field.is_empty() {
        return Err(format!("Invalid filter '{s}': empty field name."));
    }
    Ok((field.to_string(), value.trim().to_string()))
}

/// What the driver does with a record that produced validation warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ValidationPolicy {
    /// Log the warnings and keep the record.
    #[default]
    Keep,
    /// Log the warnings and discard the record.
    Drop,
}

/// A non-fatal problem found on a catalog record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationWarning {
    MissingField {
        record: String,
        field: &'static str,
    },
    UnparsableField {
        record: String,
        field: &'static str,
        value: String,
    },
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationWarning::MissingField { record, field } => write!(f, "{record} has no {field}."),
            ValidationWarning::UnparsableField { record, field, value } => {
                write!(f, "{record} has an unparsable {field} '{value}'.")
            }
        }
    }
}

/// Extract the calendar year from an ISO-prefixed date (`YYYY-...`).
///
/// Only the first `-`-separated token is looked at, so `2001-11-15 00:00:00`
/// and `2001-11` both yield `2001`.
pub fn parse_year(date: &str) -> Option<i32> {
    date.trim().split('-').next()?.trim().parse::<i32>().ok()
}
