//! Run configuration.
//!
//! Every endpoint, credential and output knob lives here and is passed into the
//! components at construction time. Nothing is compiled in except defaults for
//! public URLs.

use std::path::PathBuf;
use std::time::Duration;

use crate::domain::{FilterSpec, SortDirection, SortSpec, ValidationPolicy};
use crate::error::AppError;

pub const DEFAULT_CATALOG_URL: &str = "https://www.giantbomb.com/api";
pub const DEFAULT_CATALOG_RESOURCE: &str = "platforms";
pub const DEFAULT_CPI_URL: &str = "https://fred.stlouisfed.org/data/CPIAUCSL.txt";
pub const DEFAULT_CPI_FILE: &str = "cpi_data.txt";
pub const DEFAULT_USER_AGENT: &str = concat!("padj/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_FIELDS: [&str; 4] = ["abbreviation", "name", "original_price", "release_date"];

/// Remote catalog endpoint and credentials.
#[derive(Clone)]
pub struct CatalogConfig {
    pub base_url: String,
    pub resource: String,
    pub api_key: String,
    pub user_agent: String,
    pub timeout: Duration,
    /// Minimum spacing between two page requests.
    pub request_interval: Duration,
}

impl CatalogConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_CATALOG_URL.to_string(),
            resource: DEFAULT_CATALOG_RESOURCE.to_string(),
            api_key: api_key.into(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
            request_interval: Duration::from_secs(1),
        }
    }
}

// The API key must never end up in logs.
impl std::fmt::Debug for CatalogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogConfig")
            .field("base_url", &self.base_url)
            .field("resource", &self.resource)
            .field("api_key", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .field("timeout", &self.timeout)
            .field("request_interval", &self.request_interval)
            .finish()
    }
}

/// Where CPI data comes from.
#[derive(Debug, Clone)]
pub struct CpiConfig {
    pub url: String,
    /// Local cache: read when present, written on first download.
    pub cache_file: PathBuf,
    pub user_agent: String,
    pub timeout: Duration,
}

impl Default for CpiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_CPI_URL.to_string(),
            cache_file: PathBuf::from(DEFAULT_CPI_FILE),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// Catalog query shape.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    pub sort: Option<SortSpec>,
    pub filter: FilterSpec,
    pub field_list: Vec<String>,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            sort: Some(SortSpec::new("release_date", SortDirection::Desc)),
            filter: FilterSpec::default(),
            field_list: DEFAULT_FIELDS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// Sink options.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub csv: Option<PathBuf>,
    pub plot: Option<PathBuf>,
    /// Print a text bar chart to stdout.
    pub ascii: bool,
    /// Records priced at or above this are left out of charts.
    pub price_ceiling: f64,
    /// Names longer than this are replaced by the abbreviation in charts.
    pub name_limit: usize,
    pub chart_width: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            csv: None,
            plot: None,
            ascii: false,
            price_ceiling: 2000.0,
            name_limit: 15,
            chart_width: 60,
        }
    }
}

/// Everything one `padj run` needs.
#[derive(Debug, Clone)]
pub struct Settings {
    pub catalog: CatalogConfig,
    pub cpi: CpiConfig,
    pub query: QueryConfig,
    /// Year prices are expressed in. `None` means the current calendar year
    /// (clamped to the loaded CPI range).
    pub target_year: Option<i32>,
    pub limit: Option<usize>,
    pub on_invalid: ValidationPolicy,
    pub output: OutputConfig,
}

impl Settings {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            catalog: CatalogConfig::new(api_key),
            cpi: CpiConfig::default(),
            query: QueryConfig::default(),
            target_year: None,
            limit: None,
            on_invalid: ValidationPolicy::default(),
            output: OutputConfig::default(),
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.catalog.api_key.trim().is_empty() {
            return Err(AppError::Config(
                "Missing catalog API key (use --api-key or GIANTBOMB_API_KEY).".to_string(),
            ));
        }
        if self.catalog.base_url.trim().is_empty() {
            return Err(AppError::Config("Catalog base URL must not be empty.".to_string()));
        }
        if self.query.field_list.is_empty() {
            return Err(AppError::Config("Field list must not be empty.".to_string()));
        }
        if !(self.output.price_ceiling.is_finite() && self.output.price_ceiling > 0.0) {
            return Err(AppError::Config("Price ceiling must be finite and > 0.".to_string()));
        }
        if self.limit == Some(0) {
            return Err(AppError::Config("Limit must be > 0.".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_catalog_conventions() {
        let settings = Settings::new("key");
        assert_eq!(settings.catalog.base_url, DEFAULT_CATALOG_URL);
        assert_eq!(settings.query.sort.as_ref().map(|s| s.to_string()).as_deref(), Some("release_date:desc"));
        assert_eq!(settings.query.field_list.len(), 4);
        assert_eq!(settings.output.price_ceiling, 2000.0);
        assert_eq!(settings.output.name_limit, 15);
        assert_eq!(settings.on_invalid, ValidationPolicy::Keep);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn validate_rejects_blank_api_key() {
        let settings = Settings::new("   ");
        assert!(matches!(settings.validate(), Err(AppError::Config(_))));
    }

    #[test]
    fn validate_rejects_bad_ceiling_and_limit() {
        let mut settings = Settings::new("key");
        settings.output.price_ceiling = 0.0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::new("key");
        settings.limit = Some(0);
        assert!(settings.validate().is_err());

        let mut settings = Settings::new("key");
        settings.query.field_list.clear();
        assert!(settings.validate().is_err());
    }

    #[test]
    fn debug_output_redacts_api_key() {
        let config = CatalogConfig::new("super-secret");
        let shown = format!("{config:?}");
        assert!(!shown.contains("super-secret"));
        assert!(shown.contains("<redacted>"));
    }
}
