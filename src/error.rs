use std::path::PathBuf;

use thiserror::Error;

/// All errors surfaced by `padj`.
///
/// Every variant is fatal for the run; validation issues on catalog records are
/// reported through [`crate::domain::ValidationWarning`] instead.
#[derive(Error, Debug)]
pub enum AppError {
    /// Unparsable CPI line, malformed catalog page, or bad price field.
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// A price adjustment was requested without any CPI data loaded.
    #[error("Range error: {0}")]
    Range(String),

    /// A (clamped) year has no CPI value. Only possible with sparse input.
    #[error("No CPI value for year {0}")]
    MissingYear(i32),

    /// Non-success response from a remote service. Never retried.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A file could not be opened, read or written.
    #[error("I/O error on '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The plot sink failed to draw or write its image.
    #[error("Render error: {0}")]
    Render(String),
}

impl AppError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Process exit code for this error.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Config(_) | AppError::Io { .. } | AppError::Csv(_) | AppError::Render(_) => 2,
            AppError::MalformedInput(_) | AppError::Range(_) | AppError::MissingYear(_) => 3,
            AppError::Transport(_) => 4,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_class() {
        assert_eq!(AppError::Config("x".into()).exit_code(), 2);
        assert_eq!(AppError::MalformedInput("x".into()).exit_code(), 3);
        assert_eq!(AppError::Range("x".into()).exit_code(), 3);
        assert_eq!(AppError::MissingYear(1990).exit_code(), 3);
        assert_eq!(AppError::Transport("x".into()).exit_code(), 4);
    }

    #[test]
    fn io_error_mentions_path() {
        let err = AppError::io(
            "/tmp/cpi_data.txt",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/cpi_data.txt"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn missing_year_display() {
        assert_eq!(AppError::MissingYear(1975).to_string(), "No CPI value for year 1975");
    }
}
