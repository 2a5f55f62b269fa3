//! CPI aggregation and inflation adjustment.
//!
//! The raw feed (FRED `CPIAUCSL.txt` style) has one observation per line:
//!
//! ```text
//! DATE         VALUE
//! 1947-01-01   21.480
//! 1947-02-01   21.620
//! ```
//!
//! We reduce it to a single average per calendar year. Adjustments never
//! extrapolate: years outside the loaded range are clamped to the edge years.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{debug, info};

use crate::data::fred::FeedSource;
use crate::domain::parse_year;
use crate::error::AppError;

const HEADER_TOKEN: &str = "DATE";

/// One parsed input line. Consumed immediately by the year accumulator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub year: i32,
    pub value: f64,
}

/// Parse `<date> <value>`; `line_no` is 1-based and only used for errors.
pub fn parse_observation(line: &str, line_no: usize) -> Result<Observation, AppError> {
    let mut tokens = line.split_whitespace();
    let (Some(date), Some(raw_value)) = (tokens.next(), tokens.next()) else {
        return Err(AppError::MalformedInput(format!(
            "CPI line {line_no}: expected '<date> <value>', got '{}'",
            line.trim()
        )));
    };

    let year = parse_year(date).ok_or_else(|| {
        AppError::MalformedInput(format!("CPI line {line_no}: invalid date '{date}'"))
    })?;

    let value = raw_value
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
        .ok_or_else(|| AppError::MalformedInput(format!("CPI line {line_no}: invalid value '{raw_value}'")))?;

    Ok(Observation { year, value })
}

/// Undecodable text is bad input; anything else is a real read failure.
fn read_error(line_no: usize, err: std::io::Error) -> AppError {
    if err.kind() == std::io::ErrorKind::InvalidData {
        AppError::MalformedInput(format!("CPI line {line_no}: {err}"))
    } else {
        AppError::io("<cpi input>", err)
    }
}

/// Running per-year buffer.
#[derive(Debug, Default)]
struct YearAccumulator {
    year: Option<i32>,
    sum: f64,
    count: usize,
}

impl YearAccumulator {
    /// Add an observation; returns the finished `(year, average)` when the
    /// year changes.
    fn push(&mut self, obs: Observation) -> Option<(i32, f64)> {
        let finished = match self.year {
            Some(year) if year != obs.year => self.finish(),
            _ => None,
        };
        self.year = Some(obs.year);
        self.sum += obs.value;
        self.count += 1;
        finished
    }

    fn finish(&mut self) -> Option<(i32, f64)> {
        let year = self.year.take()?;
        let avg = self.sum / self.count as f64;
        self.sum = 0.0;
        self.count = 0;
        Some((year, avg))
    }
}

/// Yearly CPI averages.
///
/// Holds exactly one value per year that had observations, plus the
/// `[first_year, last_year]` range used for clamping.
#[derive(Debug, Clone, Default)]
pub struct CpiData {
    year_cpi: BTreeMap<i32, f64>,
    first_year: Option<i32>,
    last_year: Option<i32>,
}

impl CpiData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn first_year(&self) -> Option<i32> {
        self.first_year
    }

    pub fn last_year(&self) -> Option<i32> {
        self.last_year
    }

    pub fn get(&self, year: i32) -> Option<f64> {
        self.year_cpi.get(&year).copied()
    }

    pub fn len(&self) -> usize {
        self.year_cpi.len()
    }

    pub fn is_empty(&self) -> bool {
        self.year_cpi.is_empty()
    }

    /// `(year, average)` pairs in ascending year order.
    pub fn years(&self) -> impl Iterator<Item = (i32, f64)> + '_ {
        self.year_cpi.iter().map(|(&y, &v)| (y, v))
    }

    /// Ingest a line-oriented CPI feed and return how many years it produced.
    ///
    /// Everything up to and including the `DATE` header is skipped. Blank lines
    /// are ignored; any other unparsable line fails the whole call and leaves
    /// `self` untouched.
    ///
    /// A year already present from an earlier call is replaced by this call's
    /// average; observations are not merged across calls.
    pub fn ingest<R: BufRead>(&mut self, reader: R) -> Result<usize, AppError> {
        let mut lines = reader.lines().enumerate();

        let mut saw_header = false;
        for (idx, line) in lines.by_ref() {
            let line = line.map_err(|e| read_error(idx + 1, e))?;
            if line.starts_with(HEADER_TOKEN) {
                saw_header = true;
                break;
            }
        }
        if !saw_header {
            return Err(AppError::MalformedInput(format!(
                "CPI input has no header line starting with '{HEADER_TOKEN}'"
            )));
        }

        let mut staged: BTreeMap<i32, f64> = BTreeMap::new();
        let mut acc = YearAccumulator::default();
        let mut n_obs = 0usize;

        for (idx, line) in lines {
            let line = line.map_err(|e| read_error(idx + 1, e))?;
            if line.trim().is_empty() {
                continue;
            }
            let obs = parse_observation(&line, idx + 1)?;
            n_obs += 1;
            if let Some((year, avg)) = acc.push(obs) {
                staged.insert(year, avg);
            }
        }
        // Final flush: the last year never sees a year change.
        if let Some((year, avg)) = acc.finish() {
            staged.insert(year, avg);
        }

        let n_years = staged.len();
        if let (Some(&lo), Some(&hi)) = (staged.keys().next(), staged.keys().next_back()) {
            self.first_year = Some(self.first_year.map_or(lo, |y| y.min(lo)));
            self.last_year = Some(self.last_year.map_or(hi, |y| y.max(hi)));
        }
        self.year_cpi.extend(staged);

        debug!("Ingested {n_obs} CPI observations into {n_years} yearly averages");
        Ok(n_years)
    }

    pub fn load_from_file(&mut self, path: &Path) -> Result<usize, AppError> {
        let file = File::open(path).map_err(|e| AppError::io(path, e))?;
        let n = self.ingest(BufReader::new(file))?;
        info!("Loaded {n} CPI years from {}", path.display());
        Ok(n)
    }

    /// Load from a remote feed. With `save_as`, the body is persisted first and
    /// then read back from that file.
    pub fn load_from_url<S: FeedSource + ?Sized>(
        &mut self,
        source: &S,
        url: &str,
        save_as: Option<&Path>,
    ) -> Result<usize, AppError> {
        match save_as {
            Some(path) => {
                source.download_to(url, path)?;
                self.load_from_file(path)
            }
            None => {
                let body = source.fetch_text(url)?;
                self.ingest(body.as_bytes())
            }
        }
    }

    /// Use the local cache when it exists, otherwise download into it.
    pub fn load_cached_or_remote<S: FeedSource + ?Sized>(
        &mut self,
        source: &S,
        cache: &Path,
        url: &str,
    ) -> Result<usize, AppError> {
        if cache.exists() {
            self.load_from_file(cache)
        } else {
            info!("CPI cache {} not found, downloading {url}", cache.display());
            self.load_from_url(source, url, Some(cache))
        }
    }

    /// Express `amount` from `source_year` money in `target_year` money.
    ///
    /// Both years are clamped into `[first_year, last_year]` first.
    pub fn adjusted_price(&self, amount: f64, source_year: i32, target_year: i32) -> Result<f64, AppError> {
        let (Some(first), Some(last)) = (self.first_year, self.last_year) else {
            return Err(AppError::Range("No CPI data loaded; cannot adjust prices.".to_string()));
        };

        let source = source_year.clamp(first, last);
        let target = target_year.clamp(first, last);

        let source_cpi = self.get(source).ok_or(AppError::MissingYear(source))?;
        let target_cpi = self.get(target).ok_or(AppError::MissingYear(target))?;

        Ok(amount * (target_cpi / source_cpi))
    }
}
