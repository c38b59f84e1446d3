use std::collections::HashSet;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use csv::StringRecord;
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::data::{Bar, Series};

const REQUIRED_PRICE_COLUMNS: [&str; 4] = ["open", "high", "low", "close"];
const TIME_COLUMNS: [&str; 2] = ["datetime", "timestamp"];

/// `<PAIR>_<INTERVAL>_<PERIOD>`, e.g. `USDJPY_1h_10d`.
static FILENAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<pair>[A-Za-z]+)_(?P<interval>\d+[a-zA-Z]+)_(?P<period>\d+[a-zA-Z]+)$")
        .expect("filename pattern is valid")
});

#[derive(Debug, Error)]
pub enum LoaderError {
    #[error("missing required columns {missing:?}")]
    MissingColumns { missing: Vec<String> },

    #[error("input file contains no valid rows")]
    Empty,

    #[error("filename '{name}' does not match '<PAIR>_<INTERVAL>_<PERIOD>.csv'")]
    Filename { name: String },
}

/// Identifiers carried by an input file name such as `USDJPY_1h_10d.csv`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesMetadata {
    pub pair: String,
    pub interval: String,
    pub period: String,
}

pub fn parse_metadata_from_filename(path: &Path) -> Result<SeriesMetadata> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    let Some(caps) = FILENAME_PATTERN.captures(&stem) else {
        return Err(LoaderError::Filename { name }.into());
    };

    Ok(SeriesMetadata {
        pair: caps["pair"].to_ascii_uppercase(),
        interval: caps["interval"].to_string(),
        period: caps["period"].to_string(),
    })
}

/// Expand `input_dir` x `patterns` plus explicit paths or glob expressions into a
/// deduplicated, order-preserving list of existing files.
pub fn collect_input_files(
    input_dir: Option<&Path>,
    patterns: &[String],
    extra: &[String],
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    if let Some(dir) = input_dir {
        for pattern in patterns {
            let full = dir.join(pattern);
            let mut matches = expand_glob(&full.to_string_lossy())?;
            matches.sort();
            paths.extend(matches);
        }
    }

    for entry in extra {
        let matches = expand_glob(entry)?;
        if matches.is_empty() {
            let candidate = PathBuf::from(entry);
            if candidate.exists() {
                paths.push(candidate);
            }
        } else {
            paths.extend(matches);
        }
    }

    let mut seen = HashSet::new();
    let mut unique = Vec::new();
    for path in paths {
        let resolved = fs::canonicalize(&path).unwrap_or(path);
        if seen.insert(resolved.clone()) {
            unique.push(resolved);
        }
    }
    Ok(unique)
}

fn expand_glob(pattern: &str) -> Result<Vec<PathBuf>> {
    let paths = glob::glob(pattern).with_context(|| format!("invalid glob pattern {pattern:?}"))?;
    Ok(paths.filter_map(|entry| entry.ok()).filter(|p| p.is_file()).collect())
}

pub fn load_series_from_csv<P: AsRef<Path>>(path: P, tz: Tz) -> Result<Series> {
    let path_ref = path.as_ref();
    let file = File::open(path_ref).with_context(|| format!("failed to open {:?}", path_ref))?;
    load_series_from_reader(file, tz).with_context(|| format!("failed to parse {:?}", path_ref))
}

/// Read a headed OHLC CSV, coercing rows and normalizing them into a [`Series`].
///
/// Header names are matched case-insensitively. Rows whose timestamp or any
/// price fails to parse are dropped; a missing column is a hard error.
pub fn load_series_from_reader<R: Read>(reader: R, tz: Tz) -> Result<Series> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();
    let layout = ColumnLayout::resolve(&headers)?;

    let mut bars = Vec::new();
    for record in reader.records() {
        let record = record?;
        if record.iter().all(|field| field.trim().is_empty()) {
            continue;
        }
        if let Some(bar) = layout.parse_record(&record, tz) {
            bars.push(bar);
        }
    }

    if bars.is_empty() {
        return Err(LoaderError::Empty.into());
    }

    Ok(Series::from_bars(bars))
}

struct ColumnLayout {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: Option<usize>,
}

impl ColumnLayout {
    fn resolve(headers: &[String]) -> Result<Self, LoaderError> {
        let find = |name: &str| headers.iter().position(|h| h == name);

        let timestamp = TIME_COLUMNS.iter().find_map(|&name| find(name));
        let mut missing: Vec<String> = REQUIRED_PRICE_COLUMNS
            .iter()
            .filter(|&&name| find(name).is_none())
            .map(|&name| name.to_string())
            .collect();
        if timestamp.is_none() {
            missing.insert(0, TIME_COLUMNS[0].to_string());
        }

        match (timestamp, find("open"), find("high"), find("low"), find("close")) {
            (Some(timestamp), Some(open), Some(high), Some(low), Some(close)) => Ok(Self {
                timestamp,
                open,
                high,
                low,
                close,
                volume: find("volume"),
            }),
            _ => Err(LoaderError::MissingColumns { missing }),
        }
    }

    fn parse_record(&self, record: &StringRecord, tz: Tz) -> Option<Bar> {
        let timestamp = parse_timestamp(record.get(self.timestamp)?)?.with_timezone(&tz);
        let open = parse_number(record.get(self.open))?;
        let high = parse_number(record.get(self.high))?;
        let low = parse_number(record.get(self.low))?;
        let close = parse_number(record.get(self.close))?;
        let volume = self
            .volume
            .and_then(|idx| parse_number(record.get(idx)))
            .filter(|v| *v >= 0.0)
            .map(|v| v.round() as u64);

        Some(Bar {
            timestamp,
            open,
            high,
            low,
            close,
            volume,
        })
    }
}

fn parse_number(value: Option<&str>) -> Option<f64> {
    value?
        .trim()
        .replace(',', "")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Parse an offset-aware or naive timestamp; naive values are taken as UTC.
fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.with_timezone(&Utc));
    }

    let offset_patterns = [
        "%Y-%m-%d %H:%M:%S%:z",
        "%Y-%m-%d %H:%M:%S%z",
        "%Y-%m-%d %H:%M:%S%.f%:z",
    ];
    for pattern in &offset_patterns {
        if let Ok(dt) = DateTime::parse_from_str(trimmed, pattern) {
            return Some(dt.with_timezone(&Utc));
        }
    }

    let naive_patterns = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%d %H:%M",
        "%Y/%m/%d %H:%M:%S",
        "%m/%d/%Y %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
    ];
    for pattern in &naive_patterns {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, pattern) {
            return Some(Utc.from_utc_datetime(&datetime));
        }
    }

    let date_patterns = ["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];
    for pattern in &date_patterns {
        if let Ok(date) = NaiveDate::parse_from_str(trimmed, pattern) {
            return date
                .and_hms_opt(0, 0, 0)
                .map(|datetime| Utc.from_utc_datetime(&datetime));
        }
    }

    None
}
