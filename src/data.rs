use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Version of the JSON document produced for every analysed series.
pub const SCHEMA_VERSION: u32 = 2;

/// Single OHLC bar sampled at a uniform interval.
#[derive(Debug, Clone, PartialEq)]
pub struct Bar {
    pub timestamp: DateTime<Tz>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: Option<u64>,
}

impl Bar {
    pub fn is_bullish(&self) -> bool {
        self.close > self.open
    }

    pub fn is_bearish(&self) -> bool {
        self.close < self.open
    }
}

/// Time-ordered bars of one instrument at one sampling interval.
///
/// Timestamps are strictly increasing; the series is never mutated once built.
#[derive(Debug, Clone, Default)]
pub struct Series {
    bars: Vec<Bar>,
}

impl Series {
    /// Sort by timestamp and drop repeated timestamps, keeping the first occurrence.
    pub fn from_bars(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|bar| bar.timestamp);
        bars.dedup_by(|later, earlier| later.timestamp == earlier.timestamp);
        Self { bars }
    }

    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|bar| bar.close).collect()
    }

    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|bar| bar.close)
    }

    /// The most recent `count` bars (or all of them when the series is shorter).
    pub fn tail(&self, count: usize) -> &[Bar] {
        let start = self.bars.len().saturating_sub(count);
        &self.bars[start..]
    }
}

/// Family of level-detection heuristics selected by the sampling interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalFamily {
    /// Hourly bars: session reversals, distance-first ranking.
    Intraday,
    /// Four-hour bars: weekly necklines, structure-first ranking.
    Swing,
    /// Daily bars: three-candle reversals, structure-first ranking.
    Position,
    Other,
}

impl IntervalFamily {
    pub fn from_interval(interval: &str) -> Self {
        match interval.trim().to_ascii_lowercase().as_str() {
            "1h" => Self::Intraday,
            "4h" => Self::Swing,
            "1d" => Self::Position,
            _ => Self::Other,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Trend {
    Up,
    Down,
    Sideways,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelType {
    Support,
    Resistance,
}

/// Locally significant extreme discovered during level detection.
#[derive(Debug, Clone, PartialEq)]
pub struct LevelCandidate {
    pub price: f64,
    pub timestamp: DateTime<Tz>,
}

impl LevelCandidate {
    pub fn new(price: f64, timestamp: DateTime<Tz>) -> Self {
        Self { price, timestamp }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlopeLabel {
    StrongUp,
    Up,
    Flat,
    Down,
    StrongDown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SmaOrdering {
    Bullish,
    Bearish,
    Mixed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reaction {
    SupportBounce,
    ResistanceReject,
    #[serde(rename = "none")]
    NoReaction,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmaFeature {
    pub latest: Option<f64>,
    pub slope: Option<SlopeLabel>,
    /// Relative distance of the last close from the SMA; shortest period only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deviation: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SmaSummary {
    pub periods: BTreeMap<usize, SmaFeature>,
    pub ordering: Option<SmaOrdering>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmaFeature {
    pub latest: Option<f64>,
    pub reaction: Reaction,
    pub reaction_bars_ago: Option<usize>,
}

/// Technical summary for one (pair, interval, period) input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub pair: String,
    pub interval: String,
    pub period: String,
    pub trend: Trend,
    /// Ascending.
    pub support_levels: Vec<f64>,
    /// Descending.
    pub resistance_levels: Vec<f64>,
    pub rsi: Option<f64>,
    pub atr: Option<f64>,
    pub average_volatility: Option<f64>,
    pub sma: SmaSummary,
    pub ema: BTreeMap<usize, EmaFeature>,
    pub generated_at: DateTime<FixedOffset>,
    pub schema_version: u32,
}

/// Round to a fixed number of decimal places for reporting.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}
