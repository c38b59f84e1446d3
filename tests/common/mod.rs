#![allow(dead_code)]

use chrono::{Duration, TimeZone};
use chrono_tz::UTC;

use kline_summary::data::{Bar, Series};

/// Bars spaced `hours` apart from 2024-01-01 00:00 UTC, one per `(open, high, low, close)`.
pub fn series_every(hours: i64, rows: &[(f64, f64, f64, f64)]) -> Series {
    let start = UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bars = rows
        .iter()
        .enumerate()
        .map(|(idx, &(open, high, low, close))| Bar {
            timestamp: start + Duration::hours(hours * idx as i64),
            open,
            high,
            low,
            close,
            volume: Some(1000),
        })
        .collect();
    Series::from_bars(bars)
}

/// A deterministic wave-shaped series with consistent OHLC geometry.
pub fn wave_rows(count: usize, amplitude: f64) -> Vec<(f64, f64, f64, f64)> {
    let mut rows = Vec::with_capacity(count);
    let mut prev_close: f64 = 100.0;
    for i in 0..count {
        let t = i as f64;
        let close = 100.0 + amplitude * (t / 7.0).sin() + amplitude * 0.5 * (t / 2.3).sin();
        let open = prev_close;
        let wick = 0.2 + 0.3 * (t * 1.7).sin().abs();
        rows.push((open, open.max(close) + wick, open.min(close) - wick, close));
        prev_close = close;
    }
    rows
}

pub fn min(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::INFINITY, f64::min)
}

pub fn max(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}
