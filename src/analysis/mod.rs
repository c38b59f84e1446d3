pub mod atr;
pub mod clustering;
pub mod levels;
pub mod moving_average;
pub mod rsi;
pub mod stats;
pub mod summary;
pub mod swings;
pub mod trend;

pub use atr::{compute_atr, compute_average_volatility};
pub use levels::{compute_support_resistance, SupportResistance};
pub use moving_average::{compute_ema_features, compute_sma_features};
pub use rsi::compute_rsi;
pub use summary::{analyze_series, analyze_series_at};
pub use trend::detect_trend;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::{Duration, TimeZone};
    use chrono_tz::UTC;

    use crate::data::Bar;

    /// Bar number `index` of a series spaced `hours` apart from 2024-01-01 00:00 UTC.
    pub fn bar_every(hours: i64, index: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        let start = UTC.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Bar {
            timestamp: start + Duration::hours(hours * index as i64),
            open,
            high,
            low,
            close,
            volume: Some(1000),
        }
    }

    /// Hourly bar number `index`.
    pub fn bar(index: usize, open: f64, high: f64, low: f64, close: f64) -> Bar {
        bar_every(1, index, open, high, low, close)
    }
}
