use crate::analysis::stats::{mean, pct_change, rolling_mean, sample_std_dev};
use crate::data::{round_to, Bar};

/// True range per bar; the first bar has no previous close and uses its high-low span.
pub fn true_ranges(bars: &[Bar]) -> Vec<f64> {
    let mut ranges = Vec::with_capacity(bars.len());
    for (idx, bar) in bars.iter().enumerate() {
        let high_low = (bar.high - bar.low).abs();
        let tr = if idx == 0 {
            high_low
        } else {
            let prev_close = bars[idx - 1].close;
            let high_close = (bar.high - prev_close).abs();
            let low_close = (bar.low - prev_close).abs();
            high_low.max(high_close).max(low_close)
        };
        ranges.push(tr);
    }
    ranges
}

/// Latest simple-average true range over `period` bars, rounded to 4 decimals.
///
/// Shorter series average every available bar. `None` below two bars.
pub fn compute_atr(bars: &[Bar], period: usize) -> Option<f64> {
    if bars.len() < 2 || period == 0 {
        return None;
    }

    let ranges = true_ranges(bars);
    let min_periods = period.min(ranges.len());
    let latest = rolling_mean(&ranges, period, min_periods)
        .into_iter()
        .rev()
        .flatten()
        .next()
        .or_else(|| mean(&ranges))?;

    latest.is_finite().then(|| round_to(latest, 4))
}

/// Mean intrabar range, falling back to the dispersion of close-to-close returns.
pub fn compute_average_volatility(bars: &[Bar]) -> Option<f64> {
    let ranges: Vec<f64> = bars
        .iter()
        .map(|bar| bar.high - bar.low)
        .filter(|range| range.is_finite())
        .collect();

    let volatility = mean(&ranges).or_else(|| {
        let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
        sample_std_dev(&pct_change(&closes))
    })?;

    Some(round_to(volatility, 4))
}
