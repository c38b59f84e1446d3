use std::collections::BTreeMap;

use crate::analysis::stats::{linear_regression_slope, rolling_mean};
use crate::config::MovingAverageConfig;
use crate::data::{
    round_to, Bar, EmaFeature, IntervalFamily, Reaction, SlopeLabel, SmaFeature, SmaOrdering,
    SmaSummary,
};

/// Simple moving average; `None` until a full period is available.
pub fn sma(values: &[f64], period: usize) -> Vec<Option<f64>> {
    rolling_mean(values, period, period)
}

/// Exponential moving average (alpha = 2 / (period + 1)) seeded with the simple mean
/// of the first `period` values.
pub fn ema(values: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if period == 0 || values.len() < period {
        return out;
    }

    let alpha = 2.0 / (period as f64 + 1.0);
    let mut prev = values[..period].iter().sum::<f64>() / period as f64;
    out[period - 1] = Some(prev);
    for idx in period..values.len() {
        prev = alpha * values[idx] + (1.0 - alpha) * prev;
        out[idx] = Some(prev);
    }
    out
}

/// Label the regression slope of the last `lookback` SMA points, normalized by the first of them.
pub fn classify_slope(series: &[Option<f64>], config: &MovingAverageConfig) -> Option<SlopeLabel> {
    let valid: Vec<f64> = series.iter().flatten().copied().collect();
    let tail = &valid[valid.len().saturating_sub(config.slope_lookback)..];
    let base = *tail.first()?;
    if base == 0.0 {
        return None;
    }
    let normalized: Vec<f64> = tail.iter().map(|v| v / base).collect();
    let slope = linear_regression_slope(&normalized)?;

    let label = if slope > config.strong_slope_threshold {
        SlopeLabel::StrongUp
    } else if slope > config.slope_threshold {
        SlopeLabel::Up
    } else if slope < -config.strong_slope_threshold {
        SlopeLabel::StrongDown
    } else if slope < -config.slope_threshold {
        SlopeLabel::Down
    } else {
        SlopeLabel::Flat
    };
    Some(label)
}

pub fn compute_sma_features(closes: &[f64], config: &MovingAverageConfig) -> SmaSummary {
    let mut periods: Vec<usize> = config.sma_periods.iter().copied().filter(|p| *p > 0).collect();
    periods.sort_unstable();
    periods.dedup();

    let shortest = periods.first().copied();
    let last_close = closes.last().copied();

    let mut summary = SmaSummary::default();
    for &period in &periods {
        let series = sma(closes, period);
        let latest = series.last().copied().flatten();
        let deviation = match (Some(period) == shortest, latest, last_close) {
            (true, Some(avg), Some(close)) if avg != 0.0 => Some(round_to((close - avg) / avg, 6)),
            _ => None,
        };
        summary.periods.insert(
            period,
            SmaFeature {
                latest: latest.map(|v| round_to(v, 5)),
                slope: classify_slope(&series, config),
                deviation,
            },
        );
    }

    summary.ordering = sma_ordering(&summary.periods);
    summary
}

/// Bullish when shorter averages sit strictly above longer ones, bearish when reversed.
fn sma_ordering(periods: &BTreeMap<usize, SmaFeature>) -> Option<SmaOrdering> {
    if periods.len() < 2 {
        return None;
    }
    let latest: Vec<f64> = periods
        .values()
        .map(|feature| feature.latest)
        .collect::<Option<Vec<f64>>>()?;

    let ordering = if latest.windows(2).all(|pair| pair[0] > pair[1]) {
        SmaOrdering::Bullish
    } else if latest.windows(2).all(|pair| pair[0] < pair[1]) {
        SmaOrdering::Bearish
    } else {
        SmaOrdering::Mixed
    };
    Some(ordering)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    Above,
    Below,
}

/// Scan the trailing `window` bars, newest first, for the latest EMA reaction.
///
/// Returns the reaction and how many bars ago it printed.
pub fn detect_reaction(bars: &[Bar], ema: &[Option<f64>], window: usize) -> (Reaction, Option<usize>) {
    let n = bars.len().min(ema.len());
    let start = n.saturating_sub(window);

    for idx in (start..n).rev() {
        let Some(level) = ema[idx] else { continue };
        let bar = &bars[idx];

        if bar.low < level && bar.close > level && holds(bars, ema, idx, Side::Above) {
            return (Reaction::SupportBounce, Some(n - 1 - idx));
        }
        if bar.high > level && bar.close < level && holds(bars, ema, idx, Side::Below) {
            return (Reaction::ResistanceReject, Some(n - 1 - idx));
        }
    }
    (Reaction::NoReaction, None)
}

/// Up to two follow-through closes stay on `side` of the EMA and the last of them
/// extends beyond the reaction close. Near the series end fewer bars are checked.
fn holds(bars: &[Bar], ema: &[Option<f64>], idx: usize, side: Side) -> bool {
    let n = bars.len().min(ema.len());
    let end = (idx + 2).min(n - 1);
    for k in idx + 1..=end {
        let Some(level) = ema[k] else { return false };
        let close = bars[k].close;
        let on_side = match side {
            Side::Above => close >= level,
            Side::Below => close <= level,
        };
        if !on_side {
            return false;
        }
    }
    if end == idx {
        return true;
    }
    match side {
        Side::Above => bars[end].close > bars[idx].close,
        Side::Below => bars[end].close < bars[idx].close,
    }
}

pub fn compute_ema_features(
    bars: &[Bar],
    family: IntervalFamily,
    config: &MovingAverageConfig,
) -> BTreeMap<usize, EmaFeature> {
    let closes: Vec<f64> = bars.iter().map(|bar| bar.close).collect();
    let window = config.reaction_windows.for_family(family);

    config
        .ema_periods
        .iter()
        .copied()
        .filter(|p| *p > 0)
        .map(|period| {
            let series = ema(&closes, period);
            let latest = series.last().copied().flatten().map(|v| round_to(v, 5));
            let (reaction, reaction_bars_ago) = detect_reaction(bars, &series, window);
            (
                period,
                EmaFeature {
                    latest,
                    reaction,
                    reaction_bars_ago,
                },
            )
        })
        .collect()
}
