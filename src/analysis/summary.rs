use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;

use crate::analysis::atr::{compute_atr, compute_average_volatility};
use crate::analysis::levels::compute_support_resistance;
use crate::analysis::moving_average::{compute_ema_features, compute_sma_features};
use crate::analysis::rsi::compute_rsi;
use crate::analysis::trend::detect_trend;
use crate::config::AnalysisConfig;
use crate::data::{AnalysisResult, IntervalFamily, Series, SCHEMA_VERSION};

/// Compute every indicator and level for one series, stamped with the current time in `tz`.
pub fn analyze_series(
    series: &Series,
    pair: &str,
    interval: &str,
    period: &str,
    config: &AnalysisConfig,
    tz: Tz,
) -> AnalysisResult {
    let generated_at = Utc::now().with_timezone(&tz).fixed_offset();
    analyze_series_at(series, pair, interval, period, config, generated_at)
}

/// Deterministic variant of [`analyze_series`] with an explicit generation time.
pub fn analyze_series_at(
    series: &Series,
    pair: &str,
    interval: &str,
    period: &str,
    config: &AnalysisConfig,
    generated_at: DateTime<FixedOffset>,
) -> AnalysisResult {
    let bars = series.bars();
    let closes = series.closes();
    let family = IntervalFamily::from_interval(interval);

    let atr = compute_atr(bars, config.indicators.atr_period);
    let levels = compute_support_resistance(series, interval, atr, config);

    tracing::debug!(
        pair,
        interval,
        bars = bars.len(),
        supports = ?levels.supports,
        resistances = ?levels.resistances,
        "analysed series"
    );

    AnalysisResult {
        pair: pair.to_string(),
        interval: interval.to_string(),
        period: period.to_string(),
        trend: detect_trend(&closes, &config.trend),
        support_levels: levels.supports,
        resistance_levels: levels.resistances,
        rsi: compute_rsi(&closes, config.indicators.rsi_period),
        atr,
        average_volatility: compute_average_volatility(bars),
        sma: compute_sma_features(&closes, &config.moving_averages),
        ema: compute_ema_features(bars, family, &config.moving_averages),
        generated_at,
        schema_version: SCHEMA_VERSION,
    }
}
