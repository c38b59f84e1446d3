use std::cmp::Ordering;

use itertools::Itertools;

use crate::analysis::atr::compute_atr;
use crate::analysis::clustering::{
    cluster_candidates, dedup_by_rounded_price, extreme_first, merge_nearby_levels,
};
use crate::analysis::swings::{
    apply_atr_guardrail, intraday_reversals, three_bar_reversals, weekly_necklines,
};
use crate::config::AnalysisConfig;
use crate::data::{round_to, Bar, IntervalFamily, LevelCandidate, LevelType, Series};

/// Final support (ascending) and resistance (descending) price lists.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SupportResistance {
    pub supports: Vec<f64>,
    pub resistances: Vec<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingMode {
    /// Closest to the last close first, then most recent.
    DistanceFirst,
    /// Oldest first, then closest to the last close.
    StructureFirst,
}

/// Inclusive price window a selected level must fall into.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PriceBounds {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceBounds {
    pub fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
        }
    }

    pub fn at_most(max: f64) -> Self {
        Self {
            min: None,
            max: Some(max),
        }
    }

    pub fn admits(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

/// Inputs shared by every selection stage of one invocation.
#[derive(Debug, Clone, Copy)]
pub struct SelectionContext {
    pub last_close: f64,
    /// Minimum spacing between levels on one side; zero disables clustering.
    pub tolerance: f64,
    pub count: usize,
    pub decimals: u32,
}

impl SelectionContext {
    fn far_enough(&self, a: f64, b: f64) -> bool {
        if self.tolerance > 0.0 {
            (a - b).abs() >= self.tolerance
        } else {
            round_to(a, self.decimals) != round_to(b, self.decimals)
        }
    }
}

/// Detect support/resistance for `series` with the heuristic of the interval's family.
///
/// `atr` is computed from the series when not supplied. Each side returns at most
/// `levels.level_count` prices; a side left empty by detection falls back to simple
/// extremes of the same lookback window.
pub fn compute_support_resistance(
    series: &Series,
    interval: &str,
    atr: Option<f64>,
    config: &AnalysisConfig,
) -> SupportResistance {
    let bars = series.bars();
    let Some(last_close) = series.last_close() else {
        return SupportResistance::default();
    };

    let family = IntervalFamily::from_interval(interval);
    let level_config = &config.levels;
    let atr = atr
        .or_else(|| compute_atr(bars, config.indicators.atr_period))
        .filter(|value| value.is_finite() && *value > 0.0);
    let ctx = SelectionContext {
        last_close,
        tolerance: atr.map_or(0.0, |value| value * level_config.cluster_tolerance_atr),
        count: level_config.level_count,
        decimals: level_config.price_decimals,
    };
    let window = match level_config.lookback(family) {
        Some(lookback) => series.tail(lookback),
        None => bars,
    };

    let mut levels = match family {
        IntervalFamily::Intraday => {
            let set = intraday_reversals(window, level_config.intraday_reversal_window);
            let supports = select_levels(
                &set.supports,
                LevelType::Support,
                RankingMode::DistanceFirst,
                PriceBounds::at_most(last_close),
                &ctx,
            );
            let floor = resistance_floor(last_close, &supports);
            let resistances = select_levels(
                &set.resistances,
                LevelType::Resistance,
                RankingMode::DistanceFirst,
                PriceBounds::at_least(floor),
                &ctx,
            );
            SupportResistance {
                supports,
                resistances,
            }
        }
        IntervalFamily::Swing => match weekly_necklines(window) {
            Some(set) => SupportResistance {
                supports: select_levels(
                    &set.supports,
                    LevelType::Support,
                    RankingMode::StructureFirst,
                    PriceBounds::default(),
                    &ctx,
                ),
                resistances: select_levels(
                    &set.resistances,
                    LevelType::Resistance,
                    RankingMode::StructureFirst,
                    PriceBounds::default(),
                    &ctx,
                ),
            },
            None => {
                tracing::debug!("no weekly breakout; using merged window extremes");
                merged_extremes(window, level_config.swing_merge_tolerance, &ctx)
            }
        },
        IntervalFamily::Position => {
            let mut set = three_bar_reversals(window, level_config.position_reversal_candles);
            if let Some(atr) = atr {
                apply_atr_guardrail(
                    &mut set,
                    last_close,
                    atr,
                    level_config.guardrail_atr_multiplier,
                );
            }
            SupportResistance {
                supports: select_levels(
                    &set.supports,
                    LevelType::Support,
                    RankingMode::StructureFirst,
                    PriceBounds::default(),
                    &ctx,
                ),
                resistances: select_levels(
                    &set.resistances,
                    LevelType::Resistance,
                    RankingMode::StructureFirst,
                    PriceBounds::default(),
                    &ctx,
                ),
            }
        }
        IntervalFamily::Other => simple_extremes(window, &ctx),
    };

    if levels.supports.is_empty() {
        tracing::debug!(interval, "no qualified supports; using window extremes");
        levels.supports = simple_extremes(window, &ctx).supports;
    }
    if levels.resistances.is_empty() {
        tracing::debug!(interval, "no qualified resistances; using window extremes");
        levels.resistances = simple_extremes(window, &ctx).resistances;
    }

    if family == IntervalFamily::Intraday {
        enforce_resistance_floor(&mut levels, window, &ctx);
    }

    levels
        .supports
        .sort_by(|a, b| extreme_first(*a, *b, LevelType::Support));
    levels
        .resistances
        .sort_by(|a, b| extreme_first(*a, *b, LevelType::Resistance));
    levels
}

/// Resistances must sit at or above both the last close and the highest support.
fn resistance_floor(last_close: f64, supports: &[f64]) -> f64 {
    supports.iter().copied().fold(last_close, f64::max)
}

fn enforce_resistance_floor(levels: &mut SupportResistance, window: &[Bar], ctx: &SelectionContext) {
    let floor = resistance_floor(ctx.last_close, &levels.supports);
    levels.resistances.retain(|price| *price >= floor);
    if levels.resistances.is_empty() {
        let highest = window.iter().map(|bar| bar.high).fold(f64::MIN, f64::max);
        if highest.is_finite() {
            tracing::debug!(floor, highest, "resistances below floor; using window high");
            levels.resistances.push(round_to(highest, ctx.decimals));
        }
    }
}

/// Reduce, constrain, rank and backfill one side's candidates into at most
/// `ctx.count` prices, most extreme first.
pub fn select_levels(
    candidates: &[LevelCandidate],
    level_type: LevelType,
    mode: RankingMode,
    bounds: PriceBounds,
    ctx: &SelectionContext,
) -> Vec<f64> {
    if candidates.is_empty() || ctx.count == 0 {
        return Vec::new();
    }

    let reduced: Vec<LevelCandidate> = if ctx.tolerance > 0.0 {
        cluster_candidates(candidates, ctx.tolerance, level_type)
    } else {
        dedup_by_rounded_price(candidates, ctx.decimals, level_type)
    }
    .into_iter()
    .map(|c| LevelCandidate::new(round_to(c.price, ctx.decimals), c.timestamp))
    .collect();

    let constrained: Vec<LevelCandidate> = reduced
        .iter()
        .filter(|c| bounds.admits(c.price))
        .cloned()
        .collect();

    let mut selected: Vec<f64> = if constrained.is_empty() {
        tracing::debug!(
            ?level_type,
            candidates = reduced.len(),
            "price bounds removed every candidate; keeping best unconstrained"
        );
        rank_levels(reduced, mode, ctx.last_close)
            .into_iter()
            .take(1)
            .map(|c| c.price)
            .collect()
    } else {
        rank_levels(constrained, mode, ctx.last_close)
            .into_iter()
            .take(ctx.count)
            .map(|c| c.price)
            .collect()
    };

    if selected.len() < ctx.count {
        fill_in(&mut selected, candidates, bounds, ctx);
    }

    selected.sort_by(|a, b| extreme_first(*a, *b, level_type));
    selected
}

/// Order candidates by the ranking policy; the sort is stable.
pub fn rank_levels(
    mut candidates: Vec<LevelCandidate>,
    mode: RankingMode,
    last_close: f64,
) -> Vec<LevelCandidate> {
    let distance = |c: &LevelCandidate| (c.price - last_close).abs();
    candidates.sort_by(|a, b| match mode {
        RankingMode::DistanceFirst => distance(a)
            .partial_cmp(&distance(b))
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.timestamp.cmp(&a.timestamp)),
        RankingMode::StructureFirst => a.timestamp.cmp(&b.timestamp).then_with(|| {
            distance(a)
                .partial_cmp(&distance(b))
                .unwrap_or(Ordering::Equal)
        }),
    });
    candidates
}

/// Top up `selected` from the raw candidates, newest first, with prices that keep
/// the side's spacing and satisfy `bounds`.
fn fill_in(
    selected: &mut Vec<f64>,
    candidates: &[LevelCandidate],
    bounds: PriceBounds,
    ctx: &SelectionContext,
) {
    let before = selected.len();
    let newest_first = candidates
        .iter()
        .sorted_by(|a, b| b.timestamp.cmp(&a.timestamp));
    for candidate in newest_first {
        if selected.len() >= ctx.count {
            break;
        }
        let price = round_to(candidate.price, ctx.decimals);
        if !bounds.admits(price) {
            continue;
        }
        if selected.iter().all(|existing| ctx.far_enough(*existing, price)) {
            selected.push(price);
        }
    }
    if selected.len() > before {
        tracing::debug!(added = selected.len() - before, "filled in levels from unused candidates");
    }
}

/// The `count` lowest lows and highest highs of `window`, keeping the side's spacing.
pub fn simple_extremes(window: &[Bar], ctx: &SelectionContext) -> SupportResistance {
    let pick = |values: Vec<f64>, level_type: LevelType| -> Vec<f64> {
        let mut picked: Vec<f64> = Vec::new();
        let ordered = values
            .into_iter()
            .filter(|v| v.is_finite())
            .map(|v| round_to(v, ctx.decimals))
            .sorted_by(|a, b| extreme_first(*a, *b, level_type));
        for value in ordered {
            if picked.len() >= ctx.count {
                break;
            }
            if picked.iter().all(|existing| ctx.far_enough(*existing, value)) {
                picked.push(value);
            }
        }
        picked
    };

    SupportResistance {
        supports: pick(window.iter().map(|bar| bar.low).collect(), LevelType::Support),
        resistances: pick(window.iter().map(|bar| bar.high).collect(), LevelType::Resistance),
    }
}

/// Window extremes merged by a fixed price tolerance.
fn merged_extremes(window: &[Bar], tolerance: f64, ctx: &SelectionContext) -> SupportResistance {
    let extremes = simple_extremes(window, ctx);
    let lows: Vec<f64> = window.iter().map(|bar| bar.low).collect();
    let highs: Vec<f64> = window.iter().map(|bar| bar.high).collect();
    SupportResistance {
        supports: merge_nearby_levels(
            &extremes.supports,
            &lows,
            tolerance,
            LevelType::Support,
            ctx.decimals,
        ),
        resistances: merge_nearby_levels(
            &extremes.resistances,
            &highs,
            tolerance,
            LevelType::Resistance,
            ctx.decimals,
        ),
    }
}
