use chrono::Datelike;
use itertools::Itertools;

use crate::data::{Bar, LevelCandidate};

/// Support and resistance candidates discovered in one lookback window.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSet {
    pub supports: Vec<LevelCandidate>,
    pub resistances: Vec<LevelCandidate>,
}

/// Session highs and lows that price did not revisit during the following
/// `reversal_window` bars.
///
/// Bars are grouped by the calendar date of their (zone-aware) timestamp. An
/// extreme is confirmed only when a full window of later bars exists and every one
/// of them trades strictly inside it.
pub fn intraday_reversals(window: &[Bar], reversal_window: usize) -> CandidateSet {
    let mut set = CandidateSet::default();
    if reversal_window == 0 {
        return set;
    }

    let sessions = window
        .iter()
        .enumerate()
        .group_by(|(_, bar)| bar.timestamp.date_naive());

    for (_, session) in &sessions {
        let members: Vec<(usize, &Bar)> = session.collect();
        let Some((high_idx, high_bar)) = first_extreme(&members, |a, b| b.high > a.high) else {
            continue;
        };
        let Some((low_idx, low_bar)) = first_extreme(&members, |a, b| b.low < a.low) else {
            continue;
        };

        if let Some(after) = following(window, high_idx, reversal_window) {
            if after.iter().all(|bar| bar.high < high_bar.high) {
                set.resistances.push(LevelCandidate::new(high_bar.high, high_bar.timestamp));
            }
        }
        if let Some(after) = following(window, low_idx, reversal_window) {
            if after.iter().all(|bar| bar.low > low_bar.low) {
                set.supports.push(LevelCandidate::new(low_bar.low, low_bar.timestamp));
            }
        }
    }
    set
}

/// Earliest member holding the session extreme.
fn first_extreme<'a>(
    members: &[(usize, &'a Bar)],
    better: impl Fn(&Bar, &Bar) -> bool,
) -> Option<(usize, &'a Bar)> {
    let mut best: Option<(usize, &'a Bar)> = None;
    for &(idx, bar) in members {
        match best {
            Some((_, current)) if !better(current, bar) => {}
            _ => best = Some((idx, bar)),
        }
    }
    best
}

fn following(window: &[Bar], idx: usize, count: usize) -> Option<&[Bar]> {
    let start = idx + 1;
    let end = start + count;
    (end <= window.len()).then(|| &window[start..end])
}

#[derive(Debug, Clone)]
struct WeekExtremes {
    high: LevelCandidate,
    low: LevelCandidate,
}

/// Weekly "necklines": when the latest calendar week broke above the prior week's
/// high or below its low, both weeks' highs and lows become candidates.
///
/// Returns `None` when fewer than two weeks are present or no breakout occurred.
pub fn weekly_necklines(window: &[Bar]) -> Option<CandidateSet> {
    let weeks: Vec<WeekExtremes> = window
        .iter()
        .group_by(|bar| {
            let week = bar.timestamp.iso_week();
            (week.year(), week.week())
        })
        .into_iter()
        .filter_map(|(_, bars)| week_extremes(bars))
        .collect();

    let [.., prev, last] = weeks.as_slice() else {
        return None;
    };

    let higher_high = last.high.price > prev.high.price;
    let lower_low = last.low.price < prev.low.price;
    if !higher_high && !lower_low {
        return None;
    }

    Some(CandidateSet {
        supports: vec![prev.low.clone(), last.low.clone()],
        resistances: vec![prev.high.clone(), last.high.clone()],
    })
}

fn week_extremes<'a>(bars: impl Iterator<Item = &'a Bar>) -> Option<WeekExtremes> {
    let mut extremes: Option<WeekExtremes> = None;
    for bar in bars {
        match extremes.as_mut() {
            None => {
                extremes = Some(WeekExtremes {
                    high: LevelCandidate::new(bar.high, bar.timestamp),
                    low: LevelCandidate::new(bar.low, bar.timestamp),
                })
            }
            Some(week) => {
                if bar.high > week.high.price {
                    week.high = LevelCandidate::new(bar.high, bar.timestamp);
                }
                if bar.low < week.low.price {
                    week.low = LevelCandidate::new(bar.low, bar.timestamp);
                }
            }
        }
    }
    extremes
}

/// Highs followed by `candles` consecutive bearish bars (and lows followed by as many
/// bullish bars) that never trade beyond the extreme.
pub fn three_bar_reversals(window: &[Bar], candles: usize) -> CandidateSet {
    let mut set = CandidateSet::default();
    if candles == 0 || window.len() <= candles {
        return set;
    }

    for idx in 0..window.len() - candles {
        let bar = &window[idx];
        let follow = &window[idx + 1..=idx + candles];

        if follow.iter().all(|f| f.is_bearish() && f.high <= bar.high) {
            set.resistances.push(LevelCandidate::new(bar.high, bar.timestamp));
        }
        if follow.iter().all(|f| f.is_bullish() && f.low >= bar.low) {
            set.supports.push(LevelCandidate::new(bar.low, bar.timestamp));
        }
    }
    set
}

/// Drop candidates farther than `multiplier * atr` from the last close.
pub fn apply_atr_guardrail(set: &mut CandidateSet, last_close: f64, atr: f64, multiplier: f64) {
    let limit = atr * multiplier;
    if !(limit.is_finite() && limit > 0.0) {
        return;
    }
    let before = set.supports.len() + set.resistances.len();
    set.supports.retain(|c| (c.price - last_close).abs() <= limit);
    set.resistances.retain(|c| (c.price - last_close).abs() <= limit);
    let dropped = before - set.supports.len() - set.resistances.len();
    if dropped > 0 {
        tracing::debug!(dropped, limit, last_close, "ATR guardrail removed distant candidates");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::test_support::{bar, bar_every};

    fn prices(candidates: &[LevelCandidate]) -> Vec<f64> {
        candidates.iter().map(|c| c.price).collect()
    }

    #[test]
    fn session_extreme_needs_full_quiet_window() {
        let mut bars: Vec<Bar> = (0..24).map(|i| bar(i, 100.0, 101.0, 99.0, 100.5)).collect();
        bars[5] = bar(5, 100.0, 103.0, 99.5, 100.0);
        bars[20] = bar(20, 100.0, 100.5, 97.0, 100.0);

        let set = intraday_reversals(&bars, 5);
        assert_eq!(prices(&set.resistances), vec![103.0]);
        // Only three bars follow the low before the series ends.
        assert!(set.supports.is_empty());
    }

    #[test]
    fn revisited_extreme_is_not_confirmed() {
        let mut bars: Vec<Bar> = (0..24).map(|i| bar(i, 100.0, 101.0, 99.0, 100.5)).collect();
        bars[5] = bar(5, 100.0, 103.0, 99.5, 100.0);
        bars[8] = bar(8, 100.0, 103.0, 99.5, 100.0);

        let set = intraday_reversals(&bars, 5);
        assert!(set.resistances.is_empty());
    }

    #[test]
    fn weekly_breakout_collects_both_weeks() {
        // 4h bars from Monday 2024-01-01: 42 bars per week.
        let mut bars: Vec<Bar> = (0..84).map(|i| bar_every(4, i, 100.0, 101.0, 99.0, 100.5)).collect();
        bars[10] = bar_every(4, 10, 100.0, 104.0, 97.0, 100.0);
        bars[60] = bar_every(4, 60, 100.0, 106.0, 98.0, 100.0);

        let set = weekly_necklines(&bars).unwrap();
        assert_eq!(prices(&set.supports), vec![97.0, 98.0]);
        assert_eq!(prices(&set.resistances), vec![104.0, 106.0]);
        assert_eq!(set.resistances[1].timestamp, bars[60].timestamp);
    }

    #[test]
    fn inside_week_has_no_necklines() {
        let mut bars: Vec<Bar> = (0..84).map(|i| bar_every(4, i, 100.0, 101.0, 99.0, 100.5)).collect();
        bars[10] = bar_every(4, 10, 100.0, 104.0, 97.0, 100.0);
        assert!(weekly_necklines(&bars).is_none());
        assert!(weekly_necklines(&bars[..42]).is_none());
    }

    #[test]
    fn three_candle_follow_through() {
        let mut bars: Vec<Bar> = (0..12).map(|i| bar_every(24, i, 100.0, 100.5, 99.5, 100.0)).collect();
        bars[2] = bar_every(24, 2, 100.0, 102.0, 99.8, 101.0);
        for i in 3..6 {
            bars[i] = bar_every(24, i, 101.0, 101.5, 100.0, 100.2);
        }
        bars[7] = bar_every(24, 7, 100.0, 100.2, 98.0, 99.0);
        for i in 8..11 {
            bars[i] = bar_every(24, i, 99.0, 100.0, 98.5, 99.8);
        }

        let set = three_bar_reversals(&bars, 3);
        assert_eq!(prices(&set.resistances), vec![102.0]);
        assert_eq!(prices(&set.supports), vec![98.0]);
    }

    #[test]
    fn guardrail_keeps_nearby_candidates() {
        let ts = bar(0, 0.0, 0.0, 0.0, 0.0).timestamp;
        let mut set = CandidateSet {
            supports: vec![LevelCandidate::new(80.0, ts), LevelCandidate::new(98.0, ts)],
            resistances: vec![LevelCandidate::new(104.9, ts), LevelCandidate::new(105.1, ts)],
        };
        apply_atr_guardrail(&mut set, 100.0, 1.0, 5.0);
        assert_eq!(prices(&set.supports), vec![98.0]);
        assert_eq!(prices(&set.resistances), vec![104.9]);
    }
}
