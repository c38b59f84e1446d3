mod common;

use common::{max, min, series_every, wave_rows};
use kline_summary::analysis::{compute_atr, compute_support_resistance};
use kline_summary::config::AnalysisConfig;
use kline_summary::data::Series;

fn hourly_reversal_series() -> Series {
    let rows: Vec<_> = (0..48)
        .map(|idx| match idx {
            2 => (96.0, 96.5, 95.0, 96.2),
            10 => (104.0, 105.0, 103.5, 104.0),
            26 => (97.0, 97.5, 96.0, 97.2),
            30 => (105.0, 106.0, 104.5, 105.3),
            i if i > 30 => (100.0, 104.0, 99.5, 100.8),
            _ => (100.0, 101.0, 99.0, 100.5),
        })
        .collect();
    series_every(1, &rows)
}

#[test]
fn hourly_reversals_confirmed_by_following_bars() {
    let series = hourly_reversal_series();
    let levels = compute_support_resistance(&series, "1h", None, &AnalysisConfig::default());

    assert_eq!(levels.supports, vec![95.0, 96.0]);
    assert_eq!(levels.resistances, vec![106.0, 105.0]);
}

#[test]
fn four_hour_weekly_necklines_rank_structure_first() {
    // Index i sits at 2024-01-01 + 4i hours.
    let rows: Vec<_> = (0..84)
        .map(|idx| match idx {
            7 => (100.0, 95.0, 92.0, 93.0),
            26 => (100.0, 105.0, 99.0, 104.0),
            51 => (100.0, 99.0, 95.0, 96.0),
            58 => (100.0, 111.0, 108.0, 110.0),
            83 => (108.0, 109.0, 107.0, 108.0),
            _ => (100.0, 101.0, 99.0, 100.5),
        })
        .collect();
    let series = series_every(4, &rows);
    let levels = compute_support_resistance(&series, "4h", None, &AnalysisConfig::default());

    assert_eq!(levels.supports, vec![92.0, 95.0]);
    assert_eq!(levels.resistances, vec![111.0, 105.0]);
}

#[test]
fn four_hour_inside_week_falls_back_to_merged_extremes() {
    // The second week trades inside the first, so there is no neckline breakout.
    let rows: Vec<_> = (0..84)
        .map(|idx| match idx {
            7 => (100.0, 95.0, 92.0, 93.0),
            26 => (100.0, 105.0, 99.0, 104.0),
            _ => (100.0, 101.0, 99.0, 100.5),
        })
        .collect();
    let series = series_every(4, &rows);
    let levels = compute_support_resistance(&series, "4h", None, &AnalysisConfig::default());

    assert_eq!(levels.supports, vec![92.0, 99.0]);
    assert_eq!(levels.resistances, vec![105.0, 101.0]);
}

#[test]
fn hourly_resistance_below_close_is_replaced_by_window_high() {
    // Day one confirms a low at 98 and a high at 103; day two rallies through 103
    // and its 106 high has too few bars after it to be confirmed.
    let rows: Vec<_> = (0..48)
        .map(|idx| match idx {
            2 => (99.5, 100.0, 98.0, 99.8),
            5 => (100.0, 103.0, 99.5, 100.0),
            45 => (100.5, 104.0, 100.0, 103.5),
            46 => (103.5, 106.0, 103.0, 105.5),
            47 => (105.5, 105.8, 104.5, 105.0),
            _ => (100.0, 101.0, 99.0, 100.5),
        })
        .collect();
    let series = series_every(1, &rows);
    let levels = compute_support_resistance(&series, "1h", None, &AnalysisConfig::default());

    assert_eq!(levels.supports, vec![98.0]);
    assert_eq!(levels.resistances, vec![106.0]);
}

#[test]
fn daily_three_bar_reversals() {
    let rows: Vec<_> = (0..40)
        .map(|idx| match idx {
            10 => (108.0, 108.5, 107.8, 108.2),
            11..=13 => (108.2, 108.3, 107.8, 107.9),
            25 => (108.0, 108.2, 107.5, 107.8),
            26..=28 => (107.8, 108.2, 107.7, 108.1),
            _ => (108.0, 108.3, 107.7, 108.0),
        })
        .collect();
    let series = series_every(24, &rows);
    let levels = compute_support_resistance(&series, "1d", None, &AnalysisConfig::default());

    assert_eq!(series.last_close(), Some(108.0));
    assert_eq!(levels.supports, vec![107.5]);
    assert_eq!(levels.resistances, vec![108.5]);
}

#[test]
fn daily_guardrail_drops_distant_candidates() {
    let rows: Vec<_> = (0..40)
        .map(|idx| match idx {
            5 => (100.0, 100.5, 80.0, 100.0),
            20 => (100.0, 100.5, 98.0, 100.0),
            6..=8 | 21..=23 => (100.0, 100.5, 99.6, 100.3),
            _ => (100.0, 100.5, 99.5, 100.0),
        })
        .collect();
    let series = series_every(24, &rows);
    let levels = compute_support_resistance(&series, "1d", Some(1.0), &AnalysisConfig::default());

    assert!(!levels.supports.contains(&80.0));
    assert_eq!(levels.supports, vec![98.0]);
    assert_eq!(levels.resistances, vec![100.5]);
}

#[test]
fn unknown_interval_uses_window_extremes() {
    let series = hourly_reversal_series();
    let levels = compute_support_resistance(&series, "15m", None, &AnalysisConfig::default());

    assert_eq!(levels.supports.first(), Some(&95.0));
    assert_eq!(levels.resistances.first(), Some(&106.0));
    assert!(levels.supports.len() <= 2);
    assert!(levels.resistances.len() <= 2);
}

#[test]
fn empty_series_has_no_levels() {
    let series = Series::from_bars(Vec::new());
    for interval in ["1h", "4h", "1d", "5m"] {
        let levels = compute_support_resistance(&series, interval, None, &AnalysisConfig::default());
        assert!(levels.supports.is_empty());
        assert!(levels.resistances.is_empty());
    }
}

#[test]
fn intraday_resistances_sit_above_supports_and_close() {
    for amplitude in [0.5, 2.0, 6.0] {
        let series = series_every(1, &wave_rows(300, amplitude));
        let levels = compute_support_resistance(&series, "1h", None, &AnalysisConfig::default());
        let last_close = series.last_close().unwrap();

        assert!(!levels.resistances.is_empty());
        assert!(levels.resistances.iter().all(|r| *r >= last_close - 1e-4));
        if !levels.supports.is_empty() {
            assert!(min(&levels.resistances) >= max(&levels.supports) - 1e-4);
        }
    }
}

#[test]
fn levels_on_one_side_keep_cluster_spacing() {
    let config = AnalysisConfig::default();
    for (hours, interval) in [(1, "1h"), (4, "4h"), (24, "1d"), (1, "30m")] {
        for amplitude in [0.5, 3.0] {
            let series = series_every(hours, &wave_rows(400, amplitude));
            let levels = compute_support_resistance(&series, interval, None, &config);
            let atr = compute_atr(series.bars(), config.indicators.atr_period).unwrap();
            let tolerance = atr * config.levels.cluster_tolerance_atr;

            for side in [&levels.supports, &levels.resistances] {
                assert!(side.len() <= config.levels.level_count);
                for (i, a) in side.iter().enumerate() {
                    for b in &side[i + 1..] {
                        assert!(
                            (a - b).abs() >= tolerance - 1e-4,
                            "{interval}: {a} and {b} closer than {tolerance}"
                        );
                    }
                }
            }
        }
    }
}

#[test]
fn output_order_is_most_extreme_first() {
    let series = series_every(1, &wave_rows(300, 3.0));
    let levels = compute_support_resistance(&series, "1h", None, &AnalysisConfig::default());

    assert!(levels.supports.windows(2).all(|w| w[0] <= w[1]));
    assert!(levels.resistances.windows(2).all(|w| w[0] >= w[1]));
}
