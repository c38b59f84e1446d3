use crate::analysis::stats::centered_rolling_mean;
use crate::config::TrendConfig;
use crate::data::Trend;

/// Classify the close series as UP/DOWN/SIDEWAYS from a blend of start-to-end drift
/// and the relative change of a centred rolling mean.
pub fn detect_trend(closes: &[f64], config: &TrendConfig) -> Trend {
    let closes: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    if closes.len() < 2 {
        return Trend::Sideways;
    }

    let start = closes[0];
    let end = closes[closes.len() - 1];
    if start == 0.0 {
        return Trend::Sideways;
    }
    let drift = (end - start) / start;

    let window = closes.len().clamp(config.min_window, config.max_window);
    let smoothed: Vec<f64> = centered_rolling_mean(&closes, window, window / 2)
        .into_iter()
        .flatten()
        .collect();

    let slope_ratio = match (smoothed.first(), smoothed.last()) {
        (Some(&first), Some(&last)) if smoothed.len() >= 2 && first != 0.0 => (last - first) / first,
        _ => 0.0,
    };

    let blended = config.drift_weight * drift + config.slope_weight * slope_ratio;
    if blended > config.threshold {
        Trend::Up
    } else if blended < -config.threshold {
        Trend::Down
    } else {
        Trend::Sideways
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(closes: &[f64]) -> Trend {
        detect_trend(closes, &TrendConfig::default())
    }

    #[test]
    fn rising_closes_are_up() {
        assert_eq!(classify(&[100.0, 100.5, 101.0, 102.0]), Trend::Up);
    }

    #[test]
    fn falling_closes_are_down() {
        let closes: Vec<f64> = (0..30).map(|i| 150.0 - i as f64 * 0.3).collect();
        assert_eq!(classify(&closes), Trend::Down);
    }

    #[test]
    fn tiny_moves_are_sideways() {
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + if i % 2 == 0 { 0.01 } else { -0.01 })
            .collect();
        assert_eq!(classify(&closes), Trend::Sideways);
    }

    #[test]
    fn insufficient_or_degenerate_input_is_sideways() {
        assert_eq!(classify(&[]), Trend::Sideways);
        assert_eq!(classify(&[101.0]), Trend::Sideways);
        assert_eq!(classify(&[0.0, 5.0, 10.0]), Trend::Sideways);
    }

    #[test]
    fn classification_is_deterministic() {
        let closes: Vec<f64> = (0..64).map(|i| 100.0 + (i as f64 * 0.7).sin()).collect();
        let first = classify(&closes);
        for _ in 0..5 {
            assert_eq!(classify(&closes), first);
        }
    }
}
