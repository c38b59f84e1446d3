use crate::analysis::stats::ewm;
use crate::data::round_to;

/// Relative Strength Index with Wilder smoothing (alpha = 1 / period), rounded to 2 decimals.
///
/// When no smoothed pair yields a finite ratio the latest smoothed gain/loss decide:
/// pure gains give 100, pure losses 0 and a flat series 50.
pub fn compute_rsi(closes: &[f64], period: usize) -> Option<f64> {
    let closes: Vec<f64> = closes.iter().copied().filter(|c| c.is_finite()).collect();
    if closes.len() < 2 || period == 0 {
        return None;
    }

    let (gains, losses): (Vec<f64>, Vec<f64>) = closes
        .windows(2)
        .map(|pair| {
            let delta = pair[1] - pair[0];
            (delta.max(0.0), (-delta).max(0.0))
        })
        .unzip();

    let alpha = 1.0 / period as f64;
    let smoothed: Vec<(f64, f64)> = ewm(&gains, alpha, period)
        .into_iter()
        .zip(ewm(&losses, alpha, period))
        .filter_map(|pair| match pair {
            (Some(gain), Some(loss)) => Some((gain, loss)),
            _ => None,
        })
        .collect();

    if let Some(&(gain, loss)) = smoothed.iter().rev().find(|(_, loss)| *loss > 0.0) {
        return Some(round_to(rsi_from(gain, loss), 2));
    }

    let (gain, loss) = smoothed.last().copied().unwrap_or((0.0, 0.0));
    if gain > 0.0 && loss == 0.0 {
        Some(100.0)
    } else if loss > 0.0 && gain == 0.0 {
        Some(0.0)
    } else if gain == 0.0 && loss == 0.0 {
        Some(50.0)
    } else if gain > 0.0 && loss > 0.0 {
        Some(round_to(rsi_from(gain, loss), 2))
    } else {
        None
    }
}

fn rsi_from(gain: f64, loss: f64) -> f64 {
    let rs = gain / loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_gains_saturate_at_100() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(compute_rsi(&closes, 14), Some(100.0));
    }

    #[test]
    fn monotonic_losses_floor_at_zero() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 0.5).collect();
        assert_eq!(compute_rsi(&closes, 14), Some(0.0));
    }

    #[test]
    fn flat_and_short_series_are_neutral() {
        assert_eq!(compute_rsi(&[100.0; 30], 14), Some(50.0));
        assert_eq!(compute_rsi(&[100.0, 101.0, 100.5], 14), Some(50.0));
        assert_eq!(compute_rsi(&[100.0], 14), None);
    }

    #[test]
    fn alternating_moves_stay_in_bounds() {
        let closes: Vec<f64> = (0..60)
            .map(|i| {
                let step = if i % 3 == 0 { 1.0 } else { -0.4 };
                100.0 + step * (i % 7) as f64
            })
            .collect();
        let rsi = compute_rsi(&closes, 14).unwrap();
        assert!((0.0..=100.0).contains(&rsi));
    }

    #[test]
    fn equal_alternating_moves_are_near_fifty() {
        let closes: Vec<f64> = (0..200).map(|i| if i % 2 == 0 { 100.0 } else { 101.0 }).collect();
        let rsi = compute_rsi(&closes, 14).unwrap();
        assert!((rsi - 50.0).abs() < 5.0, "rsi = {rsi}");
    }
}
