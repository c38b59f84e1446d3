use statrs::statistics::Statistics;

/// Trailing rolling mean; a slot is `None` until `min_periods` values are in the window.
pub fn rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    if window == 0 {
        return vec![None; values.len()];
    }
    let min_periods = min_periods.max(1);
    (0..values.len())
        .map(|idx| {
            let start = (idx + 1).saturating_sub(window);
            window_mean(&values[start..=idx], min_periods)
        })
        .collect()
}

/// Rolling mean with the window centred on each slot.
///
/// For an even window the extra bar is taken from the past side.
pub fn centered_rolling_mean(values: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    if window == 0 || values.is_empty() {
        return vec![None; values.len()];
    }
    let min_periods = min_periods.max(1);
    let behind = window / 2;
    let ahead = (window - 1) / 2;
    (0..values.len())
        .map(|idx| {
            let start = idx.saturating_sub(behind);
            let end = (idx + ahead).min(values.len() - 1);
            window_mean(&values[start..=end], min_periods)
        })
        .collect()
}

fn window_mean(slice: &[f64], min_periods: usize) -> Option<f64> {
    if slice.len() < min_periods {
        return None;
    }
    Some(slice.iter().copied().sum::<f64>() / slice.len() as f64)
}

/// Recursive exponential average `y[t] = (1 - alpha) * y[t-1] + alpha * x[t]` seeded with
/// the first observation. Slots before `min_periods` observations are `None`.
pub fn ewm(values: &[f64], alpha: f64, min_periods: usize) -> Vec<Option<f64>> {
    let mut out = Vec::with_capacity(values.len());
    let mut state: Option<f64> = None;
    for (idx, &value) in values.iter().enumerate() {
        let next = match state {
            None => value,
            Some(prev) => (1.0 - alpha) * prev + alpha * value,
        };
        state = Some(next);
        out.push(if idx + 1 >= min_periods { Some(next) } else { None });
    }
    out
}

/// Least-squares slope of `values` against their index.
pub fn linear_regression_slope(values: &[f64]) -> Option<f64> {
    let n = values.len();
    if n < 2 {
        return None;
    }
    let x_mean = (n - 1) as f64 / 2.0;
    let y_mean = values.mean();
    let mut covariance = 0.0;
    let mut variance = 0.0;
    for (idx, &y) in values.iter().enumerate() {
        let dx = idx as f64 - x_mean;
        covariance += dx * (y - y_mean);
        variance += dx * dx;
    }
    if variance == 0.0 {
        return None;
    }
    let slope = covariance / variance;
    slope.is_finite().then_some(slope)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    let value = values.mean();
    value.is_finite().then_some(value)
}

/// Sample (n - 1) standard deviation.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let value = values.std_dev();
    value.is_finite().then_some(value)
}

/// Consecutive-observation percentage changes.
pub fn pct_change(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .filter(|pair| pair[0] != 0.0)
        .map(|pair| (pair[1] - pair[0]) / pair[0])
        .collect()
}
