use float_ord::FloatOrd;

/// Arithmetic mean of the given values. Returns `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Population standard deviation of the given values. Returns `None` for an empty slice
pub fn std_dev(values: &[f64]) -> Option<f64> {
    let mean = mean(values)?;
    let variance = values
        .iter()
        .map(|value| (value - mean) * (value - mean))
        .sum::<f64>()
        / values.len() as f64;
    Some(variance.sqrt())
}

/// Computes the `percentile` (in `[0, 100]`) of the given values, interpolating linearly between the two closest
/// ranks. NaN values are ignored. Returns `None` if no non-NaN value is left or `percentile` is outside `[0, 100]`
/// ```
/// # use rockdiff_core::math::percentile;
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 50.0), Some(2.5));
/// assert_eq!(percentile(&[4.0, 1.0, 3.0, 2.0], 100.0), Some(4.0));
/// assert_eq!(percentile(&[], 50.0), None);
/// ```
pub fn percentile(values: &[f64], percentile: f64) -> Option<f64> {
    if !(0.0..=100.0).contains(&percentile) {
        return None;
    }
    let mut sorted = values
        .iter()
        .copied()
        .filter(|value| !value.is_nan())
        .map(FloatOrd)
        .collect::<Vec<_>>();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_unstable();

    let rank = percentile / 100.0 * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let fraction = rank - lower as f64;
    Some(sorted[lower].0 + (sorted[upper].0 - sorted[lower].0) * fraction)
}

/// Median of the given values, see [percentile]
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Rounds `value` to the given number of decimal places
/// ```
/// # use rockdiff_core::math::round_to;
/// assert_eq!(round_to(1.23456, 3), 1.235);
/// assert_eq!(round_to(-0.0004, 3), 0.0);
/// ```
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    let rounded = (value * factor).round() / factor;
    // Avoid printing "-0" for tiny negative values
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}
