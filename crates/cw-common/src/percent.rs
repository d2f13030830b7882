//! Progress percentage for target/actual nutrient pairs.

/// Percentage of `target` reached by `actual`, rounded and capped at 100.
///
/// Absent, zero, or non-finite inputs yield 0. Negative ratios clamp to 0.
pub fn calculate_percentage(actual: Option<f64>, target: Option<f64>) -> u8 {
    match (actual, target) {
        (Some(actual), Some(target))
            if actual.is_finite() && target.is_finite() && actual != 0.0 && target != 0.0 =>
        {
            let pct = (actual / target * 100.0).round();
            pct.clamp(0.0, 100.0) as u8
        }
        _ => 0,
    }
}
