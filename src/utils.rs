//! Utility functions.

use average::Mean;

/// Arithmetic mean; `None` for an empty input.
pub fn mean<I: IntoIterator<Item = f64>>(values: I) -> Option<f64> {
    let m: Mean = values.into_iter().collect();
    if m.is_empty() {
        None
    } else {
        Some(m.mean())
    }
}

/// Rounds to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Widens counts for plotting.
pub fn to_f64(values: &[usize]) -> Vec<f64> {
    values.iter().map(|&v| v as f64).collect()
}
