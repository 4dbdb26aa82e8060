//! Relevance threshold calculation.

/// Minimum relevance a row needs to be returned.
///
/// `relevance_count × (columns / 6) × (matchers / 6)`, rounded to two
/// decimals. The constants are empirical and kept as-is.
pub fn compute(relevance_count: f64, columns: usize, matchers: usize) -> f64 {
    let raw = relevance_count * (columns as f64 / 6.0) * (matchers as f64 / 6.0);
    round2(raw)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
