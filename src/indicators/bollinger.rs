// =============================================================================
// Bollinger Lower Band
// =============================================================================
//
// Bollinger Bands consist of a middle band (SMA) and bands offset by a
// multiple of the rolling standard deviation. The buy rule only consumes the
// lower band: SMA(period) - num_std * sigma.
//
// Sigma is the population standard deviation (divide by N, not N-1), matching
// the usual charting convention.
// =============================================================================

/// Compute the Bollinger lower band series for `closes`, aligned
/// index-for-index with the input.
///
/// Indices `0..period-1` are `f64::NAN`; the first defined value sits at
/// index `period - 1`, where a full window is available.
///
/// # Edge cases
/// - `period == 0` or `closes.len() < period` => all-NaN output.
/// - A non-finite close makes every window containing it undefined; the band
///   recovers once the value leaves the window.
pub fn lower_band_series(closes: &[f64], period: usize, num_std: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; closes.len()];
    if period == 0 || closes.len() < period {
        return out;
    }

    for i in (period - 1)..closes.len() {
        let window = &closes[i + 1 - period..=i];
        let mean = window.iter().sum::<f64>() / period as f64;
        let variance = window.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / period as f64;
        out[i] = mean - num_std * variance.sqrt();
    }

    out
}
