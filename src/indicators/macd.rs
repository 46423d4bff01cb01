// =============================================================================
// MACD (Moving Average Convergence Divergence)
// =============================================================================
//
// MACD line  = EMA(fast) - EMA(slow)
// Signal line = EMA(macd_line, signal)
//
// The MACD line is defined once the slow EMA is (index slow-1 on). The signal
// line runs its EMA over the defined region of the MACD line, so it becomes
// defined `signal - 1` points later, at index slow + signal - 2.
// =============================================================================

use super::ema::ema_series;
use super::is_defined;

/// MACD line and signal line, each aligned index-for-index with the input
/// close series.
#[derive(Debug, Clone)]
pub struct MacdSeries {
    pub macd_line: Vec<f64>,
    pub signal_line: Vec<f64>,
}

/// Compute MACD for `closes` with the given periods (12/26/9 convention).
///
/// # Edge cases
/// - Input shorter than `slow` => both series all-NaN.
/// - Fewer than `signal` defined MACD points => signal line all-NaN while the
///   MACD line is still populated where defined.
pub fn macd_series(closes: &[f64], fast: usize, slow: usize, signal: usize) -> MacdSeries {
    let fast_ema = ema_series(closes, fast);
    let slow_ema = ema_series(closes, slow);

    // NaN in either EMA keeps the difference undefined at that index.
    let macd_line: Vec<f64> = fast_ema
        .iter()
        .zip(slow_ema.iter())
        .map(|(f, s)| f - s)
        .collect();

    let mut signal_line = vec![f64::NAN; closes.len()];
    if let Some(first_defined) = macd_line.iter().position(|v| is_defined(*v)) {
        let smoothed = ema_series(&macd_line[first_defined..], signal);
        for (offset, v) in smoothed.into_iter().enumerate() {
            signal_line[first_defined + offset] = v;
        }
    }

    MacdSeries {
        macd_line,
        signal_line,
    }
}
