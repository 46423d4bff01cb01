// =============================================================================
// Technical Indicators Module
// =============================================================================
//
// Pure, side-effect-free implementations of the indicators consumed by the
// buy rule. Every function returns a series aligned index-for-index with its
// input; positions where the warm-up window is not yet satisfied hold
// `f64::NAN`, which no valid price, band, or oscillator value can take.
//
// NaN doubles as the fail-closed mechanism downstream: any comparison against
// an undefined value is false, so a condition can never pass on warm-up data.

pub mod bollinger;
pub mod ema;
pub mod macd;
pub mod psar;
pub mod rsi;

use crate::market_data::{closes, Candle};

/// EMA fast window.
pub const EMA_FAST: usize = 9;
/// EMA slow window.
pub const EMA_SLOW: usize = 21;
/// RSI window.
pub const RSI_PERIOD: usize = 14;
/// Bollinger window.
pub const BB_PERIOD: usize = 20;
/// Bollinger standard-deviation multiple.
pub const BB_NUM_STD: f64 = 2.0;
/// MACD fast / slow / signal windows.
pub const MACD_FAST: usize = 12;
pub const MACD_SLOW: usize = 26;
pub const MACD_SIGNAL: usize = 9;
/// Parabolic SAR base acceleration step and cap.
pub const SAR_STEP: f64 = 0.02;
pub const SAR_MAX_STEP: f64 = 0.2;

/// Returns `true` when a derived-series value is past its warm-up window.
pub fn is_defined(value: f64) -> bool {
    !value.is_nan()
}

/// All derived series for one candle window, each the same length as the
/// input. Recomputed from scratch every scan cycle; no state is carried
/// between invocations.
#[derive(Debug, Clone)]
pub struct IndicatorBundle {
    pub ema_fast: Vec<f64>,
    pub ema_slow: Vec<f64>,
    pub rsi: Vec<f64>,
    pub bb_lower: Vec<f64>,
    pub macd_line: Vec<f64>,
    pub macd_signal: Vec<f64>,
    pub psar: Vec<f64>,
}

impl IndicatorBundle {
    /// Compute the full bundle with the fixed rule parameters.
    pub fn compute(candles: &[Candle]) -> Self {
        let close = closes(candles);
        let macd = macd::macd_series(&close, MACD_FAST, MACD_SLOW, MACD_SIGNAL);

        Self {
            ema_fast: ema::ema_series(&close, EMA_FAST),
            ema_slow: ema::ema_series(&close, EMA_SLOW),
            rsi: rsi::rsi_series(&close, RSI_PERIOD),
            bb_lower: bollinger::lower_band_series(&close, BB_PERIOD, BB_NUM_STD),
            macd_line: macd.macd_line,
            macd_signal: macd.signal_line,
            psar: psar::psar_series(candles, SAR_STEP, SAR_MAX_STEP),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Candle;

    fn series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| {
                let close = 100.0 + (i as f64 * 0.4).sin();
                Candle::new(
                    i as i64 * 14_400_000,
                    close,
                    close + 0.5,
                    close - 0.5,
                    close,
                    1000.0 + i as f64,
                    (i as i64 + 1) * 14_400_000 - 1,
                )
            })
            .collect()
    }

    #[test]
    fn bundle_series_are_aligned() {
        let candles = series(60);
        let bundle = IndicatorBundle::compute(&candles);
        assert_eq!(bundle.ema_fast.len(), 60);
        assert_eq!(bundle.ema_slow.len(), 60);
        assert_eq!(bundle.rsi.len(), 60);
        assert_eq!(bundle.bb_lower.len(), 60);
        assert_eq!(bundle.macd_line.len(), 60);
        assert_eq!(bundle.macd_signal.len(), 60);
        assert_eq!(bundle.psar.len(), 60);
    }

    #[test]
    fn bundle_warmup_counts() {
        let candles = series(60);
        let bundle = IndicatorBundle::compute(&candles);

        let undefined = |s: &[f64]| s.iter().take_while(|v| v.is_nan()).count();
        assert_eq!(undefined(&bundle.ema_fast), EMA_FAST - 1);
        assert_eq!(undefined(&bundle.ema_slow), EMA_SLOW - 1);
        assert_eq!(undefined(&bundle.rsi), RSI_PERIOD);
        assert_eq!(undefined(&bundle.bb_lower), BB_PERIOD - 1);
        assert_eq!(undefined(&bundle.macd_line), MACD_SLOW - 1);
        assert_eq!(undefined(&bundle.macd_signal), MACD_SLOW + MACD_SIGNAL - 2);
        assert_eq!(undefined(&bundle.psar), 1);
    }

    #[test]
    fn is_defined_rejects_only_nan() {
        assert!(!is_defined(f64::NAN));
        assert!(is_defined(0.0));
        assert!(is_defined(-1.5));
        assert!(is_defined(100.0));
    }
}
