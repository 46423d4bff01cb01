// =============================================================================
// Market Data — candle model and fetch-side validation
// =============================================================================
//
// A `Candle` is one closed OHLCV bar. The scanner re-fetches a fresh window
// of candles every cycle; nothing here carries state between cycles.
//
// Series validation lives on the fetch side of the boundary: the indicator
// pipeline assumes an ordered, finite series and marks anything it cannot
// compute with the NaN sentinel instead of failing.
// =============================================================================

use anyhow::{bail, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A single closed OHLCV candle.
///
/// Timestamps are epoch milliseconds, prices and volume are `f64` — the
/// precision Binance reports for spot klines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
        close_time: i64,
    ) -> Self {
        Self {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }
}

/// Extract the close column from a candle slice (oldest-first order).
pub fn closes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.close).collect()
}

/// Extract the volume column from a candle slice (oldest-first order).
pub fn volumes(candles: &[Candle]) -> Vec<f64> {
    candles.iter().map(|c| c.volume).collect()
}

/// Validate an as-fetched candle series before it reaches the evaluator.
///
/// Checks:
/// - timestamps strictly increasing (no duplicates, no reordering)
/// - all prices and volumes finite
/// - prices non-negative, `high >= low`
///
/// An empty series is valid (the evaluator handles short series itself).
pub fn validate_series(candles: &[Candle]) -> Result<()> {
    for (i, c) in candles.iter().enumerate() {
        let values = [c.open, c.high, c.low, c.close, c.volume];
        if values.iter().any(|v| !v.is_finite()) {
            bail!("candle {i} (open_time {}) has a non-finite value", c.open_time);
        }
        if c.open < 0.0 || c.high < 0.0 || c.low < 0.0 || c.close < 0.0 || c.volume < 0.0 {
            bail!("candle {i} (open_time {}) has a negative value", c.open_time);
        }
        if c.high < c.low {
            bail!(
                "candle {i} (open_time {}) has high {} below low {}",
                c.open_time,
                c.high,
                c.low
            );
        }
        if i > 0 && candles[i - 1].open_time >= c.open_time {
            bail!(
                "candle {i} open_time {} is not after previous open_time {}",
                c.open_time,
                candles[i - 1].open_time
            );
        }
    }
    Ok(())
}

/// Source of candle windows for the scanner.
///
/// Implemented by the Binance REST client in production and by in-memory
/// fixtures in tests.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Fetch up to `limit` most-recent candles for `symbol` at `interval`,
    /// oldest first.
    async fn fetch_klines(&self, symbol: &str, interval: &str, limit: u32) -> Result<Vec<Candle>>;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(open_time: i64, close: f64) -> Candle {
        Candle::new(
            open_time,
            close,
            close + 1.0,
            close - 1.0,
            close,
            100.0,
            open_time + 14_399_999,
        )
    }

    #[test]
    fn valid_series_passes() {
        let series: Vec<Candle> = (0..5).map(|i| candle(i * 14_400_000, 100.0)).collect();
        assert!(validate_series(&series).is_ok());
    }

    #[test]
    fn empty_series_is_valid() {
        assert!(validate_series(&[]).is_ok());
    }

    #[test]
    fn non_monotonic_timestamps_rejected() {
        let mut series: Vec<Candle> = (0..5).map(|i| candle(i * 14_400_000, 100.0)).collect();
        series[3].open_time = series[2].open_time;
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn nan_price_rejected() {
        let mut series: Vec<Candle> = (0..3).map(|i| candle(i * 14_400_000, 100.0)).collect();
        series[1].close = f64::NAN;
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn negative_price_rejected() {
        let mut series: Vec<Candle> = (0..3).map(|i| candle(i * 14_400_000, 100.0)).collect();
        series[2].low = -0.5;
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn high_below_low_rejected() {
        let mut series: Vec<Candle> = (0..3).map(|i| candle(i * 14_400_000, 100.0)).collect();
        series[0].high = series[0].low - 1.0;
        assert!(validate_series(&series).is_err());
    }

    #[test]
    fn column_extraction_preserves_order() {
        let series: Vec<Candle> = (0..4)
            .map(|i| candle(i * 14_400_000, 100.0 + i as f64))
            .collect();
        assert_eq!(closes(&series), vec![100.0, 101.0, 102.0, 103.0]);
        assert_eq!(volumes(&series), vec![100.0; 4]);
    }
}
