// =============================================================================
// Parabolic SAR (Stop And Reverse)
// =============================================================================
//
// A trend-following trailing stop. Each bar the SAR advances toward price:
//
//   sar = sar + af * (ep - sar)
//
// where `ep` is the extreme point of the current trend (highest high in an
// uptrend, lowest low in a downtrend) and `af` is the acceleration factor:
// it starts at `step`, grows by `step` every time a new extreme is set, and
// is capped at `max_step`. When price crosses the SAR the trend flips: the
// SAR resets to the old extreme point, the extreme point restarts at the
// crossing bar, and `af` drops back to `step`.
//
// The trend is seeded from the first two bars: uptrend iff the second close
// is above the first. The seed SAR is the first bar's low (uptrend) or high
// (downtrend), emitted at index 1; index 0 is the NaN sentinel.
// =============================================================================

use crate::market_data::Candle;

/// Compute the Parabolic SAR series for `candles`, aligned index-for-index
/// with the input. Standard parameters are step 0.02, max step 0.2.
///
/// # Edge cases
/// - Fewer than two candles => all-NaN output.
/// - Crossing is tested against the bar's low in an uptrend and the bar's
///   high in a downtrend; the close only seeds the initial trend direction.
pub fn psar_series(candles: &[Candle], step: f64, max_step: f64) -> Vec<f64> {
    let mut out = vec![f64::NAN; candles.len()];
    if candles.len() < 2 {
        return out;
    }

    let mut uptrend = candles[1].close > candles[0].close;
    let mut sar = if uptrend {
        candles[0].low
    } else {
        candles[0].high
    };
    let mut ep = if uptrend {
        candles[1].high
    } else {
        candles[1].low
    };
    let mut af = step;

    out[1] = sar;

    for i in 2..candles.len() {
        sar += af * (ep - sar);

        if uptrend {
            if candles[i].low < sar {
                // Price fell through the SAR: flip to a downtrend.
                uptrend = false;
                sar = ep;
                ep = candles[i].low;
                af = step;
            } else if candles[i].high > ep {
                ep = candles[i].high;
                af = (af + step).min(max_step);
            }
        } else {
            if candles[i].high > sar {
                // Price rose through the SAR: flip to an uptrend.
                uptrend = true;
                sar = ep;
                ep = candles[i].high;
                af = step;
            } else if candles[i].low < ep {
                ep = candles[i].low;
                af = (af + step).min(max_step);
            }
        }

        out[i] = sar;
    }

    out
}
