// =============================================================================
// Buy-Signal Evaluator — six-condition confluence over the last two candles
// =============================================================================
//
// The rule is fixed: six conditions are evaluated at the last index (n-1) and
// second-to-last index (n-2) of the candle window, and the decision is their
// logical AND.
//
//   1. EMA(9) falls through EMA(21):   ema9[n-2] > ema21[n-2]  AND
//                                      ema9[n-1] < ema21[n-1]
//   2. RSI in the neutral band:        30 < rsi[n-1] < 70
//   3. Close at/below the lower band:  close[n-1] <= bb_lower[n-1] * 1.03
//   4. MACD rises through its signal:  macd[n-2] < sig[n-2]  AND
//                                      macd[n-1] > sig[n-1]
//   5. Volume increasing:              volume[n-1] > volume[n-2]
//   6. SAR below price:                psar[n-1] < close[n-1]
//
// Note the crossing directions: condition 1 is the bearish EMA cross while
// condition 4 is the bullish MACD cross. That pairing is the rule as shipped
// and is reproduced verbatim.
//
// Evaluation fails closed: a window shorter than MIN_CANDLES, or any
// undefined (NaN) value at n-1 / n-2, makes the affected conditions false.
// Nothing in here can panic on market data.
// =============================================================================

use serde::Serialize;

use crate::indicators::IndicatorBundle;
use crate::market_data::{closes, volumes, Candle};

/// Minimum window length for a meaningful decision. Shorter windows produce
/// a deterministic no-signal outcome rather than an error.
pub const MIN_CANDLES: usize = 30;

/// Multiplier applied to the lower Bollinger band for the "price near the
/// band" test.
pub const BB_PROXIMITY: f64 = 1.03;

/// RSI neutral-band bounds (exclusive).
pub const RSI_LOWER: f64 = 30.0;
pub const RSI_UPPER: f64 = 70.0;

/// Verdict of each of the six conditions at the evaluation point.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ConditionSet {
    /// EMA(9) crossed below EMA(21) on the last candle.
    pub ema_cross_down: bool,
    /// RSI strictly inside (30, 70).
    pub rsi_neutral: bool,
    /// Close at or below 1.03x the lower Bollinger band.
    pub near_lower_band: bool,
    /// MACD line crossed above its signal line on the last candle.
    pub macd_cross_up: bool,
    /// Last volume above the previous one.
    pub volume_rising: bool,
    /// Parabolic SAR below the last close.
    pub sar_below_price: bool,
}

impl ConditionSet {
    /// Evaluate all six conditions at the last two indices of the window.
    /// The window (and every bundle series) must hold at least two points;
    /// [`evaluate`] guarantees that via [`MIN_CANDLES`].
    ///
    /// Comparisons against NaN are false, so undefined indicator values can
    /// never satisfy a condition.
    pub fn from_window(bundle: &IndicatorBundle, close: &[f64], volume: &[f64]) -> Self {
        let last = close.len() - 1;
        let prev = last - 1;

        Self {
            ema_cross_down: bundle.ema_fast[prev] > bundle.ema_slow[prev]
                && bundle.ema_fast[last] < bundle.ema_slow[last],
            rsi_neutral: RSI_LOWER < bundle.rsi[last] && bundle.rsi[last] < RSI_UPPER,
            near_lower_band: close[last] <= bundle.bb_lower[last] * BB_PROXIMITY,
            macd_cross_up: bundle.macd_line[prev] < bundle.macd_signal[prev]
                && bundle.macd_line[last] > bundle.macd_signal[last],
            volume_rising: volume[last] > volume[prev],
            sar_below_price: bundle.psar[last] < close[last],
        }
    }

    /// The decision: logical AND of all six conditions.
    pub fn all_met(&self) -> bool {
        self.ema_cross_down
            && self.rsi_neutral
            && self.near_lower_band
            && self.macd_cross_up
            && self.volume_rising
            && self.sar_below_price
    }
}

/// Why an evaluation did or did not reach the six conditions.
#[derive(Debug, Clone, Serialize)]
pub enum Outcome {
    /// The window was long enough; the per-condition verdicts are attached.
    Evaluated(ConditionSet),
    /// Fewer candles than [`MIN_CANDLES`]; the decision is false by default.
    InsufficientData { have: usize, need: usize },
}

/// Auditable record of one scan decision.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    /// Unique identifier for this evaluation (UUID v4).
    pub id: String,
    /// Symbol the evaluation pertains to.
    pub symbol: String,
    /// The buy decision.
    pub decision: bool,
    /// How the decision was reached.
    pub outcome: Outcome,
    /// ISO 8601 timestamp of when the evaluation ran.
    pub evaluated_at: String,
}

/// Evaluate the buy rule for one symbol over a freshly fetched window.
///
/// Pure with respect to market data: the same window always yields the same
/// decision, and no state survives between calls.
pub fn evaluate(symbol: &str, candles: &[Candle]) -> Evaluation {
    let (decision, outcome) = if candles.len() < MIN_CANDLES {
        (
            false,
            Outcome::InsufficientData {
                have: candles.len(),
                need: MIN_CANDLES,
            },
        )
    } else {
        let bundle = IndicatorBundle::compute(candles);
        let conditions = ConditionSet::from_window(&bundle, &closes(candles), &volumes(candles));
        (conditions.all_met(), Outcome::Evaluated(conditions))
    };

    Evaluation {
        id: uuid::Uuid::new_v4().to_string(),
        symbol: symbol.to_string(),
        decision,
        outcome,
        evaluated_at: chrono::Utc::now().to_rfc3339(),
    }
}
