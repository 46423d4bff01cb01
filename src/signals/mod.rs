// =============================================================================
// Signals Module
// =============================================================================
//
// The fixed buy rule: six conditions over the two most recent completed
// candles, AND-combined into a single decision.

pub mod evaluator;

pub use evaluator::{evaluate, ConditionSet, Evaluation, Outcome, MIN_CANDLES};
