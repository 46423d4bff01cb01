// =============================================================================
// Binance Module
// =============================================================================
//
// REST access to Binance spot market data, with request signing for the
// authenticated endpoints and request-weight tracking.

pub mod client;
pub mod rate_limit;

pub use client::BinanceClient;
