// =============================================================================
// Poller — drives fetch → evaluate → notify for every symbol, forever
// =============================================================================
//
// Each cycle scans all configured symbols concurrently (one in-flight fetch
// and evaluation per symbol, joined before the cycle ends) and then sleeps
// for the configured interval. A failure scanning one symbol is logged and
// isolated; it never aborts the cycle or the process.
//
// Shutdown is delivered over a watch channel so the loop can be stopped
// cleanly and a single cycle can be driven in isolation by tests.
// =============================================================================

use futures_util::future::join_all;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use anyhow::{Context, Result};

use crate::bot_config::BotConfig;
use crate::market_data::{validate_series, MarketDataSource};
use crate::notifier::Notifier;
use crate::signals::{self, Evaluation, Outcome};

/// Counters accumulated across scan cycles, snapshot for logging.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScanStats {
    pub cycles_completed: u64,
    pub symbols_evaluated: u64,
    pub signals_fired: u64,
    pub scan_failures: u64,
    pub notify_failures: u64,
}

/// The scan engine: configuration plus the two collaborators it drives.
pub struct Poller<S, N> {
    config: BotConfig,
    source: S,
    notifier: N,
    stats: RwLock<ScanStats>,
}

impl<S: MarketDataSource, N: Notifier> Poller<S, N> {
    pub fn new(config: BotConfig, source: S, notifier: N) -> Self {
        Self {
            config,
            source,
            notifier,
            stats: RwLock::new(ScanStats::default()),
        }
    }

    /// Snapshot of the accumulated counters.
    pub fn stats(&self) -> ScanStats {
        self.stats.read().clone()
    }

    /// Fetch, validate, and evaluate one symbol; deliver a notification when
    /// the rule fires.
    ///
    /// A notification failure is counted and logged but does not fail the
    /// scan — the evaluation already happened and the loop must survive any
    /// collaborator outage.
    async fn scan_symbol(&self, symbol: &str) -> Result<Evaluation> {
        let candles = self
            .source
            .fetch_klines(
                symbol,
                &self.config.kline_interval,
                self.config.lookback_limit,
            )
            .await
            .with_context(|| format!("fetching klines for {symbol}"))?;

        validate_series(&candles)
            .with_context(|| format!("validating candle series for {symbol}"))?;

        let evaluation = signals::evaluate(symbol, &candles);

        match &evaluation.outcome {
            Outcome::Evaluated(conditions) => {
                debug!(symbol, decision = evaluation.decision, ?conditions, "symbol evaluated");
            }
            Outcome::InsufficientData { have, need } => {
                warn!(symbol, have, need, "insufficient candles — no signal");
            }
        }

        if evaluation.decision {
            let message = format!(
                "📈 BUY SIGNAL for {} ({})",
                symbol, self.config.kline_interval
            );
            info!(symbol, evaluation_id = %evaluation.id, "buy signal fired — notifying");
            if let Err(e) = self.notifier.send(&message).await {
                self.stats.write().notify_failures += 1;
                error!(symbol, error = %e, "failed to deliver notification");
            }
        }

        Ok(evaluation)
    }

    /// Run one scan cycle over all configured symbols.
    ///
    /// Symbols are scanned concurrently; every symbol is evaluated exactly
    /// once and a failing symbol cannot block or corrupt the others.
    pub async fn run_cycle(&self) {
        let symbols = self.config.symbols.clone();
        let results = join_all(symbols.iter().map(|s| self.scan_symbol(s))).await;

        let mut evaluated = 0u64;
        let mut fired = 0u64;
        let mut failed = 0u64;
        for (symbol, result) in symbols.iter().zip(results) {
            match result {
                Ok(evaluation) => {
                    evaluated += 1;
                    if evaluation.decision {
                        fired += 1;
                    }
                }
                Err(e) => {
                    failed += 1;
                    error!(symbol = %symbol, error = %e, "symbol scan failed — cycle continues");
                }
            }
        }

        {
            let mut stats = self.stats.write();
            stats.cycles_completed += 1;
            stats.symbols_evaluated += evaluated;
            stats.signals_fired += fired;
            stats.scan_failures += failed;
        }

        info!(evaluated, fired, failed, "scan cycle complete");
    }

    /// Run scan cycles until the shutdown signal flips to `true` (or its
    /// sender is dropped).
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            symbols = ?self.config.symbols,
            interval = %self.config.kline_interval,
            poll_interval_secs = self.config.poll_interval_secs,
            "scan loop starting"
        );

        loop {
            self.run_cycle().await;

            tokio::select! {
                _ = tokio::time::sleep(std::time::Duration::from_secs(
                    self.config.poll_interval_secs,
                )) => {}
                res = shutdown.changed() => {
                    if res.is_err() || *shutdown.borrow() {
                        info!("shutdown signal received — scan loop stopping");
                        break;
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::market_data::Candle;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Arc;

    // ---- fixtures --------------------------------------------------------

    /// In-memory market data: one fixed series per symbol; unknown symbols
    /// fail the fetch.
    struct FixtureSource {
        series: HashMap<String, Vec<Candle>>,
    }

    impl FixtureSource {
        fn single(symbol: &str, candles: Vec<Candle>) -> Self {
            let mut series = HashMap::new();
            series.insert(symbol.to_string(), candles);
            Self { series }
        }
    }

    #[async_trait]
    impl MarketDataSource for FixtureSource {
        async fn fetch_klines(
            &self,
            symbol: &str,
            _interval: &str,
            _limit: u32,
        ) -> Result<Vec<Candle>> {
            self.series
                .get(symbol)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("no market data for {symbol}"))
        }
    }

    /// Captures every delivered message.
    #[derive(Clone, Default)]
    struct RecordingNotifier {
        messages: Arc<parking_lot::Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, text: &str) -> Result<()> {
            self.messages.lock().push(text.to_string());
            Ok(())
        }
    }

    /// Always fails delivery.
    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _text: &str) -> Result<()> {
            anyhow::bail!("notification channel down")
        }
    }

    fn test_config(symbols: &[&str]) -> BotConfig {
        BotConfig {
            symbols: symbols.iter().map(|s| s.to_string()).collect(),
            kline_interval: "4h".to_string(),
            lookback_limit: 150,
            poll_interval_secs: 3600,
        }
    }

    fn fixture_candle(i: usize, close: f64, high: f64, low: f64) -> Candle {
        Candle::new(
            i as i64 * 14_400_000,
            close,
            high,
            low,
            close,
            1000.0 + i as f64, // strictly rising volume
            (i as i64 + 1) * 14_400_000 - 1,
        )
    }

    fn flat_series(n: usize) -> Vec<Candle> {
        (0..n)
            .map(|i| fixture_candle(i, 100.0, 100.5, 99.5))
            .collect()
    }

    // ---- confluence fixture ----------------------------------------------

    /// Closes of the last twelve bars before the evaluation bar: a two-wave
    /// shakeout on an otherwise flat BTC-scale market. The wave amplitudes
    /// are tuned so that, together with [`CONFLUENCE_FINAL_CLOSE`], the fast
    /// EMA crosses below the slow one on the final bar while the MACD line
    /// simultaneously crosses above its signal line, with RSI neutral and
    /// the close inside the lower-band tolerance.
    ///
    /// The two crossings pull in opposite directions, so the tail has to be
    /// balanced carefully: the EMA pair must keep a hair of bullish lead at
    /// the second-to-last bar while medium-term momentum is already deeply
    /// negative. A small swing around a low price cannot do both at once —
    /// the lower-band tolerance (3% of price) has to dwarf the swing — which
    /// is why the fixture sits at a six-figure price with swings under 1.3%.
    const SHAKEOUT_CLOSES: [f64; 12] = [
        98_731.89, 98_879.05, 99_080.28, 99_333.35, 99_629.76, 99_951.73, 100_268.20, 100_529.47,
        100_660.00, 100_549.00, 100_038.00, 98_904.54,
    ];

    /// Final close, in the middle of the band where all six conditions hold.
    const CONFLUENCE_FINAL_CLOSE: f64 = 99_873.66;

    /// Build the 150-candle series that satisfies all six conditions on its
    /// last bar: a flat base, the shakeout tail, and the tuned final close.
    /// Volume rises on every bar. The final bar carries a tall upper wick so
    /// the Parabolic SAR, flipped bearish by the shakeout, flips back under
    /// price on the evaluation bar.
    fn confluence_series() -> Vec<Candle> {
        let mut candles: Vec<Candle> = (0..137)
            .map(|i| fixture_candle(i, 100_000.0, 100_030.0, 99_970.0))
            .collect();
        for (k, &close) in SHAKEOUT_CLOSES.iter().enumerate() {
            candles.push(fixture_candle(137 + k, close, close + 30.0, close - 30.0));
        }
        let c = CONFLUENCE_FINAL_CLOSE;
        candles.push(fixture_candle(149, c, c + 2_000.0, c - 10.0));
        candles
    }

    #[test]
    fn confluence_series_satisfies_every_condition() {
        let eval = signals::evaluate("BTCUSDT", &confluence_series());
        assert!(eval.decision);
        match eval.outcome {
            Outcome::Evaluated(set) => {
                assert!(set.ema_cross_down);
                assert!(set.rsi_neutral);
                assert!(set.near_lower_band);
                assert!(set.macd_cross_up);
                assert!(set.volume_rising);
                assert!(set.sar_below_price);
            }
            Outcome::InsufficientData { .. } => panic!("series is 150 candles long"),
        }
    }

    // ---- end-to-end cycles -----------------------------------------------

    #[tokio::test]
    async fn confluence_fires_and_notifies() {
        let series = confluence_series();
        let notifier = RecordingNotifier::default();
        let messages = notifier.messages.clone();

        let poller = Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", series),
            notifier,
        );
        poller.run_cycle().await;

        let delivered = messages.lock();
        assert_eq!(delivered.len(), 1);
        assert!(delivered[0].contains("BTCUSDT"));

        let stats = poller.stats();
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.symbols_evaluated, 1);
        assert_eq!(stats.signals_fired, 1);
        assert_eq!(stats.scan_failures, 0);
        assert_eq!(stats.notify_failures, 0);
    }

    #[tokio::test]
    async fn flat_volume_on_last_bar_suppresses_the_signal() {
        let mut series = confluence_series();
        // Identical series except the last bar's volume no longer rises.
        series[149].volume = series[148].volume;

        let notifier = RecordingNotifier::default();
        let messages = notifier.messages.clone();

        let poller = Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", series),
            notifier,
        );
        poller.run_cycle().await;

        assert!(messages.lock().is_empty());
        assert_eq!(poller.stats().signals_fired, 0);
    }

    #[tokio::test]
    async fn one_symbol_failure_does_not_block_the_others() {
        // BADUSDT has no fixture data, so its fetch fails; BTCUSDT must
        // still be evaluated in the same cycle.
        let poller = Poller::new(
            test_config(&["BADUSDT", "BTCUSDT"]),
            FixtureSource::single("BTCUSDT", flat_series(60)),
            RecordingNotifier::default(),
        );
        poller.run_cycle().await;

        let stats = poller.stats();
        assert_eq!(stats.cycles_completed, 1);
        assert_eq!(stats.symbols_evaluated, 1);
        assert_eq!(stats.scan_failures, 1);
    }

    #[tokio::test]
    async fn malformed_series_is_a_scan_failure() {
        let mut series = flat_series(60);
        series[10].open_time = series[9].open_time; // duplicate timestamp

        let poller = Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", series),
            RecordingNotifier::default(),
        );
        poller.run_cycle().await;

        let stats = poller.stats();
        assert_eq!(stats.symbols_evaluated, 0);
        assert_eq!(stats.scan_failures, 1);
    }

    #[tokio::test]
    async fn short_series_yields_no_signal_and_no_failure() {
        let poller = Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", flat_series(10)),
            RecordingNotifier::default(),
        );
        poller.run_cycle().await;

        let stats = poller.stats();
        assert_eq!(stats.symbols_evaluated, 1);
        assert_eq!(stats.signals_fired, 0);
        assert_eq!(stats.scan_failures, 0);
    }

    #[tokio::test]
    async fn notify_failure_is_counted_but_does_not_fail_the_scan() {
        let poller = Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", confluence_series()),
            FailingNotifier,
        );
        poller.run_cycle().await;

        let stats = poller.stats();
        assert_eq!(stats.symbols_evaluated, 1);
        assert_eq!(stats.signals_fired, 1);
        assert_eq!(stats.notify_failures, 1);
        assert_eq!(stats.scan_failures, 0);
    }

    #[tokio::test]
    async fn run_stops_on_shutdown_signal() {
        let (tx, rx) = watch::channel(false);

        let poller = Arc::new(Poller::new(
            test_config(&["BTCUSDT"]),
            FixtureSource::single("BTCUSDT", flat_series(40)),
            RecordingNotifier::default(),
        ));

        let handle = {
            let poller = poller.clone();
            tokio::spawn(async move { poller.run(rx).await })
        };

        tx.send(true).unwrap();
        tokio::time::timeout(std::time::Duration::from_secs(5), handle)
            .await
            .expect("scan loop did not stop after shutdown signal")
            .unwrap();

        // The first cycle runs before the loop waits on the signal.
        assert_eq!(poller.stats().cycles_completed, 1);
    }
}
