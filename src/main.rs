// =============================================================================
// Argus Signal Scout — Main Entry Point
// =============================================================================
//
// Wires the collaborators together: Binance market data in, Telegram alerts
// out, the scan loop in between. Credentials come from the environment only;
// the bot runs read-only against the exchange.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod binance;
mod bot_config;
mod indicators;
mod market_data;
mod notifier;
mod poller;
mod signals;

use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::binance::BinanceClient;
use crate::bot_config::BotConfig;
use crate::notifier::TelegramNotifier;
use crate::poller::Poller;
use crate::signals::MIN_CANDLES;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Argus Signal Scout — Starting Up                 ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = BotConfig::load("bot_config.json").unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        BotConfig::default()
    });
    config.apply_env_overrides();

    if (config.lookback_limit as usize) < MIN_CANDLES {
        warn!(
            lookback = config.lookback_limit,
            minimum = MIN_CANDLES,
            "lookback below the evaluation minimum — every scan will be a no-signal"
        );
    }

    info!(
        symbols = ?config.symbols,
        interval = %config.kline_interval,
        lookback = config.lookback_limit,
        poll_interval_secs = config.poll_interval_secs,
        "Configured scan parameters"
    );

    // ── 2. Binance client ────────────────────────────────────────────────
    let api_key = std::env::var("BINANCE_API_KEY").unwrap_or_default();
    let api_secret = std::env::var("BINANCE_API_SECRET").unwrap_or_default();
    let have_credentials = !api_key.is_empty() && !api_secret.is_empty();
    let client = BinanceClient::new(api_key, api_secret);

    // Kline fetching is a public endpoint; the account call just proves the
    // configured credentials are accepted before the loop starts.
    if have_credentials {
        match client.get_account().await {
            Ok(_) => info!("Binance credentials verified"),
            Err(e) => warn!(error = %e, "Binance credential check failed — continuing read-only"),
        }
    } else {
        info!("No Binance credentials configured — running with public endpoints only");
    }

    // ── 3. Telegram notifier ─────────────────────────────────────────────
    let token = std::env::var("TELEGRAM_TOKEN").unwrap_or_default();
    let chat_id = std::env::var("TELEGRAM_CHAT_ID").unwrap_or_default();
    let telegram = TelegramNotifier::new(token, chat_id);
    if !telegram.is_configured() {
        warn!("TELEGRAM_TOKEN / TELEGRAM_CHAT_ID not set — notifications will fail until configured");
    }

    // ── 4. Scan loop with graceful shutdown ──────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        warn!("Shutdown signal received — stopping after the current cycle");
        let _ = shutdown_tx.send(true);
    });

    let poller = Poller::new(config, client, telegram);
    poller.run(shutdown_rx).await;

    info!("Argus Signal Scout shut down complete.");
    Ok(())
}
