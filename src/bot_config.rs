// =============================================================================
// Bot Configuration — scan settings with atomic save
// =============================================================================
//
// Every tunable scan parameter lives here. Credentials never do: API keys and
// the Telegram token are read from the environment by main.rs so that a
// checked-in config file can never leak them.
//
// Persistence uses an atomic tmp + rename pattern to prevent corruption on
// crash. All fields carry `#[serde(default)]` so that adding new fields never
// breaks loading an older config file.
// =============================================================================

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;

// =============================================================================
// Default-value helpers (required by serde `default = "..."` attribute)
// =============================================================================

fn default_symbols() -> Vec<String> {
    vec!["BTCUSDT".to_string()]
}

fn default_kline_interval() -> String {
    "4h".to_string()
}

fn default_lookback_limit() -> u32 {
    150
}

fn default_poll_interval_secs() -> u64 {
    3600
}

// =============================================================================
// BotConfig
// =============================================================================

/// Top-level configuration for the scanner.
///
/// Every field has a serde default so that older JSON files missing new
/// fields will still deserialise correctly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    /// Symbols scanned each cycle.
    #[serde(default = "default_symbols")]
    pub symbols: Vec<String>,

    /// Candle interval requested from the exchange (e.g. "4h").
    #[serde(default = "default_kline_interval")]
    pub kline_interval: String,

    /// Number of most-recent candles fetched per symbol per cycle.
    #[serde(default = "default_lookback_limit")]
    pub lookback_limit: u32,

    /// Seconds to sleep between scan cycles.
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            symbols: default_symbols(),
            kline_interval: default_kline_interval(),
            lookback_limit: default_lookback_limit(),
            poll_interval_secs: default_poll_interval_secs(),
        }
    }
}

impl BotConfig {
    /// Load configuration from a JSON file at `path`.
    ///
    /// If the file does not exist, returns an error so the caller can fall
    /// back to defaults with a warning.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read bot config from {}", path.display()))?;

        let config: Self = serde_json::from_str(&content)
            .with_context(|| format!("failed to parse bot config from {}", path.display()))?;

        info!(
            path = %path.display(),
            symbols = ?config.symbols,
            interval = %config.kline_interval,
            "bot config loaded"
        );

        Ok(config)
    }

    /// Persist the current configuration to `path` using an atomic write
    /// (write to `.tmp`, then rename).
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        let content =
            serde_json::to_string_pretty(self).context("failed to serialise bot config to JSON")?;

        let tmp_path = path.with_extension("json.tmp");

        std::fs::write(&tmp_path, &content)
            .with_context(|| format!("failed to write tmp config to {}", tmp_path.display()))?;

        std::fs::rename(&tmp_path, path)
            .with_context(|| format!("failed to rename tmp config to {}", path.display()))?;

        info!(path = %path.display(), "bot config saved (atomic)");
        Ok(())
    }

    /// Apply environment overrides: `SIGNAL_SYMBOLS` is a comma-separated
    /// symbol list that replaces the configured one when present.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(syms) = std::env::var("SIGNAL_SYMBOLS") {
            let parsed: Vec<String> = syms
                .split(',')
                .map(|s| s.trim().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect();
            if !parsed.is_empty() {
                self.symbols = parsed;
            }
        }
    }
}
