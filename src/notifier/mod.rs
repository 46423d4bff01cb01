// =============================================================================
// Notifier Module
// =============================================================================
//
// Outbound alert delivery. The poller talks to the `Notifier` trait so tests
// can capture messages in memory; production wires in Telegram.

pub mod telegram;

use anyhow::Result;
use async_trait::async_trait;

pub use telegram::TelegramNotifier;

/// Delivery channel for human-readable alerts.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver one message. Failures are reported to the caller; the
    /// notifier itself never retries.
    async fn send(&self, text: &str) -> Result<()>;
}
