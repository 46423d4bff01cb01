// =============================================================================
// Telegram Notifier — delivers buy-signal alerts via the Bot API
// =============================================================================
//
// SECURITY: the bot token is part of the request URL; it is never logged and
// the Debug impl redacts it.
// =============================================================================

use anyhow::{Context, Result};
use async_trait::async_trait;
use tracing::{debug, instrument};

use super::Notifier;

/// Telegram Bot API notifier. Sends plain-text messages to a single chat.
pub struct TelegramNotifier {
    token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    /// Create a new `TelegramNotifier`.
    ///
    /// # Arguments
    /// * `token`   — bot token from @BotFather.
    /// * `chat_id` — target chat (user or group) id.
    pub fn new(token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .expect("failed to build reqwest client");

        Self {
            token: token.into(),
            chat_id: chat_id.into(),
            client,
        }
    }

    /// Whether both token and chat id are configured.
    pub fn is_configured(&self) -> bool {
        !self.token.is_empty() && !self.chat_id.is_empty()
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    /// POST /bot{token}/sendMessage with a chat_id/text form payload.
    #[instrument(skip(self, text), name = "telegram::send")]
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!("https://api.telegram.org/bot{}/sendMessage", self.token);
        let payload = [("chat_id", self.chat_id.as_str()), ("text", text)];

        let resp = self
            .client
            .post(&url)
            .form(&payload)
            .send()
            .await
            .context("POST sendMessage request failed")?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            anyhow::bail!("Telegram sendMessage returned {}: {}", status, body);
        }

        debug!(chat_id = %self.chat_id, "notification delivered");
        Ok(())
    }
}

impl std::fmt::Debug for TelegramNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramNotifier")
            .field("token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}
