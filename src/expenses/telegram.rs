//! Telegram client using teloxide.

use async_trait::async_trait;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{info, warn};

use super::update::Update;

/// Deserialize a webhook body into an [`Update`].
pub fn parse_update(body: &str) -> Result<Update, serde_json::Error> {
    serde_json::from_str(body)
}

/// Outbound replies to a user.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), String>;
}

/// Telegram API client.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    /// Point Telegram's webhook at `url`.
    pub async fn register_webhook(&self, url: Url) -> Result<(), String> {
        info!("Registering webhook at {}", url);
        self.bot.set_webhook(url).await.map(|_| ()).map_err(|e| {
            let msg = format!("Failed to set webhook: {e}");
            warn!("{}", msg);
            msg
        })
    }
}

#[async_trait]
impl Messenger for TelegramClient {
    async fn send_message(&self, user_id: i64, text: &str) -> Result<(), String> {
        // Legacy Markdown leaves `.` and `$` in amounts unescaped.
        #[allow(deprecated)]
        let parse_mode = ParseMode::Markdown;

        self.bot
            .send_message(ChatId(user_id), text)
            .parse_mode(parse_mode)
            .await
            .map(|_| ())
            .map_err(|e| {
                let msg = format!("Failed to send: {e}");
                warn!("{}", msg);
                msg
            })
    }
}
