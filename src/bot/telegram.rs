use crate::bot::traits::ChatApi;
use crate::bot::types::{Message, OutgoingMessage, Update};
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

/// Slack on top of the long-poll timeout before the HTTP request gives up
const POLL_GRACE_SECS: u64 = 10;
const MAX_POLL_TIMEOUT_SECS: u64 = 50;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("telegram request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("telegram rejected {method}: {description}")]
    Api { method: String, description: String },
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

/// Minimal Telegram Bot API client over JSON POST requests
pub struct TelegramClient {
    client: Client,
    base_url: String,
}

impl TelegramClient {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(API_BASE, token)
    }

    pub fn with_base_url(api_base: &str, token: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(MAX_POLL_TIMEOUT_SECS + POLL_GRACE_SECS))
            .no_proxy()
            .build()
            .context("Failed to create Telegram HTTP client")?;

        Ok(Self {
            client,
            base_url: format!("{}/bot{}", api_base.trim_end_matches('/'), token),
        })
    }

    async fn call<T: DeserializeOwned>(&self, method: &str, payload: &Value) -> Result<T, TelegramError> {
        debug!(method, "Calling Telegram API");

        // Errors carry the request URL, which embeds the bot token
        let response = self
            .client
            .post(format!("{}/{}", self.base_url, method))
            .json(payload)
            .send()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        let body: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| TelegramError::Http(e.without_url()))?;

        match body {
            ApiResponse { ok: true, result: Some(result), .. } => Ok(result),
            ApiResponse { description, .. } => Err(TelegramError::Api {
                method: method.to_string(),
                description: description.unwrap_or_else(|| "no description".to_string()),
            }),
        }
    }
}

fn message_payload(chat_id: i64, message: &OutgoingMessage) -> Result<Value> {
    let mut payload = json!({
        "chat_id": chat_id,
        "text": message.text,
        "parse_mode": "HTML",
        "disable_web_page_preview": message.disable_preview,
    });

    if let Some(markup) = &message.reply_markup {
        payload["reply_markup"] = serde_json::to_value(markup).context("Failed to encode reply markup")?;
    }
    if let Some(reply_to) = message.reply_to {
        payload["reply_to_message_id"] = json!(reply_to);
        payload["allow_sending_without_reply"] = json!(true);
    }

    Ok(payload)
}

#[async_trait]
impl ChatApi for TelegramClient {
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": timeout_secs.min(MAX_POLL_TIMEOUT_SECS),
            "allowed_updates": ["message", "callback_query"],
        });
        Ok(self.call("getUpdates", &payload).await?)
    }

    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<Message> {
        let payload = message_payload(chat_id, message)?;
        Ok(self.call("sendMessage", &payload).await?)
    }

    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<Message> {
        let payload = json!({
            "chat_id": chat_id,
            "photo": photo_url,
            "caption": caption,
            "parse_mode": "HTML",
        });
        Ok(self.call("sendPhoto", &payload).await?)
    }

    async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        self.call::<Value>("editMessageText", &payload).await?;
        Ok(())
    }

    async fn clear_inline_keyboard(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        self.call::<Value>("editMessageReplyMarkup", &payload).await?;
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
        });
        self.call::<bool>("deleteMessage", &payload).await?;
        Ok(())
    }

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()> {
        let mut payload = json!({ "callback_query_id": callback_id });
        if let Some(text) = text {
            payload["text"] = json!(text);
        }
        self.call::<bool>("answerCallbackQuery", &payload).await?;
        Ok(())
    }
}
