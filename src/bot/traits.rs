use crate::bot::types::{Message, OutgoingMessage, Update};
use anyhow::Result;
use async_trait::async_trait;

/// Chat delivery channel used by the bot
#[async_trait]
pub trait ChatApi: Send + Sync {
    /// Long-poll for updates starting at `offset`
    async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>>;

    async fn send_message(&self, chat_id: i64, message: &OutgoingMessage) -> Result<Message>;

    /// Send a photo by URL with an HTML caption
    async fn send_photo(&self, chat_id: i64, photo_url: &str, caption: &str) -> Result<Message>;

    async fn edit_message_text(&self, chat_id: i64, message_id: i64, text: &str) -> Result<()>;

    /// Remove the inline keyboard from a message
    async fn clear_inline_keyboard(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<()>;

    async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) -> Result<()>;
}
