/// The narrow slice of the chat platform the watcher talks to.

use async_trait::async_trait;
use thiserror::Error;

/// A chat message as seen by the watcher.
#[derive(Debug, Clone)]
pub struct IncomingMessage {
    pub id: u64,
    pub channel_id: u64,
    /// Parent category of the channel, if it has one
    pub category_id: Option<u64>,
    pub author_id: u64,
    pub author_is_bot: bool,
    pub content: String,
}

/// Raw edit notification. Channel and content may be absent from the payload.
#[derive(Debug, Clone)]
pub struct MessageEdit {
    pub message_id: u64,
    pub channel_id: Option<u64>,
    pub content: Option<String>,
}

#[derive(Debug, Error)]
pub enum GatewayError {
    /// The message or channel no longer exists (or is no longer visible).
    #[error("message or channel not found")]
    NotFound,
    #[error("transport error: {0}")]
    Transport(String),
}

#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Post a message with optional plain content and optional embed description.
    /// Returns the id of the new message.
    async fn send_message(
        &self,
        channel_id: u64,
        content: Option<&str>,
        embed: Option<&str>,
    ) -> Result<u64, GatewayError>;

    async fn fetch_message(&self, channel_id: u64, message_id: u64) -> Result<IncomingMessage, GatewayError>;

    async fn delete_message(&self, channel_id: u64, message_id: u64) -> Result<(), GatewayError>;

    /// Arrange for `message_id` to be deleted later, or sooner when one of
    /// `authorized_user_ids` asks for it. Must not block the caller.
    fn schedule_self_destruct(&self, channel_id: u64, message_id: u64, authorized_user_ids: Vec<u64>);
}
