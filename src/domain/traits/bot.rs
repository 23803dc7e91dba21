use async_trait::async_trait;

use crate::application::errors::BotError;
use crate::domain::traits::Reply;

/// Bot trait - abstraction for the platform's event-delivery connector
#[async_trait]
pub trait Bot: Send + Sync {
    /// Start the connector and begin delivering triggers
    async fn start(&self) -> Result<(), BotError>;

    /// Send a reply to a channel
    async fn send_reply(&self, channel_id: &str, reply: &Reply) -> Result<String, BotError>;

    /// Get bot info
    fn bot_info(&self) -> BotInfo;
}

/// Bot information
#[derive(Debug, Clone)]
pub struct BotInfo {
    pub id: String,
    pub name: String,
    pub username: String,
}
