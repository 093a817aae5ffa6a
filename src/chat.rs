//! # Chat Surface
//!
//! The slice of Discord the command handlers actually touch: named side
//! channels (logs, alerts, results) and plain text sends. Kept behind a trait
//! so the command pipeline can run against a recording mock in tests; the
//! real implementation lives in `bot`.

use anyhow::Result;
use async_trait::async_trait;

/// Handle to a resolved text channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelHandle {
    pub id: u64,
    pub name: String,
}

impl ChannelHandle {
    /// Discord channel mention (`<#id>`).
    pub fn mention(&self) -> String {
        format!("<#{}>", self.id)
    }
}

/// Channel plumbing for handlers that mirror log lines or post alerts.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Return a handle to the named text channel, creating it if absent.
    async fn channel(&self, name: &str) -> Result<ChannelHandle>;

    /// Send a plain text message to a previously resolved channel.
    async fn send(&self, channel: &ChannelHandle, content: &str) -> Result<()>;
}

/// Resolve a channel by name and post to it in one step.
pub async fn post(chat: &dyn Messenger, channel_name: &str, content: &str) -> Result<()> {
    let channel = chat.channel(channel_name).await?;
    chat.send(&channel, content).await
}
