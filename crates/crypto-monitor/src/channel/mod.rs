//! Chat Channels
//!
//! Outbound messaging. Delivery is best-effort: callers go through
//! [`notify`], which logs failures and never retries.

mod telegram;

pub use telegram::{InlineButton, TelegramChannel};

use std::sync::Mutex;

use async_trait::async_trait;

use crate::error::{MonitorError, Result};

/// Chat channel trait
#[async_trait]
pub trait ChatChannel: Send + Sync {
    /// Send a Markdown message to the configured chat
    async fn send_message(&self, text: &str) -> Result<()>;

    /// Check the channel credentials
    async fn health_check(&self) -> bool;

    /// Channel name
    fn name(&self) -> &str;
}

/// Send and swallow; returns whether the message went out
pub async fn notify(channel: &dyn ChatChannel, text: &str) -> bool {
    match channel.send_message(text).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{} delivery failed: {}", channel.name(), e);
            false
        }
    }
}

/// In-memory channel that records every message
#[derive(Default)]
pub struct MemoryChannel {
    sent: Mutex<Vec<String>>,
    fail: bool,
}

impl MemoryChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Channel whose sends always fail
    pub fn failing() -> Self {
        Self {
            sent: Mutex::default(),
            fail: true,
        }
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.lock().map(|m| m.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl ChatChannel for MemoryChannel {
    async fn send_message(&self, text: &str) -> Result<()> {
        if self.fail {
            return Err(MonitorError::Channel("memory channel set to fail".into()));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(text.to_string());
        }
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.fail
    }

    fn name(&self) -> &str {
        "Memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_notify_records() {
        let channel = MemoryChannel::new();
        assert!(notify(&channel, "hello").await);
        assert_eq!(channel.messages(), vec!["hello"]);
    }

    #[tokio::test]
    async fn test_notify_swallows_failures() {
        let channel = MemoryChannel::failing();
        assert!(!notify(&channel, "hello").await);
        assert!(channel.messages().is_empty());
    }
}
