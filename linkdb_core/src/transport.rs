//! Capabilities the interpreter needs from a chat platform.

use async_trait::async_trait;
use std::time::Duration;

/// A message in the channel history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggedMessage {
    pub id: i32,
    pub text: String,
}

/// One conversation on a chat platform.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a message to the conversation.
    async fn send(&self, text: &str) -> anyhow::Result<()>;

    /// Send a direct message to the operator.
    async fn notify_operator(&self, text: &str) -> anyhow::Result<()>;

    /// Up to `limit` messages of the conversation, newest first.
    async fn history(&self, limit: usize) -> anyhow::Result<Vec<LoggedMessage>>;

    async fn delete_messages(&self, ids: &[i32]) -> anyhow::Result<()>;

    /// Next message from the operator, or `None` once `timeout` elapses.
    async fn next_reply(&self, timeout: Duration) -> anyhow::Result<Option<String>>;
}
