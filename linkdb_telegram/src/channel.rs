use async_trait::async_trait;
use linkdb_core::{LoggedMessage, Transport};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use teloxide::Bot;
use teloxide::requests::Requester;
use teloxide::types::{ChatId, MessageId, UserId};
use tokio::sync::{Mutex, mpsc};
use tracing::debug;

/// Messages kept per chat.
const LOG_LIMIT: usize = 1000;

/// Telegram refuses to delete more messages than this in one request.
const DELETE_BATCH: usize = 100;

/// Messages the bot has seen or sent, per chat, newest first.
///
/// The Bot API has no history endpoint, so `/clear` and `/eatup` work on
/// this log.
#[derive(Clone, Default)]
pub struct MessageLog {
    chats: Arc<Mutex<HashMap<ChatId, VecDeque<LoggedMessage>>>>,
}

impl MessageLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record(&self, chat_id: ChatId, id: i32, text: &str) {
        let mut chats = self.chats.lock().await;
        let log = chats.entry(chat_id).or_default();
        log.push_front(LoggedMessage {
            id,
            text: text.to_string(),
        });
        log.truncate(LOG_LIMIT);
    }

    pub async fn recent(&self, chat_id: ChatId, limit: usize) -> Vec<LoggedMessage> {
        self.chats
            .lock()
            .await
            .get(&chat_id)
            .map(|log| log.iter().take(limit).cloned().collect())
            .unwrap_or_default()
    }

    pub async fn forget(&self, chat_id: ChatId, ids: &[i32]) {
        if let Some(log) = self.chats.lock().await.get_mut(&chat_id) {
            log.retain(|message| !ids.contains(&message.id));
        }
    }
}

/// One Telegram chat seen through the [`Transport`] capabilities.
pub struct ChatChannel {
    bot: Bot,
    chat_id: ChatId,
    operator: UserId,
    log: MessageLog,
    /// Operator messages routed to a running tagging session.
    replies: Option<Mutex<mpsc::Receiver<String>>>,
}

impl ChatChannel {
    #[must_use]
    pub fn new(
        bot: Bot,
        chat_id: ChatId,
        operator: UserId,
        log: MessageLog,
        replies: Option<mpsc::Receiver<String>>,
    ) -> Self {
        Self {
            bot,
            chat_id,
            operator,
            log,
            replies: replies.map(Mutex::new),
        }
    }

    /// Stop accepting replies and return those the session never read.
    ///
    /// Senders fail once this returns, so later messages are handled as new
    /// commands.
    pub async fn close_replies(&self) -> Vec<String> {
        let Some(replies) = &self.replies else {
            return Vec::new();
        };
        let mut replies = replies.lock().await;
        replies.close();
        let mut unread = Vec::new();
        while let Ok(text) = replies.try_recv() {
            unread.push(text);
        }
        unread
    }
}

#[async_trait]
impl Transport for ChatChannel {
    async fn send(&self, text: &str) -> anyhow::Result<()> {
        if text.is_empty() {
            return Ok(());
        }
        let sent = self.bot.send_message(self.chat_id, text).await?;
        self.log.record(self.chat_id, sent.id.0, text).await;
        Ok(())
    }

    async fn notify_operator(&self, text: &str) -> anyhow::Result<()> {
        self.bot
            .send_message(ChatId::from(self.operator), text)
            .await?;
        Ok(())
    }

    async fn history(&self, limit: usize) -> anyhow::Result<Vec<LoggedMessage>> {
        Ok(self.log.recent(self.chat_id, limit).await)
    }

    async fn delete_messages(&self, ids: &[i32]) -> anyhow::Result<()> {
        for chunk in ids.chunks(DELETE_BATCH) {
            self.bot
                .delete_messages(self.chat_id, chunk.iter().copied().map(MessageId))
                .await?;
            self.log.forget(self.chat_id, chunk).await;
            debug!("Deleted {} messages in chat {}", chunk.len(), self.chat_id.0);
        }
        Ok(())
    }

    async fn next_reply(&self, timeout: Duration) -> anyhow::Result<Option<String>> {
        let Some(replies) = &self.replies else {
            return Ok(None);
        };
        let mut replies = replies.lock().await;
        Ok(tokio::time::timeout(timeout, replies.recv())
            .await
            .ok()
            .flatten())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_is_newest_first_and_bounded() {
        let log = MessageLog::new();
        let chat = ChatId(1);
        for id in 0..1005 {
            log.record(chat, id, &format!("message {id}")).await;
        }

        let recent = log.recent(chat, 3).await;
        assert_eq!(
            recent.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![1004, 1003, 1002]
        );
        assert_eq!(log.recent(chat, usize::MAX).await.len(), LOG_LIMIT);
        assert!(log.recent(ChatId(2), 10).await.is_empty());
    }

    #[tokio::test]
    async fn test_close_replies_returns_unread_and_refuses_more() {
        let (sender, replies) = mpsc::channel(4);
        let channel = ChatChannel::new(
            Bot::new("123:abc"),
            ChatId(1),
            UserId(1),
            MessageLog::new(),
            Some(replies),
        );
        sender.send("first".to_string()).await.unwrap();
        assert_eq!(
            channel.next_reply(Duration::from_millis(10)).await.unwrap(),
            Some("first".to_string())
        );
        sender.send("/get tag".to_string()).await.unwrap();

        assert_eq!(channel.close_replies().await, vec!["/get tag".to_string()]);
        assert!(sender.send("late".to_string()).await.is_err());
        assert!(channel.close_replies().await.is_empty());
    }

    #[tokio::test]
    async fn test_close_replies_without_session() {
        let channel = ChatChannel::new(
            Bot::new("123:abc"),
            ChatId(1),
            UserId(1),
            MessageLog::new(),
            None,
        );
        assert!(channel.close_replies().await.is_empty());
    }

    #[tokio::test]
    async fn test_forget_removes_messages() {
        let log = MessageLog::new();
        let chat = ChatId(1);
        for id in 1..=3 {
            log.record(chat, id, "text").await;
        }

        log.forget(chat, &[1, 3]).await;

        let remaining: Vec<i32> = log.recent(chat, 10).await.iter().map(|m| m.id).collect();
        assert_eq!(remaining, vec![2]);
    }
}
