use crate::channel::{ChatChannel, MessageLog};
use crate::command::bot_commands;
use crate::{Error, Result};
use linkdb_config::TelegramConfig;
use linkdb_core::{Command, Interpreter};
use std::{collections::HashMap, sync::Arc, time::Duration};
use teloxide::prelude::*;
use teloxide::types::Me;
use tokio::sync::{Mutex, mpsc};
use tokio::time::sleep;
use tracing::{info, warn};

/// Replies buffered for a tagging session before the sender waits.
const REPLY_BUFFER: usize = 16;

/// Telegram messages are cut off above this many characters.
const MAX_MESSAGE_CHARS: usize = 4000;

/// Text of a fault report, shortened to fit one Telegram message.
pub(crate) fn fault_text(err: &Error) -> String {
    let text = format!("{err:?}");
    if text.chars().count() <= MAX_MESSAGE_CHARS {
        return text;
    }
    text.chars().take(MAX_MESSAGE_CHARS).collect()
}

/// Telegram bot driving the link interpreter.
#[derive(Clone)]
pub struct LinkBot {
    /// Teloxide bot instance
    pub bot: Bot,
    interpreter: Interpreter,
    /// The only user whose messages are interpreted
    operator: UserId,
    log: MessageLog,
    /// Reply senders of running tagging sessions, by chat
    sessions: Arc<Mutex<HashMap<ChatId, mpsc::Sender<String>>>>,
}

impl LinkBot {
    pub fn new(token: String, interpreter: Interpreter, config: &TelegramConfig) -> Result<Self> {
        if token.is_empty() {
            return Err(Error::Config(
                "Telegram bot token not configured. Set \"telegram.token\" or TELEGRAM_BOT_TOKEN"
                    .into(),
            ));
        }
        if config.operator_id == 0 {
            return Err(Error::Config(
                "Operator not configured. Set \"telegram.operator_id\" or LINKDB_OPERATOR_ID"
                    .into(),
            ));
        }

        Ok(Self {
            bot: Bot::new(token),
            interpreter: interpreter.with_tagging_timeout(config.tagging_timeout()),
            operator: UserId(config.operator_id),
            log: MessageLog::new(),
            sessions: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub(crate) const fn authorize(&self, user: UserId) -> Result<()> {
        if user.0 == self.operator.0 {
            Ok(())
        } else {
            Err(Error::Unauthorized(user.0))
        }
    }

    pub(crate) const fn log(&self) -> &MessageLog {
        &self.log
    }

    pub(crate) const fn interpreter(&self) -> &Interpreter {
        &self.interpreter
    }

    pub(crate) fn channel(
        &self,
        chat_id: ChatId,
        replies: Option<mpsc::Receiver<String>>,
    ) -> ChatChannel {
        ChatChannel::new(
            self.bot.clone(),
            chat_id,
            self.operator,
            self.log.clone(),
            replies,
        )
    }

    /// Send a fault to the operator instead of the chat it happened in.
    pub(crate) async fn report_fault(&self, err: &Error) -> Result<()> {
        warn!("Reporting fault to operator: {err}");
        self.bot
            .send_message(ChatId::from(self.operator), fault_text(err))
            .await?;
        Ok(())
    }

    /// Hand `text` to the tagging session running in this chat, if any.
    ///
    /// Returns `false` when no session accepts it, in which case the caller
    /// handles `text` as a new command.
    pub(crate) async fn forward_reply(&self, chat_id: ChatId, text: &str) -> bool {
        let sender = self.sessions.lock().await.get(&chat_id).cloned();
        let Some(sender) = sender else {
            return false;
        };
        if sender.send(text.to_string()).await.is_ok() {
            return true;
        }
        self.end_session(chat_id, &sender).await;
        false
    }

    /// Forget the session owning `sender`, leaving a newer one in place.
    async fn end_session(&self, chat_id: ChatId, sender: &mpsc::Sender<String>) {
        let mut sessions = self.sessions.lock().await;
        if sessions
            .get(&chat_id)
            .is_some_and(|current| current.same_channel(sender))
        {
            sessions.remove(&chat_id);
        }
    }

    /// Run a tagging command in its own task so this chat keeps receiving
    /// replies while it waits.
    pub(crate) async fn spawn_tagging(&self, chat_id: ChatId, command: Command) {
        let (sender, replies) = mpsc::channel(REPLY_BUFFER);
        self.sessions.lock().await.insert(chat_id, sender.clone());

        let link_bot = self.clone();
        tokio::spawn(async move {
            let channel = link_bot.channel(chat_id, Some(replies));
            if let Err(e) = link_bot.interpreter.execute(command, &channel).await {
                let err = Error::Command(e);
                if let Err(report_err) = link_bot.report_fault(&err).await {
                    warn!("Failed to report fault: {report_err}");
                }
            }
            let unread = channel.close_replies().await;
            link_bot.end_session(chat_id, &sender).await;
            drop(sender);
            info!("Tagging session in chat {} ended", chat_id.0);

            for text in unread {
                crate::handler::replay(link_bot.clone(), chat_id, text).await;
            }
        });
    }

    /// Test connection to Telegram API with backoff retry.
    /// Starts at 2s, increases by 2s each attempt, max 10s delay.
    /// Retries indefinitely until connection succeeds.
    async fn test_connection(&self) -> Me {
        const INITIAL_DELAY_SECS: u64 = 2;
        const MAX_DELAY_SECS: u64 = 10;

        let mut attempt = 1u64;
        loop {
            match self.bot.get_me().await {
                Ok(me) => {
                    info!(
                        "Connected to Telegram API: @{} (id: {})",
                        me.user.username.as_deref().unwrap_or("no username"),
                        me.user.id
                    );
                    return me;
                }
                Err(e) => {
                    let delay_secs = (INITIAL_DELAY_SECS * attempt).min(MAX_DELAY_SECS);

                    warn!("Connection attempt {attempt} failed: {e}. Retrying in {delay_secs}s...");

                    if attempt == 1 {
                        warn!("This may be due to:");
                        warn!("  - Network connectivity issues");
                        warn!("  - Firewall blocking api.telegram.org");
                        warn!("  - Invalid bot token");
                    }

                    sleep(Duration::from_secs(delay_secs)).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Run the bot until Ctrl+C.
    pub async fn run(self) -> Result<()> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::dptree;
        use teloxide::types::Update;

        let me = self.test_connection().await;
        self.bot.set_my_commands(bot_commands()).await?;

        let name = me
            .user
            .username
            .clone()
            .unwrap_or_else(|| me.user.first_name.clone());
        self.bot
            .send_message(ChatId::from(self.operator), format!("Logged on as {name}!"))
            .await?;

        let bot = self.bot.clone();

        let schema = dptree::entry().branch(Update::filter_message().endpoint({
            let link_bot = self.clone();
            move |_bot: Bot, msg: Message| {
                let link_bot = link_bot.clone();
                async move { crate::handler::handle_message(link_bot, msg).await }
            }
        }));

        Dispatcher::builder(bot, schema)
            .enable_ctrlc_handler()
            .build()
            .dispatch()
            .await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkdb_core::{LinkGraph, MemoryStore};

    fn link_bot() -> LinkBot {
        let interpreter = Interpreter::new(LinkGraph::new(Arc::new(MemoryStore::new())));
        let config = TelegramConfig {
            operator_id: 1,
            ..TelegramConfig::default()
        };
        LinkBot::new("123:abc".to_string(), interpreter, &config).unwrap()
    }

    #[tokio::test]
    async fn test_forward_reply_reaches_open_session() {
        let bot = link_bot();
        let chat = ChatId(5);
        assert!(!bot.forward_reply(chat, "p").await);

        let (sender, mut replies) = mpsc::channel(REPLY_BUFFER);
        bot.sessions.lock().await.insert(chat, sender);

        assert!(bot.forward_reply(chat, "p").await);
        assert_eq!(replies.recv().await, Some("p".to_string()));
    }

    #[tokio::test]
    async fn test_forward_reply_refused_once_session_closes() {
        let bot = link_bot();
        let chat = ChatId(5);
        let (sender, mut replies) = mpsc::channel(REPLY_BUFFER);
        bot.sessions.lock().await.insert(chat, sender);

        replies.close();

        assert!(!bot.forward_reply(chat, "/get tag").await);
        assert!(bot.sessions.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_end_session_keeps_newer_session() {
        let bot = link_bot();
        let chat = ChatId(5);
        let (old, _old_replies) = mpsc::channel::<String>(REPLY_BUFFER);
        let (new, _new_replies) = mpsc::channel::<String>(REPLY_BUFFER);
        bot.sessions.lock().await.insert(chat, new);

        bot.end_session(chat, &old).await;

        assert!(bot.sessions.lock().await.contains_key(&chat));
    }

    #[test]
    fn test_operator_only() {
        let bot = link_bot();
        assert!(bot.authorize(UserId(1)).is_ok());
        assert!(matches!(
            bot.authorize(UserId(2)),
            Err(Error::Unauthorized(2))
        ));
    }

    #[test]
    fn test_fault_text_is_bounded() {
        let short = Error::Config("missing token".into());
        assert!(fault_text(&short).contains("missing token"));

        let long = Error::Command(anyhow::anyhow!("x".repeat(10_000)));
        assert_eq!(fault_text(&long).chars().count(), MAX_MESSAGE_CHARS);
    }
}
