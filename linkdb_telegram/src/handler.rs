use crate::{Error, LinkBot, Result};
use linkdb_core::{Command, Transport};
use std::future::Future;
use std::pin::Pin;
use teloxide::types::{ChatId, Message};
use tracing::{debug, info, warn};

/// Handle any message in a chat the bot can see.
///
/// Faults never reach the dispatcher: they are relayed to the operator.
pub async fn handle_message(bot: LinkBot, msg: Message) -> Result<()> {
    if let Err(err) = dispatch(&bot, &msg).await {
        relay_fault(&bot, &err).await;
    }
    Ok(())
}

/// Handle an operator message a tagging session received but never read.
pub(crate) fn replay(
    bot: LinkBot,
    chat_id: ChatId,
    text: String,
) -> Pin<Box<dyn Future<Output = ()> + Send>> {
    Box::pin(async move {
        debug!("Replaying unread reply in chat {}: {text}", chat_id.0);
        if let Err(err) = route(&bot, chat_id, &text).await {
            relay_fault(&bot, &err).await;
        }
    })
}

async fn relay_fault(bot: &LinkBot, err: &Error) {
    if let Err(report_err) = bot.report_fault(err).await {
        warn!("Failed to report fault: {report_err}");
    }
}

async fn dispatch(bot: &LinkBot, msg: &Message) -> Result<()> {
    let chat_id = msg.chat.id;
    let Some(text) = msg.text() else {
        return Ok(());
    };
    bot.log().record(chat_id, msg.id.0, text).await;

    let Some(user) = msg.from.as_ref() else {
        return Ok(());
    };
    if let Err(e) = bot.authorize(user.id) {
        debug!("{e}");
        return Ok(());
    }

    let username = user.username.as_deref().unwrap_or("unknown");
    info!("[@{username}] Message: {text}");

    route(bot, chat_id, text).await
}

/// Feed an operator message to the running tagging session, or run it as a
/// command.
async fn route(bot: &LinkBot, chat_id: ChatId, text: &str) -> Result<()> {
    if bot.forward_reply(chat_id, text).await {
        return Ok(());
    }

    match Command::parse(text) {
        Command::Noop => Ok(()),
        command @ Command::Tagging { .. } => {
            bot.spawn_tagging(chat_id, command).await;
            Ok(())
        }
        command => {
            let channel = bot.channel(chat_id, None);
            let reply = bot
                .interpreter()
                .execute(command, &channel)
                .await
                .map_err(Error::Command)?;
            for line in reply {
                channel.send(&line).await.map_err(Error::Command)?;
            }
            Ok(())
        }
    }
}
