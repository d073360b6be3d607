use teloxide::types::BotCommand;

fn command(name: &str, description: &str) -> BotCommand {
    BotCommand {
        command: name.to_string(),
        description: description.to_string(),
    }
}

/// Command list shown by Telegram clients.
#[must_use]
pub fn bot_commands() -> Vec<BotCommand> {
    vec![
        command("get", "Members shared by every matching key"),
        command("set", "Associate a key with values"),
        command("del", "Delete keys and their back-references"),
        command("tagging", "Tag each member of a key interactively"),
        command("eatup", "Record the URLs in this chat and delete the messages"),
        command("clear", "Delete the messages of this chat"),
    ]
}
