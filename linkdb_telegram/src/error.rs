use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Telegram API error: {0}")]
    Telegram(#[from] teloxide::RequestError),

    #[error("Command failed: {0}")]
    Command(anyhow::Error),

    #[error("Ignoring message from user {0}: not the operator")]
    Unauthorized(u64),

    #[error("Configuration error: {0}")]
    Config(String),
}
