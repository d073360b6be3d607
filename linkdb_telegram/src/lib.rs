#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Telegram transport for the link bot.

mod bot;
mod channel;
mod command;
mod error;
mod handler;

pub use bot::LinkBot;
pub use channel::{ChatChannel, MessageLog};
pub use command::bot_commands;
pub use error::{Error, Result};
