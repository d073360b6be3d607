use linkdb_config::Config;
use linkdb_core::{Interpreter, LinkGraph};
use linkdb_telegram::LinkBot;
use std::sync::Arc;
use tracing::info;

/// Strategy for running the Telegram bot.
#[derive(Debug, Clone, Copy)]
pub struct BotStrategy;

impl super::CommandStrategy for BotStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        info!("Starting Telegram bot...");

        let store = Arc::new(super::connect_store_with_retry(&config.database.url).await);
        let interpreter = Interpreter::new(LinkGraph::new(store));

        let bot = LinkBot::new(config.telegram.token.clone(), interpreter, &config.telegram)?;

        info!("Telegram bot is running. Press Ctrl+C to stop.");
        bot.run().await?;

        Ok(())
    }
}
