//! Static strategy pattern for CLI commands.
//!
//! Each subcommand is a separate strategy with its own input type, dispatched
//! statically from `main`.

use linkdb_config::Config;
use linkdb_core::LinkGraph;
use linkdb_store::SqlStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, warn};

mod backup;
mod bot;
mod delete;
mod get;
mod init;
mod normalize;
mod set;
mod version;

pub use backup::BackupStrategy;
pub use bot::BotStrategy;
pub use delete::DeleteStrategy;
pub use get::GetStrategy;
pub use init::InitStrategy;
pub use normalize::NormalizeStrategy;
pub use set::{SetInput, SetStrategy};
pub use version::VersionStrategy;

/// Open the configured store once. One-shot commands fail fast.
async fn open_graph(config: &Config) -> anyhow::Result<LinkGraph> {
    let store = SqlStore::connect(&config.database.url).await?;
    Ok(LinkGraph::new(Arc::new(store)))
}

/// Connect to the store with backoff retry.
///
/// # Retry Behavior
/// - First retry: 1s
/// - Second retry: 2s
/// - Third and beyond: 3s (capped)
/// - Retries indefinitely until connection succeeds
async fn connect_store_with_retry(database_url: &str) -> SqlStore {
    const MAX_DELAY: Duration = Duration::from_secs(3);
    const INITIAL_DELAY: Duration = Duration::from_secs(1);

    let mut attempt = 0u32;
    let mut delay = INITIAL_DELAY;

    loop {
        attempt += 1;
        match SqlStore::connect(database_url).await {
            Ok(store) => {
                info!("Store connected on attempt {attempt}");
                return store;
            }
            Err(e) => {
                warn!(
                    "Failed to connect to database (attempt {attempt}): {e}. Retrying in {}s...",
                    delay.as_secs()
                );
                sleep(delay).await;
                // 1s -> 2s -> 3s -> 3s -> ...
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

/// Core trait defining the contract for all command strategies.
///
/// Each strategy defines its own input type via the associated type, so
/// parameters are passed without runtime casting or boxing.
pub trait CommandStrategy: Send + Sync + 'static {
    /// The input type this strategy accepts.
    type Input;

    /// Execute the command with the given input.
    ///
    /// # Errors
    /// Returns an error if command execution fails.
    async fn execute(&self, input: Self::Input) -> anyhow::Result<()>;
}
