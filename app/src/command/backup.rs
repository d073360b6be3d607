use linkdb_config::Config;
use linkdb_core::backup;
use std::path::PathBuf;

/// Strategy exporting every key to a JSON document.
#[derive(Debug, Clone, Copy)]
pub struct BackupStrategy;

impl super::CommandStrategy for BackupStrategy {
    /// Output path overriding `backup.path`.
    type Input = Option<PathBuf>;

    async fn execute(&self, output: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let graph = super::open_graph(&config).await?;
        let path = output.unwrap_or(config.backup.path);

        let count = backup::export(graph.store(), &path).await?;
        println!("{count} keys written to {}", path.display());
        Ok(())
    }
}
