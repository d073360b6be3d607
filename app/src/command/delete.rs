use linkdb_config::Config;

/// Strategy deleting matched keys along with their back-references.
#[derive(Debug, Clone, Copy)]
pub struct DeleteStrategy;

impl super::CommandStrategy for DeleteStrategy {
    type Input = Vec<String>;

    async fn execute(&self, patterns: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let graph = super::open_graph(&config).await?;
        for event in graph.delete(&patterns).await? {
            println!("{event}");
        }
        Ok(())
    }
}
