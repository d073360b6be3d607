use linkdb_config::Config;

/// Strategy running the maintenance pass over the whole store.
#[derive(Debug, Clone, Copy)]
pub struct NormalizeStrategy;

impl super::CommandStrategy for NormalizeStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let graph = super::open_graph(&config).await?;
        for event in graph.normalize().await? {
            println!("{event}");
        }
        Ok(())
    }
}
