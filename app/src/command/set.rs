use linkdb_config::Config;

/// Input for the `set` command.
pub struct SetInput {
    pub key: String,
    pub values: Vec<String>,
}

/// Strategy linking a key with values in both directions.
#[derive(Debug, Clone, Copy)]
pub struct SetStrategy;

impl super::CommandStrategy for SetStrategy {
    type Input = SetInput;

    async fn execute(&self, input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let graph = super::open_graph(&config).await?;
        for event in graph.set_values(&input.key, &input.values).await? {
            println!("{event}");
        }
        Ok(())
    }
}
