use linkdb_config::Config;
use linkdb_core::NOT_FOUND;

/// Strategy printing the intersection of the matched keys, one member per line.
#[derive(Debug, Clone, Copy)]
pub struct GetStrategy;

impl super::CommandStrategy for GetStrategy {
    type Input = Vec<String>;

    async fn execute(&self, patterns: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;
        let graph = super::open_graph(&config).await?;
        let found = graph.intersect(&patterns).await?;
        if found.is_empty() {
            for line in NOT_FOUND {
                println!("{line}");
            }
        }
        for member in found {
            println!("{member}");
        }
        Ok(())
    }
}
