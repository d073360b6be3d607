//! Executes parsed commands against the graph and a chat transport.

use std::time::Duration;
use tracing::info;

use crate::command::{Command, NOT_FOUND};
use crate::graph::LinkGraph;
use crate::tagging::{NO_DATA, TaggingEvent, TaggingSession, TaggingStep, prompt_text};
use crate::transport::Transport;

/// How long a tagging session waits for a reply.
pub const DEFAULT_TAGGING_TIMEOUT: Duration = Duration::from_secs(60);

/// Messages fetched from the channel history per round.
pub const HISTORY_BATCH: usize = 100;

/// `/clear` stops once the history is this short.
const CLEAR_KEEP: usize = 2;

#[derive(Clone)]
pub struct Interpreter {
    graph: LinkGraph,
    tagging_timeout: Duration,
}

impl Interpreter {
    #[must_use]
    pub const fn new(graph: LinkGraph) -> Self {
        Self {
            graph,
            tagging_timeout: DEFAULT_TAGGING_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_tagging_timeout(mut self, timeout: Duration) -> Self {
        self.tagging_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn graph(&self) -> &LinkGraph {
        &self.graph
    }

    /// Parse and execute one command line, returning the reply lines.
    pub async fn handle_text(
        &self,
        text: &str,
        transport: &dyn Transport,
    ) -> anyhow::Result<Vec<String>> {
        self.execute(Command::parse(text), transport).await
    }

    pub async fn execute(
        &self,
        command: Command,
        transport: &dyn Transport,
    ) -> anyhow::Result<Vec<String>> {
        let reply = match command {
            Command::Get { patterns } => {
                let found = self.graph.intersect(&patterns).await?;
                if found.is_empty() {
                    NOT_FOUND.iter().map(ToString::to_string).collect()
                } else {
                    found.into_iter().collect()
                }
            }
            Command::Clear => {
                self.clear(transport).await?;
                Vec::new()
            }
            Command::Eatup => {
                self.eatup(transport).await?;
                Vec::new()
            }
            Command::Tagging { key } => {
                self.tagging(&key, transport).await?;
                Vec::new()
            }
            Command::Delete { patterns } => {
                self.graph.delete(&patterns).await?;
                Vec::new()
            }
            Command::Set { key, values } => {
                self.graph.set_values(&key, &values).await?;
                Vec::new()
            }
            Command::Noop => Vec::new(),
        };
        Ok(reply)
    }

    async fn clear(&self, transport: &dyn Transport) -> anyhow::Result<()> {
        loop {
            let batch = transport.history(HISTORY_BATCH).await?;
            if batch.len() <= CLEAR_KEEP {
                return Ok(());
            }
            let ids: Vec<i32> = batch.iter().map(|m| m.id).collect();
            transport.delete_messages(&ids).await?;
            info!("Cleared {} messages", ids.len());
        }
    }

    async fn eatup(&self, transport: &dyn Transport) -> anyhow::Result<()> {
        for message in transport.history(HISTORY_BATCH).await? {
            for url in self.graph.record_urls(&message.text).await? {
                transport.notify_operator(&format!("RECORDED {url}")).await?;
            }
            transport.delete_messages(&[message.id]).await?;
        }
        Ok(())
    }

    async fn tagging(&self, key: &str, transport: &dyn Transport) -> anyhow::Result<()> {
        let mut session = TaggingSession::new(self.graph.members(key).await?);
        loop {
            match session.poll() {
                TaggingStep::Display(member) => {
                    let elements = self.graph.members(&member).await?;
                    transport.send(&prompt_text(&member, &elements)).await?;
                }
                TaggingStep::Await(member) => {
                    let reply = transport.next_reply(self.tagging_timeout).await?;
                    let event = reply
                        .as_deref()
                        .map_or(TaggingEvent::Timeout, TaggingEvent::Reply);
                    if event == TaggingEvent::Timeout {
                        info!("Tagging session for {key} timed out on {member}");
                    }
                    if let Some((member, values)) = session.handle(event) {
                        self.graph.set_values(&member, &values).await?;
                    }
                }
                TaggingStep::Finished { empty } => {
                    if empty {
                        transport.send(NO_DATA).await?;
                    }
                    return Ok(());
                }
            }
        }
    }
}
