//! Association engine.
//!
//! Every association is written through [`LinkGraph::record_pair`], which
//! stores both directions of the edge. The other operations read, intersect,
//! delete or repair those pairs.

use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info, warn};

use crate::store::{KeyType, Store, StoredValue};
use crate::urls::URL_CHARS;

const INSECURE_TWITTER_PREFIX: &str = "http://twitter.com/";
const TWITTER_DOMAIN: &str = "twitter.com";

static TWITTER_ACCOUNT_PATTERN: OnceLock<Regex> = OnceLock::new();

#[expect(
    clippy::expect_used,
    reason = "Static regex pattern validated at compile time"
)]
fn twitter_account_pattern() -> &'static Regex {
    TWITTER_ACCOUNT_PATTERN.get_or_init(|| {
        Regex::new(&format!(r"^(https?://twitter\.com/)({URL_CHARS}+)"))
            .expect("Static regex pattern is guaranteed to be valid")
    })
}

/// Something the engine did to the store, reported to the caller and logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphEvent {
    /// A pair was recorded by `set_values`.
    Recorded { key: String, value: String },
    /// `key` was removed from the set of `member` while deleting `key`.
    Unlinked { key: String, member: String },
    /// `member` no longer holds a set that could point back at `key`.
    Forbidden { key: String, member: String },
    Deleted { key: String },
    Paired { key: String, member: String },
    /// A missing back-reference from `member` to `key` was written.
    Restored { key: String, member: String },
    /// Legacy scalar entry, left untouched.
    ScalarEntry { key: String, value: String },
    HttpsMigrated { url: String, member: String },
    AccountLinked { url: String, account: String },
}

impl fmt::Display for GraphEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recorded { key, value } => write!(f, "RECORDED {key} & {value}"),
            Self::Unlinked { key, member } => write!(f, "DELETED {key} in {member}"),
            Self::Forbidden { key, member } => write!(f, "FORBIDDEN {key} in {member}"),
            Self::Deleted { key } => write!(f, "DELETED {key}"),
            Self::Paired { key, member } => write!(f, "PAIRED {key} AND {member}"),
            Self::Restored { key, member } => write!(f, "RESTORED {key} IN {member}"),
            Self::ScalarEntry { key, value } => write!(f, "IS STRING {value} IN {key}"),
            Self::HttpsMigrated { url, member } => {
                write!(f, "REPLACE w/ HTTPS {url} in {member}")
            }
            Self::AccountLinked { url, account } => write!(f, "LINKED {url} & {account}"),
        }
    }
}

fn emit(events: &mut Vec<GraphEvent>, event: GraphEvent) {
    info!("{event}");
    events.push(event);
}

/// Symmetric association graph over a [`Store`].
#[derive(Clone)]
pub struct LinkGraph {
    store: Arc<dyn Store>,
}

impl LinkGraph {
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &dyn Store {
        self.store.as_ref()
    }

    /// Associate `a` with `b` in both directions.
    pub async fn record_pair(&self, a: &str, b: &str) -> anyhow::Result<()> {
        self.store.add_member(a, b).await?;
        self.store.add_member(b, a).await?;
        debug!("Paired {a} <-> {b}");
        Ok(())
    }

    /// Associate `key` with every value.
    pub async fn set_values<S: AsRef<str>>(
        &self,
        key: &str,
        values: &[S],
    ) -> anyhow::Result<Vec<GraphEvent>> {
        let mut events = Vec::with_capacity(values.len());
        for value in values {
            let value = value.as_ref();
            self.record_pair(key, value).await?;
            emit(
                &mut events,
                GraphEvent::Recorded {
                    key: key.to_string(),
                    value: value.to_string(),
                },
            );
        }
        Ok(events)
    }

    /// Sorted members of `key`; empty when the key is absent.
    pub async fn members(&self, key: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.member_set(key).await?.into_iter().collect())
    }

    async fn member_set(&self, key: &str) -> anyhow::Result<BTreeSet<String>> {
        Ok(match self.store.read(key).await? {
            None => BTreeSet::new(),
            Some(StoredValue::Set(members)) => members,
            Some(StoredValue::Scalar(_)) => {
                warn!("Key {key} holds a scalar value, treating it as having no members");
                BTreeSet::new()
            }
        })
    }

    /// Intersection of the member sets of every key matched by every pattern.
    ///
    /// Matched keys are not grouped by pattern: each one contributes its own
    /// set to a single intersection. A pattern matching no key empties the
    /// result.
    pub async fn intersect<S: AsRef<str>>(
        &self,
        patterns: &[S],
    ) -> anyhow::Result<BTreeSet<String>> {
        let mut result: Option<BTreeSet<String>> = None;
        for pattern in patterns {
            let pattern = pattern.as_ref();
            let keys = self.store.list_keys(pattern).await?;
            if keys.is_empty() {
                debug!("Pattern {pattern} matched no keys");
                return Ok(BTreeSet::new());
            }
            for key in keys {
                let members = self.member_set(&key).await?;
                result = Some(match result {
                    None => members,
                    Some(acc) => acc.intersection(&members).cloned().collect(),
                });
            }
        }
        Ok(result.unwrap_or_default())
    }

    /// Delete every key matched by the patterns, removing its back-references
    /// first.
    pub async fn delete<S: AsRef<str>>(&self, patterns: &[S]) -> anyhow::Result<Vec<GraphEvent>> {
        let mut events = Vec::new();
        for pattern in patterns {
            for key in self.store.list_keys(pattern.as_ref()).await? {
                for member in self.member_set(&key).await? {
                    let event = if self.store.key_type(&member).await? == KeyType::Set {
                        self.store.remove_member(&member, &key).await?;
                        GraphEvent::Unlinked {
                            key: key.clone(),
                            member,
                        }
                    } else {
                        GraphEvent::Forbidden {
                            key: key.clone(),
                            member,
                        }
                    };
                    emit(&mut events, event);
                }
                self.store.delete_key(&key).await?;
                emit(&mut events, GraphEvent::Deleted { key });
            }
        }
        Ok(events)
    }

    /// Repair the whole store.
    ///
    /// Restores missing back-references, reports scalar entries, moves
    /// `http://twitter.com/` keys to https and links Twitter URLs to their
    /// account ids.
    pub async fn normalize(&self) -> anyhow::Result<Vec<GraphEvent>> {
        let mut events = Vec::new();
        self.repair_pairs(&mut events).await?;
        self.migrate_twitter_https(&mut events).await?;
        self.link_twitter_accounts(&mut events).await?;
        info!("Normalize finished with {} events", events.len());
        Ok(events)
    }

    async fn repair_pairs(&self, events: &mut Vec<GraphEvent>) -> anyhow::Result<()> {
        for key in self.store.list_keys("*").await? {
            match self.store.read(&key).await? {
                None => {}
                Some(StoredValue::Scalar(value)) => {
                    emit(events, GraphEvent::ScalarEntry { key, value });
                }
                Some(StoredValue::Set(members)) => {
                    for member in members {
                        if self.store.key_type(&member).await? == KeyType::Scalar {
                            warn!("Cannot restore {key} in scalar entry {member}");
                            continue;
                        }
                        let event = if self.store.get_set(&member).await?.contains(&key) {
                            GraphEvent::Paired {
                                key: key.clone(),
                                member,
                            }
                        } else {
                            self.record_pair(&key, &member).await?;
                            GraphEvent::Restored {
                                key: key.clone(),
                                member,
                            }
                        };
                        emit(events, event);
                    }
                }
            }
        }
        Ok(())
    }

    async fn migrate_twitter_https(&self, events: &mut Vec<GraphEvent>) -> anyhow::Result<()> {
        let pattern = format!("{INSECURE_TWITTER_PREFIX}*");
        for url in self.store.list_keys(&pattern).await? {
            let Some(rest) = url.strip_prefix("http://") else {
                continue;
            };
            let secure = format!("https://{rest}");
            for member in self.member_set(&url).await? {
                self.store.remove_member(&member, &url).await?;
                self.record_pair(&member, &secure).await?;
                emit(
                    events,
                    GraphEvent::HttpsMigrated {
                        url: url.clone(),
                        member,
                    },
                );
            }
            self.store.delete_key(&url).await?;
            emit(events, GraphEvent::Deleted { key: url });
        }
        Ok(())
    }

    async fn link_twitter_accounts(&self, events: &mut Vec<GraphEvent>) -> anyhow::Result<()> {
        for url in self.member_set(TWITTER_DOMAIN).await? {
            let Some(path) = twitter_account_pattern()
                .captures(&url)
                .and_then(|caps| caps.get(2))
            else {
                continue;
            };
            let account = path.as_str().split('/').next().unwrap_or_default();
            if account.is_empty() {
                continue;
            }
            let account = account.to_string();
            self.record_pair(&url, &account).await?;
            emit(events, GraphEvent::AccountLinked { url, account });
        }
        Ok(())
    }
}
