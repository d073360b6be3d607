//! Storage contract for the association graph.
//!
//! A key maps either to a set of unique members or, for legacy entries, to a
//! single scalar string. Implementations must persist every write immediately.

use async_trait::async_trait;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use tokio::sync::RwLock;

/// Shape of the value stored under a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Scalar,
    Set,
    Absent,
}

/// A value read back from the store.
///
/// Serializes untagged: a scalar becomes a JSON string, a set becomes a
/// sorted array.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum StoredValue {
    Scalar(String),
    Set(BTreeSet<String>),
}

impl StoredValue {
    #[must_use]
    pub const fn key_type(&self) -> KeyType {
        match self {
            Self::Scalar(_) => KeyType::Scalar,
            Self::Set(_) => KeyType::Set,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key {key:?} holds a scalar value, not a set")]
    WrongType { key: String },

    #[error("invalid key pattern {pattern:?}: {reason}")]
    InvalidPattern { pattern: String, reason: String },
}

/// Rewrite a key pattern into `glob` syntax.
///
/// Key patterns are not paths: a run of `*` is a single wildcard and `[^...]`
/// negates a class, written `[!...]` by `glob`.
fn key_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    let mut chars = pattern.chars().peekable();
    while let Some(c) = chars.next() {
        glob.push(c);
        match c {
            '*' => {
                while chars.next_if_eq(&'*').is_some() {}
            }
            '[' => {
                if chars.next_if_eq(&'^').is_some() {
                    glob.push('!');
                }
            }
            _ => {}
        }
    }
    glob
}

/// Compile a key pattern (`*`, `?`, `[...]`, `[^...]`).
pub fn compile_pattern(pattern: &str) -> Result<glob::Pattern, StoreError> {
    glob::Pattern::new(&key_glob(pattern)).map_err(|e| StoreError::InvalidPattern {
        pattern: pattern.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn exists(&self, key: &str) -> anyhow::Result<bool>;

    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType>;

    async fn get_scalar(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Members of a set entry. Empty when the key is absent.
    async fn get_set(&self, key: &str) -> anyhow::Result<BTreeSet<String>>;

    /// Idempotent insert. An absent key becomes a set.
    async fn add_member(&self, key: &str, member: &str) -> anyhow::Result<()>;

    /// Removing the last member removes the key.
    async fn remove_member(&self, key: &str, member: &str) -> anyhow::Result<()>;

    async fn delete_key(&self, key: &str) -> anyhow::Result<()>;

    /// Keys matching a glob pattern, sorted.
    async fn list_keys(&self, pattern: &str) -> anyhow::Result<Vec<String>>;

    async fn read(&self, key: &str) -> anyhow::Result<Option<StoredValue>> {
        Ok(match self.key_type(key).await? {
            KeyType::Absent => None,
            KeyType::Scalar => self.get_scalar(key).await?.map(StoredValue::Scalar),
            KeyType::Set => Some(StoredValue::Set(self.get_set(key).await?)),
        })
    }
}

/// In-process store, used for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, StoredValue>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a legacy scalar entry, replacing whatever the key held.
    pub async fn insert_scalar(&self, key: &str, value: &str) {
        self.entries
            .write()
            .await
            .insert(key.to_string(), StoredValue::Scalar(value.to_string()));
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.entries.read().await.contains_key(key))
    }

    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType> {
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .map_or(KeyType::Absent, StoredValue::key_type))
    }

    async fn get_scalar(&self, key: &str) -> anyhow::Result<Option<String>> {
        Ok(match self.entries.read().await.get(key) {
            Some(StoredValue::Scalar(value)) => Some(value.clone()),
            _ => None,
        })
    }

    async fn get_set(&self, key: &str) -> anyhow::Result<BTreeSet<String>> {
        match self.entries.read().await.get(key) {
            None => Ok(BTreeSet::new()),
            Some(StoredValue::Set(members)) => Ok(members.clone()),
            Some(StoredValue::Scalar(_)) => Err(StoreError::WrongType {
                key: key.to_string(),
            }
            .into()),
        }
    }

    async fn add_member(&self, key: &str, member: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| StoredValue::Set(BTreeSet::new()));
        match entry {
            StoredValue::Set(members) => {
                members.insert(member.to_string());
                Ok(())
            }
            StoredValue::Scalar(_) => Err(StoreError::WrongType {
                key: key.to_string(),
            }
            .into()),
        }
    }

    async fn remove_member(&self, key: &str, member: &str) -> anyhow::Result<()> {
        let mut entries = self.entries.write().await;
        let emptied = match entries.get_mut(key) {
            None => false,
            Some(StoredValue::Set(members)) => {
                members.remove(member);
                members.is_empty()
            }
            Some(StoredValue::Scalar(_)) => {
                return Err(StoreError::WrongType {
                    key: key.to_string(),
                }
                .into());
            }
        };
        if emptied {
            entries.remove(key);
        }
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> anyhow::Result<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn list_keys(&self, pattern: &str) -> anyhow::Result<Vec<String>> {
        let pattern = compile_pattern(pattern)?;
        Ok(self
            .entries
            .read()
            .await
            .keys()
            .filter(|key| pattern.matches(key))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_add_member_creates_set() {
        let store = MemoryStore::new();
        assert_eq!(store.key_type("tag").await.unwrap(), KeyType::Absent);

        store.add_member("tag", "a").await.unwrap();
        store.add_member("tag", "a").await.unwrap();

        assert_eq!(store.key_type("tag").await.unwrap(), KeyType::Set);
        assert_eq!(store.get_set("tag").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_removing_last_member_removes_key() {
        let store = MemoryStore::new();
        store.add_member("tag", "a").await.unwrap();
        store.remove_member("tag", "a").await.unwrap();

        assert!(!store.exists("tag").await.unwrap());
    }

    #[tokio::test]
    async fn test_scalar_rejects_set_operations() {
        let store = MemoryStore::new();
        store.insert_scalar("legacy", "value").await;

        let err = store.add_member("legacy", "a").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::WrongType { .. })
        ));
        assert!(store.get_set("legacy").await.is_err());
        assert_eq!(
            store.read("legacy").await.unwrap(),
            Some(StoredValue::Scalar("value".to_string()))
        );
    }

    #[tokio::test]
    async fn test_list_keys_glob() {
        let store = MemoryStore::new();
        for key in ["http://a.com/1", "http://b.com/2", "tag"] {
            store.add_member(key, "x").await.unwrap();
        }

        assert_eq!(
            store.list_keys("http://*").await.unwrap(),
            vec!["http://a.com/1", "http://b.com/2"]
        );
        assert_eq!(store.list_keys("ta?").await.unwrap(), vec!["tag"]);
        assert!(store.list_keys("nothing*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_keys_repeated_star_is_one_wildcard() {
        let store = MemoryStore::new();
        for key in ["foo", "http://a.io/x/y", "bar"] {
            store.add_member(key, "x").await.unwrap();
        }

        assert_eq!(store.list_keys("fo**").await.unwrap(), vec!["foo"]);
        assert_eq!(
            store.list_keys("http://**").await.unwrap(),
            vec!["http://a.io/x/y"]
        );
        assert_eq!(store.list_keys("***").await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_list_keys_caret_negates_class() {
        let store = MemoryStore::new();
        for key in ["a", "x", "^"] {
            store.add_member(key, "m").await.unwrap();
        }

        assert_eq!(store.list_keys("[^x]").await.unwrap(), vec!["^", "a"]);
        assert_eq!(store.list_keys("[!x]").await.unwrap(), vec!["^", "a"]);
    }

    #[test]
    fn test_key_glob_rewrites() {
        assert_eq!(key_glob("tag**"), "tag*");
        assert_eq!(key_glob("[^ab]*"), "[!ab]*");
        assert_eq!(key_glob("a^b"), "a^b");
    }

    #[tokio::test]
    async fn test_list_keys_invalid_pattern() {
        let store = MemoryStore::new();
        let err = store.list_keys("[oops").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StoreError>(),
            Some(StoreError::InvalidPattern { .. })
        ));
    }
}
