//! Integration tests for the SQL-backed store.
//!
//! These tests verify that:
//! - `SqlStore` honours the `Store` contract on a SQLite file
//! - legacy scalar rows are read but never treated as sets
//! - the association engine works unchanged on top of it

use linkdb_core::{GraphEvent, KeyType, LinkGraph, Store, StoreError, StoredValue};
use linkdb_store::SqlStore;
use linkdb_store::entity::link_entries;
use sea_orm::{ActiveModelTrait, Set};
use std::path::PathBuf;
use std::sync::Arc;

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path =
            std::env::temp_dir().join(format!("linkdb_store_{}.db", uuid::Uuid::now_v7()));
        Self { path }
    }

    fn url(&self) -> String {
        format!("sqlite://{}?mode=rwc", self.path.display())
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[tokio::test]
async fn test_set_membership_roundtrip() {
    let db = TempDb::new();
    let store = SqlStore::connect(&db.url()).await.unwrap();

    assert_eq!(store.key_type("tag").await.unwrap(), KeyType::Absent);
    store.add_member("tag", "b").await.unwrap();
    store.add_member("tag", "a").await.unwrap();
    store.add_member("tag", "a").await.unwrap();

    assert!(store.exists("tag").await.unwrap());
    assert_eq!(store.key_type("tag").await.unwrap(), KeyType::Set);
    assert_eq!(
        store.get_set("tag").await.unwrap().into_iter().collect::<Vec<_>>(),
        vec!["a", "b"]
    );

    store.remove_member("tag", "a").await.unwrap();
    store.remove_member("tag", "b").await.unwrap();
    assert!(!store.exists("tag").await.unwrap());
    assert!(store.get_set("tag").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_connect_creates_missing_directory() {
    let dir = std::env::temp_dir().join(format!("linkdb_store_{}", uuid::Uuid::now_v7()));
    let url = format!(
        "sqlite://{}?mode=rwc",
        dir.join("nested").join("links.db").display()
    );

    let result = SqlStore::connect(&url).await;
    let roundtrip = match &result {
        Ok(store) => {
            store.add_member("tag", "a").await.unwrap();
            store.get_set("tag").await.unwrap()
        }
        Err(_) => Default::default(),
    };
    drop(result);
    let _ = std::fs::remove_dir_all(&dir);

    assert!(roundtrip.contains("a"));
}

#[tokio::test]
async fn test_concurrent_add_member_is_idempotent() {
    let db = TempDb::new();
    let store = SqlStore::connect(&db.url()).await.unwrap();

    let (first, second) = tokio::join!(
        store.add_member("tag", "a"),
        store.add_member("tag", "a")
    );
    first.unwrap();
    second.unwrap();
    store.add_member("tag", "a").await.unwrap();

    assert_eq!(store.get_set("tag").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_long_url_keys() {
    let db = TempDb::new();
    let store = SqlStore::connect(&db.url()).await.unwrap();
    let url = format!("https://example.com/{}", "p".repeat(2000));

    store.add_member(&url, "tag").await.unwrap();

    assert!(store.get_set(&url).await.unwrap().contains("tag"));
    assert_eq!(store.list_keys("https://*").await.unwrap(), vec![url]);
}

#[tokio::test]
async fn test_reconnect_keeps_data() {
    let db = TempDb::new();
    {
        let store = SqlStore::connect(&db.url()).await.unwrap();
        store.add_member("tag", "a").await.unwrap();
    }

    let store = SqlStore::connect(&db.url()).await.unwrap();
    assert!(store.get_set("tag").await.unwrap().contains("a"));
}

#[tokio::test]
async fn test_list_keys_and_delete() {
    let db = TempDb::new();
    let store = SqlStore::connect(&db.url()).await.unwrap();
    for key in ["https://b.io/1", "https://a.io/2", "tag"] {
        store.add_member(key, "x").await.unwrap();
    }
    store.add_member("tag", "y").await.unwrap();

    assert_eq!(
        store.list_keys("https://*").await.unwrap(),
        vec!["https://a.io/2", "https://b.io/1"]
    );
    assert_eq!(store.list_keys("*").await.unwrap().len(), 3);

    store.delete_key("tag").await.unwrap();
    store.delete_key("tag").await.unwrap();
    assert!(store.list_keys("t*").await.unwrap().is_empty());
    assert!(store.list_keys("[bad").await.is_err());
}

#[tokio::test]
async fn test_scalar_rows_are_read_only() {
    let db = TempDb::new();
    let store = SqlStore::connect(&db.url()).await.unwrap();
    link_entries::ActiveModel {
        key: Set("legacy".to_string()),
        member: Set("value".to_string()),
        kind: Set(link_entries::KIND_SCALAR.to_string()),
    }
    .insert(store.db())
    .await
    .unwrap();

    assert_eq!(store.key_type("legacy").await.unwrap(), KeyType::Scalar);
    assert_eq!(
        store.read("legacy").await.unwrap(),
        Some(StoredValue::Scalar("value".to_string()))
    );
    let err = store.add_member("legacy", "a").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<StoreError>(),
        Some(StoreError::WrongType { .. })
    ));
}

#[tokio::test]
async fn test_graph_over_sql_store() {
    let db = TempDb::new();
    let store = Arc::new(SqlStore::connect(&db.url()).await.unwrap());
    let graph = LinkGraph::new(store.clone());

    graph.record_pair("http://twitter.com/u", "X").await.unwrap();
    graph.set_values("tag", &["a", "b"]).await.unwrap();
    store.add_member("c", "d").await.unwrap();

    let events = graph.normalize().await.unwrap();
    assert!(events.contains(&GraphEvent::Restored {
        key: "c".to_string(),
        member: "d".to_string()
    }));
    assert!(!store.exists("http://twitter.com/u").await.unwrap());
    assert_eq!(
        graph.members("https://twitter.com/u").await.unwrap(),
        vec!["X"]
    );

    graph.delete(&["tag"]).await.unwrap();
    assert!(!store.exists("a").await.unwrap());
    assert!(graph.intersect(&["tag"]).await.unwrap().is_empty());
}
