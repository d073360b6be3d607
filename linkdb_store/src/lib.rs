#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

//! Persistent link store on top of sea-orm.

use async_trait::async_trait;
use linkdb_core::store::compile_pattern;
use linkdb_core::{KeyType, Store, StoreError};
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, ConnectionTrait, Database, DatabaseBackend, DatabaseConnection, EntityTrait,
    QueryFilter, QuerySelect, Schema, Set, TryInsertResult,
};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

pub mod entity;

use entity::link_entries::{self, KIND_SCALAR, KIND_SET};

fn wrong_type(key: &str) -> anyhow::Error {
    StoreError::WrongType {
        key: key.to_string(),
    }
    .into()
}

/// Database file named by a SQLite URL. `None` for other backends and for
/// in-memory databases.
fn sqlite_file(database_url: &str) -> Option<PathBuf> {
    let rest = database_url
        .strip_prefix("sqlite://")
        .or_else(|| database_url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next().unwrap_or_default();
    if path.is_empty() || path.starts_with(":memory:") {
        return None;
    }
    Some(PathBuf::from(path))
}

/// Store backed by any database sea-orm can reach by URL.
pub struct SqlStore {
    db: DatabaseConnection,
}

impl SqlStore {
    /// Connect and create the entries table when it is missing.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        info!("Connecting to link store");
        if let Some(dir) = sqlite_file(database_url)
            .as_deref()
            .and_then(Path::parent)
            .filter(|dir| !dir.as_os_str().is_empty())
        {
            std::fs::create_dir_all(dir)?;
            debug!("Ensured database directory {} exists", dir.display());
        }
        let db = Database::connect(database_url).await?;

        let backend = db.get_database_backend();
        if backend == DatabaseBackend::MySql {
            warn!("MySQL limits keys and members to 255 characters; longer URLs are rejected");
        }
        let schema = Schema::new(backend);
        let mut stmt = schema.create_table_from_entity(link_entries::Entity);
        stmt.if_not_exists();
        db.execute_unprepared(&backend.build(&stmt).to_string())
            .await?;
        debug!("Ensured table link_entries exists");

        info!("Link store initialized");
        Ok(Self { db })
    }

    #[must_use]
    pub const fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    async fn rows(&self, key: &str) -> anyhow::Result<Vec<link_entries::Model>> {
        Ok(link_entries::Entity::find()
            .filter(link_entries::Column::Key.eq(key))
            .all(&self.db)
            .await?)
    }
}

#[async_trait]
impl Store for SqlStore {
    async fn exists(&self, key: &str) -> anyhow::Result<bool> {
        Ok(self.key_type(key).await? != KeyType::Absent)
    }

    async fn key_type(&self, key: &str) -> anyhow::Result<KeyType> {
        let row = link_entries::Entity::find()
            .filter(link_entries::Column::Key.eq(key))
            .one(&self.db)
            .await?;
        Ok(match row {
            None => KeyType::Absent,
            Some(row) if row.kind == KIND_SCALAR => KeyType::Scalar,
            Some(_) => KeyType::Set,
        })
    }

    async fn get_scalar(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row = link_entries::Entity::find()
            .filter(link_entries::Column::Key.eq(key))
            .filter(link_entries::Column::Kind.eq(KIND_SCALAR))
            .one(&self.db)
            .await?;
        Ok(row.map(|row| row.member))
    }

    async fn get_set(&self, key: &str) -> anyhow::Result<BTreeSet<String>> {
        let rows = self.rows(key).await?;
        if rows.iter().any(|row| row.kind == KIND_SCALAR) {
            return Err(wrong_type(key));
        }
        Ok(rows.into_iter().map(|row| row.member).collect())
    }

    async fn add_member(&self, key: &str, member: &str) -> anyhow::Result<()> {
        if self.key_type(key).await? == KeyType::Scalar {
            return Err(wrong_type(key));
        }
        let row = link_entries::ActiveModel {
            key: Set(key.to_string()),
            member: Set(member.to_string()),
            kind: Set(KIND_SET.to_string()),
        };
        let result = link_entries::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([link_entries::Column::Key, link_entries::Column::Member])
                    .do_nothing()
                    .to_owned(),
            )
            .do_nothing()
            .exec_without_returning(&self.db)
            .await?;
        if matches!(result, TryInsertResult::Conflicted) {
            debug!("{member} already in {key}");
        }
        Ok(())
    }

    async fn remove_member(&self, key: &str, member: &str) -> anyhow::Result<()> {
        if self.key_type(key).await? == KeyType::Scalar {
            return Err(wrong_type(key));
        }
        link_entries::Entity::delete_many()
            .filter(link_entries::Column::Key.eq(key))
            .filter(link_entries::Column::Member.eq(member))
            .exec(&self.db)
            .await?;
        Ok(())
    }

    async fn delete_key(&self, key: &str) -> anyhow::Result<()> {
        let result = link_entries::Entity::delete_many()
            .filter(link_entries::Column::Key.eq(key))
            .exec(&self.db)
            .await?;
        debug!("Deleted {} rows of {key}", result.rows_affected);
        Ok(())
    }

    async fn list_keys(&self, pattern: &str) -> anyhow::Result<Vec<String>> {
        let pattern = compile_pattern(pattern)?;
        let keys: Vec<String> = link_entries::Entity::find()
            .select_only()
            .column(link_entries::Column::Key)
            .distinct()
            .into_tuple()
            .all(&self.db)
            .await?;
        let mut keys: Vec<String> = keys
            .into_iter()
            .filter(|key| pattern.matches(key))
            .collect();
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sqlite_file_from_url() {
        assert_eq!(
            sqlite_file("sqlite:///home/u/linkdb/links.db?mode=rwc"),
            Some(PathBuf::from("/home/u/linkdb/links.db"))
        );
        assert_eq!(
            sqlite_file("sqlite:links.db"),
            Some(PathBuf::from("links.db"))
        );
        assert_eq!(sqlite_file("sqlite::memory:"), None);
        assert_eq!(sqlite_file("postgres://localhost/links"), None);
    }
}
