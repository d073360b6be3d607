//! Whole-store export.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

use crate::store::{Store, StoredValue};

pub const DEFAULT_BACKUP_FILE: &str = "backup.json";

/// Every key of the store with its value, ordered by key.
pub type BackupDocument = BTreeMap<String, StoredValue>;

/// Read every key through its type-appropriate accessor.
pub async fn snapshot(store: &dyn Store) -> anyhow::Result<BackupDocument> {
    let mut document = BackupDocument::new();
    for key in store.list_keys("*").await? {
        if let Some(value) = store.read(&key).await? {
            document.insert(key, value);
        }
    }
    Ok(document)
}

/// Serialize a document as indented JSON with non-ASCII text kept as is.
pub fn write_json(document: &BackupDocument, path: &Path) -> anyhow::Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, document)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Snapshot the store into a JSON file, returning the number of keys written.
pub async fn export(store: &dyn Store, path: &Path) -> anyhow::Result<usize> {
    let document = snapshot(store).await?;
    write_json(&document, path)?;
    info!("Backed up {} keys to {}", document.len(), path.display());
    Ok(document.len())
}
