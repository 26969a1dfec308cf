//! Static snapshot of the catalog consumed by the client view in snapshot mode.

use crate::seed::catalog;
use crate::StorageError;
use pmx_core::RecommendationItem;
use std::path::Path;

/// Default location of the generated snapshot, relative to the site root.
pub const DEFAULT_SNAPSHOT_PATH: &str = "public/priority-items.json";

/// The catalog as full records: ids `1..=N`, nothing checked.
pub fn catalog_snapshot() -> Result<Vec<RecommendationItem>, StorageError> {
    Ok(catalog()?
        .into_iter()
        .enumerate()
        .map(|(index, entry)| entry.into_item(index as i64 + 1))
        .collect())
}

pub fn snapshot_json() -> Result<String, StorageError> {
    serde_json::to_string_pretty(&catalog_snapshot()?)
        .map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Writes the snapshot to `path`, creating parent directories. Returns the item count.
pub fn write_snapshot(path: impl AsRef<Path>) -> Result<usize, StorageError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let items = catalog_snapshot()?;
    let json = serde_json::to_string_pretty(&items)
        .map_err(|err| StorageError::Serialization(err.to_string()))?;
    std::fs::write(path, json)?;
    Ok(items.len())
}

pub fn read_snapshot(path: impl AsRef<Path>) -> Result<Vec<RecommendationItem>, StorageError> {
    let raw = std::fs::read_to_string(path)?;
    serde_json::from_str(&raw).map_err(|err| StorageError::Serialization(err.to_string()))
}
