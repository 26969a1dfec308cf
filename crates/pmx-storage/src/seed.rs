//! Canonical recommendation catalog and the idempotent seed step.

use crate::{ItemStore, StorageError};
use pmx_core::CatalogEntry;

const CATALOG_JSON: &str = include_str!("../seed/catalog.json");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Seeded { inserted: usize },
    Skipped { existing: i64 },
}

/// The embedded catalog, in seed order. Entry `n` (0-based) becomes id `n + 1`.
pub fn catalog() -> Result<Vec<CatalogEntry>, StorageError> {
    serde_json::from_str(CATALOG_JSON).map_err(|err| StorageError::Serialization(err.to_string()))
}

/// Populates an empty store with the catalog. A store that already has rows is left alone.
pub fn seed(store: &dyn ItemStore) -> Result<SeedOutcome, StorageError> {
    let existing = store.count()?;
    if existing > 0 {
        return Ok(SeedOutcome::Skipped { existing });
    }
    let entries = catalog()?;
    let inserted = store.insert_catalog(&entries)?;
    Ok(SeedOutcome::Seeded { inserted })
}
