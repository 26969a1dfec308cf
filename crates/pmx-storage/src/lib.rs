use pmx_core::{CatalogEntry, NewItem, RecommendationItem};
use rusqlite::{params, Connection, Row};
use std::path::Path;
use thiserror::Error;

pub mod seed;
pub mod snapshot;

pub use seed::{seed, SeedOutcome};

pub const PRIORITY_SCHEMA_VERSION: i64 = 1;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("unsupported schema version {found}, max supported {supported}")]
    UnsupportedSchemaVersion { found: i64, supported: i64 },
}

/// Durable storage of priority matrix rows.
///
/// The only mutation of an existing row is its completion flag; rows are never deleted.
pub trait ItemStore: Send {
    /// Every row ordered by `(category, id)`.
    fn list_all(&self) -> Result<Vec<RecommendationItem>, StorageError>;

    /// Appends an unchecked row and returns its id.
    fn insert(&self, item: &NewItem) -> Result<i64, StorageError>;

    /// Returns the number of rows changed: 0 when `id` does not exist, otherwise 1.
    fn set_checked(&self, id: i64, is_checked: bool) -> Result<usize, StorageError>;

    fn count(&self) -> Result<i64, StorageError>;

    /// Inserts a full catalog with ids `1..=N` in one transaction.
    fn insert_catalog(&self, entries: &[CatalogEntry]) -> Result<usize, StorageError>;
}

pub struct SqliteItemStore {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "
    SELECT id, item_number, recommendation, pillar, effort, cost_impact, business_value,
           priority_level, category, technical_category, description, implementation_steps,
           dependencies, technical_notes, related_services, compliance_notes, is_checked
    FROM priority_items
";

impl SqliteItemStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        let store = Self { conn };
        store.migrate()?;
        Ok(store)
    }

    pub fn schema_version(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?)
    }

    pub fn migrate(&self) -> Result<(), StorageError> {
        let current = self.schema_version()?;
        if current > PRIORITY_SCHEMA_VERSION {
            return Err(StorageError::UnsupportedSchemaVersion {
                found: current,
                supported: PRIORITY_SCHEMA_VERSION,
            });
        }

        if current < 1 {
            let sql = include_str!("../migrations/0001_priority_items.sql");
            self.conn.execute_batch(sql)?;
            self.conn
                .execute("PRAGMA user_version = 1", [])
                .map(|_| ())?;
        }

        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn item(&self, id: i64) -> Result<Option<RecommendationItem>, StorageError> {
        use rusqlite::OptionalExtension;
        let sql = format!("{SELECT_COLUMNS} WHERE id = ?1");
        Ok(self.conn.query_row(&sql, [id], map_item).optional()?)
    }
}

impl ItemStore for SqliteItemStore {
    fn list_all(&self) -> Result<Vec<RecommendationItem>, StorageError> {
        let sql = format!("{SELECT_COLUMNS} ORDER BY category, id");
        let mut statement = self.conn.prepare(&sql)?;
        let rows = statement.query_map([], map_item)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert(&self, item: &NewItem) -> Result<i64, StorageError> {
        self.conn.execute(
            "
            INSERT INTO priority_items (
                item_number,
                recommendation,
                category,
                description,
                priority_level,
                is_checked
            ) VALUES (
                (SELECT COALESCE(MAX(item_number), 0) + 1 FROM priority_items),
                ?1, ?2, ?3, ?4, 0
            )
            ",
            params![
                item.item_text,
                item.category,
                item.description,
                item.priority_level,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn set_checked(&self, id: i64, is_checked: bool) -> Result<usize, StorageError> {
        let changes = self.conn.execute(
            "UPDATE priority_items SET is_checked = ?1 WHERE id = ?2",
            params![i64::from(is_checked), id],
        )?;
        Ok(changes)
    }

    fn count(&self) -> Result<i64, StorageError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM priority_items", [], |row| row.get(0))?)
    }

    fn insert_catalog(&self, entries: &[CatalogEntry]) -> Result<usize, StorageError> {
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut statement = tx.prepare(
                "
                INSERT INTO priority_items (
                    id,
                    item_number,
                    recommendation,
                    pillar,
                    effort,
                    cost_impact,
                    business_value,
                    priority_level,
                    category,
                    technical_category,
                    description,
                    implementation_steps,
                    dependencies,
                    technical_notes,
                    related_services,
                    compliance_notes,
                    is_checked
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, 0)
                ",
            )?;
            for (index, entry) in entries.iter().enumerate() {
                statement.execute(params![
                    index as i64 + 1,
                    entry.item_number,
                    entry.recommendation,
                    entry.pillar,
                    entry.effort,
                    entry.cost_impact,
                    entry.business_value,
                    entry.priority_level,
                    entry.category,
                    entry.technical_category,
                    entry.description,
                    entry.implementation_steps,
                    entry.dependencies,
                    entry.technical_notes,
                    entry.related_services,
                    entry.compliance_notes,
                ])?;
            }
        }
        tx.commit()?;
        Ok(entries.len())
    }
}

fn map_item(row: &Row<'_>) -> rusqlite::Result<RecommendationItem> {
    let flag: i64 = row.get(16)?;
    Ok(RecommendationItem {
        id: row.get(0)?,
        item_number: row.get(1)?,
        recommendation: row.get(2)?,
        pillar: row.get(3)?,
        effort: row.get(4)?,
        cost_impact: row.get(5)?,
        business_value: row.get(6)?,
        priority_level: row.get(7)?,
        category: row.get(8)?,
        technical_category: row.get(9)?,
        description: row.get(10)?,
        implementation_steps: row.get(11)?,
        dependencies: row.get(12)?,
        technical_notes: row.get(13)?,
        related_services: row.get(14)?,
        compliance_notes: row.get(15)?,
        is_checked: flag != 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn new_item(category: &str, text: &str) -> NewItem {
        NewItem {
            category: category.to_string(),
            item_text: text.to_string(),
            description: Some("Z".to_string()),
            priority_level: "Low".to_string(),
        }
    }

    #[test]
    fn migrate_creates_schema() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        let tables: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'priority_items'",
                [],
                |row| row.get(0),
            )
            .expect("table check");
        assert_eq!(tables, 1);
        assert_eq!(
            db.schema_version().expect("schema version"),
            PRIORITY_SCHEMA_VERSION
        );
        assert_eq!(db.count().expect("count"), 0);
    }

    #[test]
    fn open_rejects_newer_schema() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("future.db");
        {
            let conn = Connection::open(&path).expect("open raw");
            conn.execute("PRAGMA user_version = 9", []).expect("bump");
        }
        match SqliteItemStore::open(&path) {
            Err(StorageError::UnsupportedSchemaVersion { found, supported }) => {
                assert_eq!(found, 9);
                assert_eq!(supported, PRIORITY_SCHEMA_VERSION);
            }
            other => panic!("expected schema error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn open_creates_missing_parent_directory() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("nested/db/cjn-dakota.db");
        let db = SqliteItemStore::open(&path).expect("open db");
        db.insert(&new_item("X", "Y")).expect("insert");
        drop(db);

        let reopened = SqliteItemStore::open(&path).expect("reopen");
        assert_eq!(reopened.count().expect("count"), 1);
    }

    #[test]
    fn insert_defaults_unsupplied_fields() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        let first = db.insert(&new_item("X", "Y")).expect("insert");
        let second = db.insert(&NewItem::default()).expect("insert empty");
        assert_ne!(first, second);

        let item = db.item(first).expect("query").expect("present");
        assert_eq!(item.recommendation, "Y");
        assert_eq!(item.category, "X");
        assert_eq!(item.description.as_deref(), Some("Z"));
        assert_eq!(item.priority_level, "Low");
        assert_eq!(item.pillar, "");
        assert_eq!(item.implementation_steps, None);
        assert_eq!(item.item_number, 1);
        assert!(!item.is_checked);

        let empty = db.item(second).expect("query").expect("present");
        assert_eq!(empty.item_number, 2);
        assert_eq!(empty.description, None);
    }

    #[test]
    fn list_all_orders_by_category_then_id() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        for (category, text) in [("B", "b1"), ("A", "a1"), ("B", "b2"), ("A", "a2"), ("C", "c1")] {
            db.insert(&new_item(category, text)).expect("insert");
        }

        let items = db.list_all().expect("list");
        let order: Vec<&str> = items.iter().map(|i| i.recommendation.as_str()).collect();
        assert_eq!(order, vec!["a1", "a2", "b1", "b2", "c1"]);
        for pair in items.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            assert!(a.category < b.category || (a.category == b.category && a.id < b.id));
        }
    }

    #[test]
    fn set_checked_reports_changes_and_round_trips() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        let id = db.insert(&new_item("X", "Y")).expect("insert");

        assert_eq!(db.set_checked(id, true).expect("check"), 1);
        assert!(db.item(id).expect("query").expect("present").is_checked);
        assert_eq!(db.set_checked(id, false).expect("uncheck"), 1);
        assert!(!db.item(id).expect("query").expect("present").is_checked);
    }

    #[test]
    fn set_checked_on_missing_id_changes_nothing() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        db.insert(&new_item("X", "Y")).expect("insert");
        let before = db.list_all().expect("list");

        assert_eq!(db.set_checked(999, true).expect("update"), 0);
        assert_eq!(db.list_all().expect("list"), before);
    }

    #[test]
    fn check_constraint_rejects_out_of_range_flags() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        let id = db.insert(&new_item("X", "Y")).expect("insert");
        let err = db
            .conn
            .execute(
                "UPDATE priority_items SET is_checked = 2 WHERE id = ?1",
                [id],
            )
            .expect_err("constraint");
        assert!(err.to_string().contains("CHECK"));
    }

    #[test]
    fn insert_catalog_is_all_or_nothing() {
        let db = SqliteItemStore::open_in_memory().expect("open db");
        let catalog = seed::catalog().expect("catalog");
        db.insert(&new_item("X", "occupies id 1")).expect("insert");

        assert!(db.insert_catalog(&catalog).is_err());
        assert_eq!(db.count().expect("count"), 1);
    }
}
