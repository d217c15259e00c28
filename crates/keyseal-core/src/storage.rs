//! Key-value storage abstraction.
//!
//! The core persists only two singleton metadata records; everything else is
//! rebuilt by replaying the trustchain. The [`Storage`] trait keeps the
//! backend pluggable: [`MemoryStorage`] backs tests (clones share the same
//! records, so a clone models reopening the store after a restart) and
//! [`RedbStorage`] backs production devices.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use redb::{Database, TableDefinition};
use thiserror::Error;

/// Errors from the storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing store reported a failure.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// A table/key byte store. Mutations are durable before returning.
pub trait Storage {
    /// Read a record, `None` if absent.
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Write a record, overwriting any previous value.
    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), StorageError>;
}

/// In-memory storage for tests.
///
/// Clones share the underlying map, so `storage.clone()` models a second
/// open of the same backing store.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    records: Arc<Mutex<HashMap<(String, String), Vec<u8>>>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let records = self
            .records
            .lock()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?;
        Ok(records.get(&(table.to_owned(), key.to_owned())).cloned())
    }

    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let mut records = self
            .records
            .lock()
            .map_err(|_| StorageError::Backend("lock poisoned".into()))?;
        records.insert((table.to_owned(), key.to_owned()), value.to_vec());
        Ok(())
    }
}

/// Persistent storage backed by redb.
pub struct RedbStorage {
    db: Database,
}

impl RedbStorage {
    /// Open (or create) a database at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db = Database::create(path).map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(Self { db })
    }
}

impl Storage for RedbStorage {
    fn get(&self, table: &str, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let definition: TableDefinition<'_, &str, &[u8]> = TableDefinition::new(table);
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let table = match txn.open_table(definition) {
            Ok(table) => table,
            // A table that was never written to is an empty table.
            Err(redb::TableError::TableDoesNotExist(_)) => return Ok(None),
            Err(e) => return Err(StorageError::Backend(e.to_string())),
        };
        let value = table
            .get(key)
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(value.map(|v| v.value().to_vec()))
    }

    fn put(&self, table: &str, key: &str, value: &[u8]) -> Result<(), StorageError> {
        let definition: TableDefinition<'_, &str, &[u8]> = TableDefinition::new(table);
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            let mut table = txn
                .open_table(definition)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            table
                .insert(key, value)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        txn.commit().map_err(|e| StorageError::Backend(e.to_string()))
    }
}
