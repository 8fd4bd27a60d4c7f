//! In-memory backend

use parking_lot::RwLock;

use crate::error::Result;

use super::table::RecordTable;
use super::Backend;

/// Process-local backend.
///
/// Records live only as long as the value. Share one instance between stores
/// (behind an `Arc`) to exercise namespacing.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    table: RwLock<RecordTable>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held, across every namespace
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Backend for MemoryBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.table.read().get(key).map(str::to_owned))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        self.table.write().put(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.table.write().remove(key);
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(self.table.read().len())
    }

    fn key_at(&self, position: usize) -> Result<Option<String>> {
        Ok(self.table.read().key_at(position).map(str::to_owned))
    }
}
