//! Backend Module
//!
//! The persistence primitive the store is layered on.
//!
//! ## Contract
//! A backend is an unordered string → string table that can:
//! - get / put / remove a record by physical key
//! - report how many records it holds
//! - name the key at an integer position in `[0, size)`
//!
//! Nothing else is assumed: no ordering, no range query, no atomicity across
//! calls. Positions are only meaningful between two writes.
//!
//! ## Implementations
//! - [`MemoryBackend`]: process-local table, used by tests and embedders
//! - [`SnapshotBackend`]: the same table persisted to a checksummed file

mod memory;
mod snapshot;
mod table;

pub use memory::MemoryBackend;
pub use snapshot::SnapshotBackend;

use crate::error::Result;

/// The capability set the store requires from persistence.
///
/// Every call completes independently with a value or an error; the store's
/// task queue guarantees it never issues two calls at once for one store.
pub trait Backend: Send + Sync {
    /// Fetch the record stored under `key`
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Create or overwrite the record stored under `key`
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Delete the record stored under `key` (no-op if absent)
    fn remove(&self, key: &str) -> Result<()>;

    /// Number of records currently held
    fn size(&self) -> Result<usize>;

    /// Physical key at `position`, or `None` if out of range
    fn key_at(&self, position: usize) -> Result<Option<String>>;
}
