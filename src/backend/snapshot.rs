//! Snapshot backend
//!
//! A record table persisted as one checksummed file.
//!
//! ## File Format
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │ Header (14 bytes)                                       │
//! │   Magic: "LXKV" (4) | Version: u16 (2) | Count: u64 (8) │
//! ├─────────────────────────────────────────────────────────┤
//! │ Body (variable)                                         │
//! │   bincode-encoded [Record { key, value }, ...]          │
//! ├─────────────────────────────────────────────────────────┤
//! │ Footer (4 bytes)                                        │
//! │   BodyCRC: u32                                          │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The whole table is rewritten to `{file}.tmp` and renamed over the old
//! snapshot, so a crash leaves either the previous or the new snapshot.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use parking_lot::RwLock;

use crate::config::{Config, SyncStrategy};
use crate::error::{LexiError, Result};

use super::table::{Record, RecordTable};
use super::Backend;

/// Magic bytes identifying a lexikv snapshot file
const MAGIC: &[u8; 4] = b"LXKV";

/// Current snapshot format version
const VERSION: u16 = 1;

/// Header size: Magic (4) + Version (2) + RecordCount (8) = 14 bytes
const HEADER_SIZE: usize = 14;

/// Footer size: BodyCRC (4)
const FOOTER_SIZE: usize = 4;

/// File-persisted backend
pub struct SnapshotBackend {
    path: PathBuf,
    sync_strategy: SyncStrategy,
    state: RwLock<SnapshotState>,
}

struct SnapshotState {
    table: RecordTable,
    /// Writes applied since the last successful persist
    unsynced: usize,
}

impl SnapshotBackend {
    /// Open or create a snapshot at `path`
    pub fn open(path: impl AsRef<Path>, sync_strategy: SyncStrategy) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let table = if path.exists() {
            Self::read_snapshot(&path)?
        } else {
            let table = RecordTable::new();
            Self::write_snapshot(&path, &table)?;
            table
        };

        tracing::debug!(
            path = %path.display(),
            records = table.len(),
            "snapshot backend opened"
        );

        Ok(Self {
            path,
            sync_strategy,
            state: RwLock::new(SnapshotState { table, unsynced: 0 }),
        })
    }

    /// Open the snapshot described by a store config
    pub fn open_config(config: &Config) -> Result<Self> {
        Self::open(config.snapshot_path(), config.sync_strategy)
    }

    /// Persist any unsynced writes now
    pub fn flush(&self) -> Result<()> {
        let mut state = self.state.write();
        if state.unsynced > 0 {
            Self::write_snapshot(&self.path, &state.table)?;
            state.unsynced = 0;
        }
        Ok(())
    }

    /// Path of the snapshot file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes not yet persisted
    pub fn unsynced_writes(&self) -> usize {
        self.state.read().unsynced
    }

    // =========================================================================
    // Private Helpers
    // =========================================================================

    /// Count one applied write and persist if the strategy says so
    fn record_write(&self, state: &mut SnapshotState) -> Result<()> {
        state.unsynced += 1;
        let due = match self.sync_strategy {
            SyncStrategy::EveryWrite => true,
            SyncStrategy::EveryNWrites { count } => state.unsynced >= count,
        };
        if due {
            Self::write_snapshot(&self.path, &state.table)?;
            state.unsynced = 0;
        }
        Ok(())
    }

    fn write_snapshot(path: &Path, table: &RecordTable) -> Result<()> {
        let body = bincode::serialize(table.records())?;
        let crc = crc32fast::hash(&body);

        let tmp_path = path.with_extension("snap.tmp");
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&VERSION.to_le_bytes())?;
        writer.write_all(&(table.len() as u64).to_le_bytes())?;
        writer.write_all(&body)?;
        writer.write_all(&crc.to_le_bytes())?;
        writer.flush()?;

        let file = writer
            .into_inner()
            .map_err(|e| LexiError::backend(e.into_error()))?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)?;
        Ok(())
    }

    fn read_snapshot(path: &Path) -> Result<RecordTable> {
        let bytes = fs::read(path)?;
        if bytes.len() < HEADER_SIZE + FOOTER_SIZE {
            return Err(LexiError::Corruption(format!(
                "snapshot too short: {} bytes",
                bytes.len()
            )));
        }

        if &bytes[0..4] != MAGIC {
            return Err(LexiError::Corruption(format!(
                "invalid snapshot magic: expected LXKV, got {:?}",
                &bytes[0..4]
            )));
        }

        let version = u16::from_le_bytes([bytes[4], bytes[5]]);
        if version != VERSION {
            return Err(LexiError::Corruption(format!(
                "unsupported snapshot version: {}",
                version
            )));
        }

        let mut count_bytes = [0u8; 8];
        count_bytes.copy_from_slice(&bytes[6..HEADER_SIZE]);
        let record_count = u64::from_le_bytes(count_bytes);

        let body_end = bytes.len() - FOOTER_SIZE;
        let body = &bytes[HEADER_SIZE..body_end];

        let mut crc_bytes = [0u8; 4];
        crc_bytes.copy_from_slice(&bytes[body_end..]);
        let stored_crc = u32::from_le_bytes(crc_bytes);
        let computed_crc = crc32fast::hash(body);
        if stored_crc != computed_crc {
            return Err(LexiError::Corruption(format!(
                "snapshot CRC mismatch: stored {:08x}, computed {:08x}",
                stored_crc, computed_crc
            )));
        }

        let records: Vec<Record> = bincode::deserialize(body)
            .map_err(|e| LexiError::Corruption(format!("undecodable snapshot body: {}", e)))?;
        if records.len() as u64 != record_count {
            return Err(LexiError::Corruption(format!(
                "snapshot header claims {} records, body holds {}",
                record_count,
                records.len()
            )));
        }

        Ok(RecordTable::from_records(records))
    }
}

impl Backend for SnapshotBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.state.read().table.get(key).map(str::to_owned))
    }

    fn put(&self, key: &str, value: &str) -> Result<()> {
        let mut state = self.state.write();
        state.table.put(key.to_owned(), value.to_owned());
        self.record_write(&mut state)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut state = self.state.write();
        if state.table.remove(key) {
            self.record_write(&mut state)?;
        }
        Ok(())
    }

    fn size(&self) -> Result<usize> {
        Ok(self.state.read().table.len())
    }

    fn key_at(&self, position: usize) -> Result<Option<String>> {
        Ok(self.state.read().table.key_at(position).map(str::to_owned))
    }
}

impl Drop for SnapshotBackend {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!(path = %self.path.display(), "failed to persist snapshot on drop: {}", e);
        }
    }
}
