//! Record table
//!
//! Unordered key → value storage with positional enumeration. Removal swaps
//! the last record into the freed slot, so positions move the way they do in
//! a browser-style key/value store.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// One physical record as it appears in a snapshot body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Record {
    pub(crate) key: String,
    pub(crate) value: String,
}

#[derive(Debug, Default)]
pub(crate) struct RecordTable {
    /// Physical key → slot in `records`
    slots: HashMap<String, usize>,
    records: Vec<Record>,
}

impl RecordTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Rebuild a table from a persisted record list (later duplicates win)
    pub(crate) fn from_records(records: Vec<Record>) -> Self {
        let mut table = Self::new();
        for Record { key, value } in records {
            table.put(key, value);
        }
        table
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.slots.get(key).map(|&slot| self.records[slot].value.as_str())
    }

    pub(crate) fn put(&mut self, key: String, value: String) {
        match self.slots.get(&key) {
            Some(&slot) => self.records[slot].value = value,
            None => {
                self.slots.insert(key.clone(), self.records.len());
                self.records.push(Record { key, value });
            }
        }
    }

    /// Returns true if a record was removed
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let Some(slot) = self.slots.remove(key) else {
            return false;
        };
        self.records.swap_remove(slot);
        if let Some(moved) = self.records.get(slot) {
            self.slots.insert(moved.key.clone(), slot);
        }
        true
    }

    pub(crate) fn len(&self) -> usize {
        self.records.len()
    }

    pub(crate) fn key_at(&self, position: usize) -> Option<&str> {
        self.records.get(position).map(|record| record.key.as_str())
    }

    pub(crate) fn records(&self) -> &[Record] {
        &self.records
    }
}
