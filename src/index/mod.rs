//! Sorted Key Index Module
//!
//! In-memory ordered set of the encoded keys present in one store namespace.
//!
//! ## Responsibilities
//! - Build itself once from a full backend scan
//! - Answer "is K present" and "where would K go" by binary search
//! - Stay in sync with the backend on every accepted put and delete
//! - Offer positional access for range iterators
//!
//! ## Data Structure Choice
//! A sorted `Vec<String>` rather than a `BTreeSet`: iterators address keys by
//! integer position, which a vector answers in O(1). Search is O(log n);
//! insert/remove shift the tail, which is cheap at the sizes a key/value
//! backend of this kind holds.
//!
//! The index is not internally synchronized. The store wraps it in a
//! `RwLock` and routes every mutation through its task queue.

use crate::backend::Backend;
use crate::codec::{self, Value};
use crate::error::{LexiError, Result};

/// Suffix older writers appended to binary physical keys; stripped on load
pub const LEGACY_BINARY_SUFFIX: &str = "!bin";

/// Outcome of a binary search
#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    /// First position whose key is `>=` the probe. Equals `len()` when every
    /// key is smaller.
    pub position: usize,

    /// The decoded key at `position`, present only on an exact match
    pub key: Option<Value>,
}

impl SearchHit {
    pub fn is_match(&self) -> bool {
        self.key.is_some()
    }
}

/// Lifecycle of the index
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IndexStatus {
    /// Waiting for the initial scan
    Unloaded,
    /// Serving requests
    Loaded,
    /// The initial scan failed; carries the failure text
    Failed(String),
    /// The owning store was closed
    Discarded,
}

/// Ordered, duplicate-free sequence of encoded keys
#[derive(Debug)]
pub struct KeyIndex {
    keys: Vec<String>,
    status: IndexStatus,
}

impl KeyIndex {
    /// Create an empty, unloaded index
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            status: IndexStatus::Unloaded,
        }
    }

    /// Build the index from a full scan of `backend`.
    ///
    /// Only physical keys starting with `prefix` are kept; the prefix and any
    /// legacy suffix are stripped and the remainder must decode. Returns the
    /// number of keys loaded.
    pub fn load(&mut self, backend: &dyn Backend, prefix: &str) -> Result<usize> {
        let size = backend.size()?;
        let mut keys = Vec::new();

        for position in 0..size {
            let Some(physical) = backend.key_at(position)? else {
                continue;
            };
            let Some(encoded) = physical.strip_prefix(prefix) else {
                continue;
            };
            let encoded = encoded.strip_suffix(LEGACY_BINARY_SUFFIX).unwrap_or(encoded);
            codec::validate(encoded)?;
            keys.push(encoded.to_owned());
        }

        keys.sort_unstable();
        keys.dedup();

        self.keys = keys;
        self.status = IndexStatus::Loaded;
        Ok(self.keys.len())
    }

    /// Record that the initial scan failed
    pub fn mark_failed(&mut self, reason: impl Into<String>) {
        self.keys.clear();
        self.status = IndexStatus::Failed(reason.into());
    }

    /// Drop every key and refuse further requests
    pub fn discard(&mut self) {
        self.keys.clear();
        self.status = IndexStatus::Discarded;
    }

    pub fn status(&self) -> &IndexStatus {
        &self.status
    }

    /// Fail unless the index has been loaded
    pub fn ensure_loaded(&self) -> Result<()> {
        match &self.status {
            IndexStatus::Loaded => Ok(()),
            IndexStatus::Unloaded => Err(LexiError::NotOpen("index not loaded".to_string())),
            IndexStatus::Failed(reason) => {
                Err(LexiError::NotOpen(format!("initial load failed: {}", reason)))
            }
            IndexStatus::Discarded => Err(LexiError::NotOpen("store closed".to_string())),
        }
    }

    /// Binary search for the first key `>= encoded`
    pub fn search(&self, encoded: &str) -> Result<SearchHit> {
        let position = self.lower_bound(encoded);
        let key = match self.keys.get(position) {
            Some(found) if found == encoded => Some(codec::decode(found, false)?),
            _ => None,
        };
        Ok(SearchHit { position, key })
    }

    /// Decoded key at `position` (negative or past-the-end gives `None`)
    pub fn key_at(&self, position: isize) -> Result<Option<Value>> {
        self.encoded_at(position)
            .map(|encoded| codec::decode(encoded, false))
            .transpose()
    }

    /// Encoded key at `position` (negative or past-the-end gives `None`)
    pub fn encoded_at(&self, position: isize) -> Option<&str> {
        usize::try_from(position)
            .ok()
            .and_then(|p| self.keys.get(p))
            .map(String::as_str)
    }

    /// Insert `encoded` if absent. Returns true if the key was added.
    pub fn insert(&mut self, encoded: String) -> bool {
        let position = self.lower_bound(&encoded);
        if self.keys.get(position) == Some(&encoded) {
            return false;
        }
        self.keys.insert(position, encoded);
        true
    }

    /// Remove `encoded` if present. Returns true if the key was removed.
    pub fn remove(&mut self, encoded: &str) -> bool {
        let position = self.lower_bound(encoded);
        if self.keys.get(position).map(String::as_str) != Some(encoded) {
            return false;
        }
        self.keys.remove(position);
        true
    }

    pub fn contains(&self, encoded: &str) -> bool {
        self.keys.binary_search_by(|k| k.as_str().cmp(encoded)).is_ok()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Encoded keys in ascending order
    pub fn as_slice(&self) -> &[String] {
        &self.keys
    }

    fn lower_bound(&self, encoded: &str) -> usize {
        self.keys.partition_point(|k| k.as_str() < encoded)
    }
}

impl Default for KeyIndex {
    fn default() -> Self {
        Self::new()
    }
}
