//! # lexikv
//!
//! An ordered key-value store layered over a backend that only offers
//! unordered point get/put/remove and enumeration by position:
//! - Lexicographically ordered iteration with inclusive/exclusive bounds
//! - Reverse scans and result limits
//! - Binary, text, numeric and structured values that round-trip
//! - One strictly ordered task queue per store
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                          Store                              │
//! │          put / get / delete / batch / iterator              │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//! ┌──────────────▼──────────────┐         ┌──────▼──────┐
//! │         Task Queue          │         │ RangeIter   │
//! │  (load first, then FIFO)    │         │ (unqueued)  │
//! └──────────────┬──────────────┘         └──────┬──────┘
//!                │                               │
//!                ▼                               ▼
//!         ┌─────────────┐   encode/decode  ┌─────────────┐
//!         │  KeyIndex   │◄────────────────►│    Codec    │
//!         │ (sorted vec)│                  │ (B / J / S) │
//!         └──────┬──────┘                  └─────────────┘
//!                │
//!                ▼
//!         ┌─────────────┐
//!         │   Backend   │  get / put / remove / size / key_at
//!         └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use lexikv::{Config, IterOptions, MemoryBackend, Store};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! let store = Store::open_with(backend, Config::default()).unwrap();
//!
//! store.put("b", "2").unwrap();
//! store.put("a", "1").unwrap();
//!
//! let keys: Vec<String> = store
//!     .iterator(IterOptions::new().as_text())
//!     .map(|entry| entry.unwrap().key.to_string())
//!     .collect();
//! assert_eq!(keys, ["a", "b"]);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod codec;
pub mod backend;
pub mod index;
pub mod queue;
pub mod iter;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use error::{LexiError, Result};
pub use config::{Config, SyncStrategy};
pub use codec::Value;
pub use backend::{Backend, MemoryBackend, SnapshotBackend};
pub use iter::{Entry, IterOptions, RangeIter};
pub use store::{BatchOp, Store};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of lexikv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
