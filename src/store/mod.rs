//! Store Module
//!
//! The ordered key-value view consumers talk to.
//!
//! ## Request Flow
//! ```text
//!   put/get/delete ──► validate ──► encode ──► TaskQueue ──► Shared
//!        │                │                                   │
//!        │          InvalidArgument                 KeyIndex + one Backend call
//!        │          (no queue slot)
//!        │
//!   iterator ───────────────────────────────► RangeIter ──► KeyIndex + Backend
//! ```
//!
//! Every queued operation sees the effects of every operation submitted
//! before it. Operations submitted before `open` are held until the initial
//! index load has finished, then run in submission order.

mod batch;

pub use batch::BatchOp;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::backend::Backend;
use crate::codec::{self, Value};
use crate::config::{Config, NAMESPACE_SEPARATOR};
use crate::error::{LexiError, Result};
use crate::index::KeyIndex;
use crate::iter::{IterOptions, RangeIter};
use crate::queue::{Pending, TaskQueue};

/// State shared between the store, its queued tasks and its iterators
pub(crate) struct Shared {
    /// `{namespace}!`
    prefix: String,
    pub(crate) backend: Arc<dyn Backend>,
    pub(crate) index: RwLock<KeyIndex>,
}

impl Shared {
    pub(crate) fn physical_key(&self, encoded: &str) -> String {
        let mut physical = String::with_capacity(self.prefix.len() + encoded.len());
        physical.push_str(&self.prefix);
        physical.push_str(encoded);
        physical
    }

    fn load(&self) -> Result<()> {
        let mut index = self.index.write();
        match index.load(self.backend.as_ref(), &self.prefix) {
            Ok(count) => {
                tracing::info!(prefix = %self.prefix, keys = count, "key index loaded");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(prefix = %self.prefix, "key index load failed: {}", e);
                index.mark_failed(e.to_string());
                Err(e)
            }
        }
    }

    fn put(&self, key: String, value: String) -> Result<()> {
        self.index.read().ensure_loaded()?;
        self.backend.put(&self.physical_key(&key), &value)?;
        self.index.write().insert(key);
        Ok(())
    }

    fn get(&self, key: String, as_binary: bool) -> Result<Value> {
        self.index.read().ensure_loaded()?;
        match self.backend.get(&self.physical_key(&key))? {
            Some(stored) => codec::decode(&stored, as_binary),
            None => Err(LexiError::NotFound),
        }
    }

    fn delete(&self, key: String) -> Result<()> {
        let present = {
            let index = self.index.read();
            index.ensure_loaded()?;
            index.contains(&key)
        };
        if !present {
            return Ok(());
        }
        self.backend.remove(&self.physical_key(&key))?;
        self.index.write().remove(&key);
        Ok(())
    }

    fn len(&self) -> Result<usize> {
        let index = self.index.read();
        index.ensure_loaded()?;
        Ok(index.len())
    }
}

/// An ordered key-value store over an unordered [`Backend`]
pub struct Store {
    config: Config,
    shared: Arc<Shared>,
    queue: TaskQueue,
    open_requested: AtomicBool,
}

impl Store {
    /// Build an unopened store. Submissions are buffered until [`open`](Self::open).
    pub fn new(backend: Arc<dyn Backend>, config: Config) -> Result<Self> {
        config.validate()?;

        let shared = Arc::new(Shared {
            prefix: config.key_prefix(),
            backend,
            index: RwLock::new(KeyIndex::new()),
        });
        let queue = TaskQueue::new(config.namespace.clone())?;

        Ok(Self {
            config,
            shared,
            queue,
            open_requested: AtomicBool::new(false),
        })
    }

    /// Build and open a store in one call
    pub fn open_with(backend: Arc<dyn Backend>, config: Config) -> Result<Self> {
        let store = Self::new(backend, config)?;
        store.open()?;
        Ok(store)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Start the one-time index load.
    ///
    /// The load runs before anything already buffered. Calling this again
    /// queues a check of the load's outcome instead of a second load.
    pub fn submit_open(&self) -> Pending<()> {
        let shared = Arc::clone(&self.shared);
        if self.open_requested.swap(true, Ordering::SeqCst) {
            tracing::debug!(namespace = %self.config.namespace, "store already opened");
            return self.queue.submit(move || shared.index.read().ensure_loaded());
        }
        tracing::debug!(namespace = %self.config.namespace, "opening store");
        self.queue.initialize(move || shared.load())
    }

    /// Load the key index and wait for it
    pub fn open(&self) -> Result<()> {
        self.submit_open().wait()
    }

    /// True once the index has loaded and until the store is closed
    pub fn is_open(&self) -> bool {
        self.shared.index.read().ensure_loaded().is_ok()
    }

    /// Discard the index and stop the task queue.
    ///
    /// Operations already queued still run. Later submissions fail with
    /// `Closed`.
    pub fn close(&self) -> Result<()> {
        if self.queue.is_closed() {
            return Ok(());
        }

        let outcome = if self.queue.is_ready() {
            let shared = Arc::clone(&self.shared);
            let pending = self.queue.submit(move || {
                shared.index.write().discard();
                Ok(())
            });
            self.queue.shutdown();
            pending.wait()
        } else {
            self.queue.shutdown();
            self.shared.index.write().discard();
            Ok(())
        };

        tracing::debug!(namespace = %self.config.namespace, "store closed");
        outcome
    }

    /// Remove every physical record under `namespace`.
    ///
    /// Talks to the backend directly, bypassing any store's queue; the caller
    /// must ensure no open store is using the namespace. Returns the number
    /// of records removed.
    pub fn destroy(backend: &dyn Backend, namespace: &str) -> Result<usize> {
        let prefix = format!("{}{}", namespace, NAMESPACE_SEPARATOR);

        // Collect first: removals shift positions.
        let size = backend.size()?;
        let mut doomed = Vec::new();
        for position in 0..size {
            if let Some(key) = backend.key_at(position)? {
                if key.starts_with(&prefix) {
                    doomed.push(key);
                }
            }
        }

        for key in &doomed {
            backend.remove(key)?;
        }

        tracing::info!(namespace, removed = doomed.len(), "namespace destroyed");
        Ok(doomed.len())
    }

    // =========================================================================
    // Point Operations
    // =========================================================================

    /// Queue a put. Empty keys or values are rejected before queuing.
    pub fn submit_put(
        &self,
        key: impl Into<Value>,
        value: impl Into<Value>,
    ) -> Result<Pending<()>> {
        let key = key.into();
        let value = value.into();
        check_key(&key)?;
        check_not_empty(&value, "value")?;

        let key = codec::encode(&key);
        let value = codec::encode(&value);
        let shared = Arc::clone(&self.shared);
        Ok(self.queue.submit(move || shared.put(key, value)))
    }

    /// Store `value` under `key`, overwriting any previous value
    pub fn put(&self, key: impl Into<Value>, value: impl Into<Value>) -> Result<()> {
        self.submit_put(key, value)?.wait()
    }

    /// Queue a get
    pub fn submit_get(&self, key: impl Into<Value>, as_binary: bool) -> Result<Pending<Value>> {
        let key = key.into();
        check_key(&key)?;

        let key = codec::encode(&key);
        let shared = Arc::clone(&self.shared);
        Ok(self.queue.submit(move || shared.get(key, as_binary)))
    }

    /// Fetch the value stored under `key`; `NotFound` if absent.
    ///
    /// With `as_binary` the value comes back as `Value::Binary` whatever
    /// shape it was stored in.
    pub fn get(&self, key: impl Into<Value>, as_binary: bool) -> Result<Value> {
        self.submit_get(key, as_binary)?.wait()
    }

    /// Queue a delete
    pub fn submit_delete(&self, key: impl Into<Value>) -> Result<Pending<()>> {
        let key = key.into();
        check_key(&key)?;

        let key = codec::encode(&key);
        let shared = Arc::clone(&self.shared);
        Ok(self.queue.submit(move || shared.delete(key)))
    }

    /// Remove `key`. Deleting an absent key is not an error.
    pub fn delete(&self, key: impl Into<Value>) -> Result<()> {
        self.submit_delete(key)?.wait()
    }

    /// Apply a group of puts and deletes.
    ///
    /// Every element is attempted, invalid ones included. The first error in
    /// request order is returned; elements that succeeded stay applied.
    pub fn batch(&self, ops: impl IntoIterator<Item = BatchOp>) -> Result<()> {
        let submitted: Vec<Result<Pending<()>>> = ops
            .into_iter()
            .map(|op| match op {
                BatchOp::Put { key, value } => self.submit_put(key, value),
                BatchOp::Delete { key } => self.submit_delete(key),
            })
            .collect();

        tracing::debug!(
            namespace = %self.config.namespace,
            ops = submitted.len(),
            "batch dispatched"
        );

        let mut first_error = None;
        for outcome in submitted {
            if let Err(e) = outcome.and_then(Pending::wait) {
                if first_error.is_none() {
                    first_error = Some(e);
                } else {
                    tracing::debug!("additional batch failure: {}", e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Number of keys in the store (queued behind pending writes)
    pub fn len(&self) -> Result<usize> {
        let shared = Arc::clone(&self.shared);
        self.queue.submit(move || shared.len()).wait()
    }

    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    // =========================================================================
    // Iteration
    // =========================================================================

    /// Start an ordered scan. The cursor seeks on its first step.
    pub fn iterator(&self, options: IterOptions) -> RangeIter<'_> {
        RangeIter::new(&self.shared, options)
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn namespace(&self) -> &str {
        &self.config.namespace
    }

    /// Encoded keys in index order, read through the queue
    pub fn encoded_keys(&self) -> Result<Vec<String>> {
        let shared = Arc::clone(&self.shared);
        self.queue
            .submit(move || {
                let index = shared.index.read();
                index.ensure_loaded()?;
                Ok(index.as_slice().to_vec())
            })
            .wait()
    }

    /// Operations the queue has finished (the initial load included)
    pub fn completed_operations(&self) -> u64 {
        self.queue.completed()
    }
}

impl Drop for Store {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            tracing::warn!(namespace = %self.config.namespace, "error closing store: {}", e);
        }
    }
}

// =============================================================================
// Argument Checks
// =============================================================================

fn check_key(key: &Value) -> Result<()> {
    if key.is_null() {
        return Err(LexiError::InvalidArgument(
            "key cannot be `null`".to_string(),
        ));
    }
    check_not_empty(key, "key")
}

fn check_not_empty(value: &Value, what: &str) -> Result<()> {
    match value {
        Value::Binary(bytes) if bytes.is_empty() => Err(LexiError::InvalidArgument(format!(
            "{} cannot be an empty buffer",
            what
        ))),
        _ if value.is_empty() => Err(LexiError::InvalidArgument(format!(
            "{} cannot be empty",
            what
        ))),
        _ => Ok(()),
    }
}
