//! Batch operations

use crate::codec::Value;

/// One element of a [`Store::batch`](super::Store::batch) request
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOp {
    /// Put a key-value pair
    Put { key: Value, value: Value },

    /// Delete a key
    Delete { key: Value },
}

impl BatchOp {
    pub fn put(key: impl Into<Value>, value: impl Into<Value>) -> Self {
        BatchOp::Put {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn delete(key: impl Into<Value>) -> Self {
        BatchOp::Delete { key: key.into() }
    }
}
