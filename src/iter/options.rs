//! Iterator options

use crate::codec::{self, Value};

/// Range, direction, limit and output shape of a scan
#[derive(Debug, Clone, PartialEq)]
pub struct IterOptions {
    /// Walk keys in descending order
    pub reverse: bool,
    /// Exclusive lower bound
    pub gt: Option<Value>,
    /// Inclusive lower bound
    pub gte: Option<Value>,
    /// Exclusive upper bound
    pub lt: Option<Value>,
    /// Inclusive upper bound
    pub lte: Option<Value>,
    /// Maximum number of pairs to produce
    pub limit: Option<usize>,
    /// Return keys as `Value::Binary` instead of their stored shape
    pub key_as_binary: bool,
    /// Return values as `Value::Binary` instead of their stored shape
    pub value_as_binary: bool,
}

impl Default for IterOptions {
    fn default() -> Self {
        Self {
            reverse: false,
            gt: None,
            gte: None,
            lt: None,
            lte: None,
            limit: None,
            key_as_binary: true,
            value_as_binary: true,
        }
    }
}

impl IterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reverse(mut self) -> Self {
        self.reverse = true;
        self
    }

    pub fn gt(mut self, bound: impl Into<Value>) -> Self {
        self.gt = Some(bound.into());
        self
    }

    pub fn gte(mut self, bound: impl Into<Value>) -> Self {
        self.gte = Some(bound.into());
        self
    }

    pub fn lt(mut self, bound: impl Into<Value>) -> Self {
        self.lt = Some(bound.into());
        self
    }

    pub fn lte(mut self, bound: impl Into<Value>) -> Self {
        self.lte = Some(bound.into());
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn key_as_binary(mut self, as_binary: bool) -> Self {
        self.key_as_binary = as_binary;
        self
    }

    pub fn value_as_binary(mut self, as_binary: bool) -> Self {
        self.value_as_binary = as_binary;
        self
    }

    /// Shorthand for text keys and values
    pub fn as_text(self) -> Self {
        self.key_as_binary(false).value_as_binary(false)
    }
}

/// Bounds translated into the index's encoded key space
#[derive(Debug, Clone, Default)]
pub(crate) struct EncodedBounds {
    pub(crate) gt: Option<String>,
    pub(crate) gte: Option<String>,
    pub(crate) lt: Option<String>,
    pub(crate) lte: Option<String>,
}

impl EncodedBounds {
    pub(crate) fn from_options(options: &IterOptions) -> Self {
        let encode = |bound: &Option<Value>| bound.as_ref().map(codec::encode);
        Self {
            gt: encode(&options.gt),
            gte: encode(&options.gte),
            lt: encode(&options.lt),
            lte: encode(&options.lte),
        }
    }

    /// True if `key` satisfies every configured bound
    pub(crate) fn contains(&self, key: &str) -> bool {
        !(self.lt.as_deref().is_some_and(|b| key >= b)
            || self.lte.as_deref().is_some_and(|b| key > b)
            || self.gt.as_deref().is_some_and(|b| key <= b)
            || self.gte.as_deref().is_some_and(|b| key < b))
    }
}
