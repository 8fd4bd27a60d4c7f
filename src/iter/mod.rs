//! Range Iterator Module
//!
//! Ordered scans over a store: bounds, direction, limit.
//!
//! ## Cursor Lifecycle
//! ```text
//!   Unstarted ──(first step: seek)──► Positioned ──(steps)──► Exhausted
//! ```
//!
//! The cursor is a plain offset into the sorted key index. Each step reads
//! one key from the index and fetches its value from the backend directly;
//! iterators do not go through the store's task queue. A scan therefore
//! sees the index as it is at each step: concurrent puts and deletes can
//! shift what an offset points at.
//!
//! ## Seek Corrections
//! The first step binary-searches for the starting bound, then adjusts the
//! landing position:
//!
//! | direction | start bound | landed on an equal key | otherwise        |
//! |-----------|-------------|------------------------|------------------|
//! | forward   | `gt`        | step +1                | stay             |
//! | forward   | `gte`       | stay                   | stay             |
//! | forward   | none        | start at 0             |                  |
//! | reverse   | `lt`        | step -1                | step -1          |
//! | reverse   | `lte`       | stay                   | step -1          |
//! | reverse   | none        | start at len - 1       |                  |
//!
//! `gt` wins over `gte` and `lt` over `lte` when both are set.
//!
//! Reverse `lt` steps back even when the search lands past the last key
//! with no key at that position. An `lt` bound above every stored key
//! therefore starts the scan at the last key instead of yielding nothing.

mod options;

pub use options::IterOptions;

use crate::codec::{self, Value};
use crate::error::Result;
use crate::store::Shared;

use options::EncodedBounds;

/// One key/value pair produced by a scan
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: Value,
    pub value: Value,
}

/// Where a cursor is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    /// No step taken yet
    Unstarted,
    /// Seeked; `position` names the next key to examine
    Positioned,
    /// Finished; every further step yields nothing
    Exhausted,
}

/// Stateful cursor over a store's keys
pub struct RangeIter<'a> {
    shared: &'a Shared,
    options: IterOptions,
    bounds: EncodedBounds,
    state: CursorState,
    /// Next index offset to examine; -1 once a reverse scan walks off the front
    position: isize,
    produced: usize,
}

impl<'a> RangeIter<'a> {
    pub(crate) fn new(shared: &'a Shared, options: IterOptions) -> Self {
        let bounds = EncodedBounds::from_options(&options);
        Self {
            shared,
            options,
            bounds,
            state: CursorState::Unstarted,
            position: 0,
            produced: 0,
        }
    }

    /// Produce the next pair.
    ///
    /// `Ok(None)` either means the scan is exhausted or, while the cursor is
    /// still `Positioned`, that the key at this step was deleted between the
    /// index read and the value fetch. Calling again continues with the next
    /// key. Any error exhausts the cursor.
    pub fn next_entry(&mut self) -> Result<Option<Entry>> {
        let result = self.step();
        if result.is_err() {
            self.state = CursorState::Exhausted;
        }
        result
    }

    /// Stop the scan; later steps yield nothing
    pub fn end(&mut self) {
        self.state = CursorState::Exhausted;
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn is_exhausted(&self) -> bool {
        self.state == CursorState::Exhausted
    }

    /// Pairs produced so far
    pub fn produced(&self) -> usize {
        self.produced
    }

    pub fn options(&self) -> &IterOptions {
        &self.options
    }

    fn step(&mut self) -> Result<Option<Entry>> {
        match self.state {
            CursorState::Exhausted => return Ok(None),
            CursorState::Unstarted => {
                self.seek()?;
                self.state = CursorState::Positioned;
            }
            CursorState::Positioned => {}
        }

        let encoded = {
            let index = self.shared.index.read();
            index.ensure_loaded()?;
            index.encoded_at(self.position).map(str::to_owned)
        };

        let Some(encoded) = encoded else {
            return Ok(self.exhaust());
        };
        if self.options.limit.is_some_and(|limit| self.produced >= limit) {
            return Ok(self.exhaust());
        }
        if !self.bounds.contains(&encoded) {
            return Ok(self.exhaust());
        }

        self.position += if self.options.reverse { -1 } else { 1 };

        let physical = self.shared.physical_key(&encoded);
        let Some(stored) = self.shared.backend.get(&physical)? else {
            tracing::trace!(key = %encoded, "key removed before its value was fetched");
            return Ok(None);
        };

        let key = codec::decode(&encoded, self.options.key_as_binary)?;
        let value = codec::decode(&stored, self.options.value_as_binary)?;
        self.produced += 1;
        Ok(Some(Entry { key, value }))
    }

    /// Compute the starting offset (see the seek table in the module docs)
    fn seek(&mut self) -> Result<()> {
        let index = self.shared.index.read();
        index.ensure_loaded()?;

        let bounds = &self.bounds;
        self.position = if self.options.reverse {
            if let Some(lt) = &bounds.lt {
                index.search(lt)?.position as isize - 1
            } else if let Some(lte) = &bounds.lte {
                let hit = index.search(lte)?;
                if hit.is_match() {
                    hit.position as isize
                } else {
                    hit.position as isize - 1
                }
            } else {
                index.len() as isize - 1
            }
        } else if let Some(gt) = &bounds.gt {
            let hit = index.search(gt)?;
            if hit.is_match() {
                hit.position as isize + 1
            } else {
                hit.position as isize
            }
        } else if let Some(gte) = &bounds.gte {
            index.search(gte)?.position as isize
        } else {
            0
        };

        tracing::trace!(
            position = self.position,
            reverse = self.options.reverse,
            "range iterator positioned"
        );
        Ok(())
    }

    fn exhaust(&mut self) -> Option<Entry> {
        self.state = CursorState::Exhausted;
        None
    }
}

impl Iterator for RangeIter<'_> {
    type Item = Result<Entry>;

    /// Skips keys lost to a fetch race; ends only once the cursor is exhausted
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.next_entry() {
                Ok(None) if self.state == CursorState::Positioned => continue,
                result => return result.transpose(),
            }
        }
    }
}
