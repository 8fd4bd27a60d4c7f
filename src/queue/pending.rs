//! Completion handle for a queued operation

use crossbeam::channel::{Receiver, TryRecvError};

use crate::error::{LexiError, Result};

/// The eventual outcome of one queued operation
#[must_use = "a Pending does nothing unless waited on"]
pub struct Pending<T> {
    receiver: Receiver<Result<T>>,
}

impl<T> Pending<T> {
    pub(crate) fn new(receiver: Receiver<Result<T>>) -> Self {
        Self { receiver }
    }

    /// Block until the operation has run and return its outcome.
    ///
    /// Returns `Closed` if the queue shut down before the operation ran.
    pub fn wait(self) -> Result<T> {
        self.receiver.recv().unwrap_or(Err(LexiError::Closed))
    }

    /// Non-blocking check. `None` while the operation is still queued.
    pub fn try_wait(&self) -> Option<Result<T>> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(LexiError::Closed)),
        }
    }
}

impl<T> std::fmt::Debug for Pending<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pending")
            .field("complete", &!self.receiver.is_empty())
            .finish()
    }
}
