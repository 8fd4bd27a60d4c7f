//! Task Queue Module
//!
//! Serializes every operation against one store onto a single worker thread.
//!
//! ## Ordering
//! ```text
//!   submit ──► [ buffer ] ──(initialize)──► channel ──► worker ──► Pending
//!                 FIFO          load first       FIFO      one at a time
//! ```
//!
//! - Before `initialize`, submissions are held in a FIFO buffer.
//! - `initialize` hands the one-time load task to the worker, then releases
//!   the buffer in order. The worker finishes the load before starting any
//!   released task.
//! - After that, submissions go straight to the worker channel.
//!
//! Operation N+1 never starts before operation N has returned. The queue
//! does not interpret outcomes; each result is relayed to the `Pending`
//! handle of the caller that submitted it.

mod pending;

pub use pending::Pending;

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use crossbeam::channel::{self, Receiver, Sender};
use parking_lot::Mutex;

use crate::error::Result;

type Job = Box<dyn FnOnce() + Send + 'static>;

/// A unit of work plus its dispatch number
struct Task {
    seq: u64,
    job: Job,
}

enum Mode {
    /// Waiting for `initialize`; submissions are buffered
    Buffering {
        buffered: VecDeque<Job>,
        sender: Sender<Task>,
    },
    /// Submissions go straight to the worker
    Ready(Sender<Task>),
    /// Shut down; submissions are dropped and their handles report `Closed`
    Closed,
}

struct Inner {
    mode: Mode,
    next_seq: u64,
}

/// Hand `job` to the worker under the next dispatch number
fn dispatch(next_seq: &mut u64, sender: &Sender<Task>, job: Job) {
    let seq = *next_seq;
    *next_seq += 1;
    // A send only fails once the worker is gone; dropping the job drops its
    // result sender, so the waiter sees `Closed`.
    let _ = sender.send(Task { seq, job });
}

/// Strictly ordered, single-worker task queue
pub struct TaskQueue {
    name: String,
    inner: Mutex<Inner>,
    worker: Mutex<Option<JoinHandle<()>>>,
    completed: Arc<AtomicU64>,
}

impl TaskQueue {
    /// Create a queue in buffering mode and start its worker thread
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let (sender, receiver) = channel::unbounded();
        let completed = Arc::new(AtomicU64::new(0));

        let worker = {
            let name = name.clone();
            let completed = Arc::clone(&completed);
            thread::Builder::new()
                .name(format!("lexikv-queue-{}", name))
                .spawn(move || run_worker(name, receiver, completed))?
        };

        Ok(Self {
            name,
            inner: Mutex::new(Inner {
                mode: Mode::Buffering {
                    buffered: VecDeque::new(),
                    sender,
                },
                next_seq: 0,
            }),
            worker: Mutex::new(Some(worker)),
            completed,
        })
    }

    /// Queue `op` behind everything submitted before it
    pub fn submit<T, F>(&self, op: F) -> Pending<T>
    where
        T: Send + 'static,
        F: FnOnce() -> Result<T> + Send + 'static,
    {
        let (job, pending) = wrap(op);
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        match &mut inner.mode {
            Mode::Buffering { buffered, .. } => {
                buffered.push_back(job);
                tracing::trace!(queue = %self.name, buffered = buffered.len(), "task buffered");
            }
            Mode::Ready(sender) => dispatch(&mut inner.next_seq, sender, job),
            Mode::Closed => {
                tracing::trace!(queue = %self.name, "task dropped, queue closed");
            }
        }
        pending
    }

    /// Run `load` ahead of every buffered task, then release the buffer.
    ///
    /// Calling this on a queue that is already initialized queues `load`
    /// like any other task.
    pub fn initialize<F>(&self, load: F) -> Pending<()>
    where
        F: FnOnce() -> Result<()> + Send + 'static,
    {
        let (job, pending) = wrap(load);
        let mut inner = self.inner.lock();
        match std::mem::replace(&mut inner.mode, Mode::Closed) {
            Mode::Buffering { buffered, sender } => {
                let released = buffered.len();
                dispatch(&mut inner.next_seq, &sender, job);
                for job in buffered {
                    dispatch(&mut inner.next_seq, &sender, job);
                }
                inner.mode = Mode::Ready(sender);
                tracing::debug!(queue = %self.name, released, "task queue initialized");
            }
            Mode::Ready(sender) => {
                dispatch(&mut inner.next_seq, &sender, job);
                inner.mode = Mode::Ready(sender);
            }
            Mode::Closed => {}
        }
        pending
    }

    /// True once `initialize` has been called
    pub fn is_ready(&self) -> bool {
        matches!(self.inner.lock().mode, Mode::Ready(_))
    }

    /// True after `shutdown`
    pub fn is_closed(&self) -> bool {
        matches!(self.inner.lock().mode, Mode::Closed)
    }

    /// Tasks held back waiting for `initialize`
    pub fn buffered_len(&self) -> usize {
        match &self.inner.lock().mode {
            Mode::Buffering { buffered, .. } => buffered.len(),
            _ => 0,
        }
    }

    /// Tasks the worker has finished
    pub fn completed(&self) -> u64 {
        self.completed.load(Ordering::Acquire)
    }

    /// Stop accepting work, let the worker drain what it already holds, and
    /// join it.
    ///
    /// Buffered tasks that were never released are dropped; their handles
    /// report `Closed`.
    pub fn shutdown(&self) {
        {
            let mut inner = self.inner.lock();
            if let Mode::Buffering { buffered, .. } = &inner.mode {
                if !buffered.is_empty() {
                    tracing::debug!(
                        queue = %self.name,
                        dropped = buffered.len(),
                        "dropping tasks that never saw initialization"
                    );
                }
            }
            inner.mode = Mode::Closed;
        }

        let handle = self.worker.lock().take();
        if let Some(handle) = handle {
            if handle.thread().id() == thread::current().id() {
                return;
            }
            if handle.join().is_err() {
                tracing::warn!(queue = %self.name, "queue worker panicked");
            }
        }
    }
}

impl Drop for TaskQueue {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Box `op` so its result lands in the returned handle
fn wrap<T, F>(op: F) -> (Job, Pending<T>)
where
    T: Send + 'static,
    F: FnOnce() -> Result<T> + Send + 'static,
{
    let (sender, receiver) = channel::bounded(1);
    let job: Job = Box::new(move || {
        // The caller may have dropped its handle; the outcome is then discarded.
        let _ = sender.send(op());
    });
    (job, Pending::new(receiver))
}

fn run_worker(name: String, receiver: Receiver<Task>, completed: Arc<AtomicU64>) {
    for Task { seq, job } in receiver.iter() {
        tracing::trace!(queue = %name, seq, "task started");
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            tracing::warn!(queue = %name, seq, "task panicked");
        }
        completed.fetch_add(1, Ordering::AcqRel);
    }
    tracing::debug!(queue = %name, "queue worker stopped");
}
