//! Thread-safe queue carrying HSP lists from seed-search producers to a
//! single consumer.
//!
//! Producers `write`, the consumer `read`s in FIFO order. Closing the
//! stream rejects further writes but keeps queued lists readable; `read`
//! returns `None` only once the stream is both closed and drained.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};

use crate::core::blast_hits::HspList;
use crate::error::{Result, SeedError};

/// Queue length above which producers are asked to back off.
pub const DEFAULT_SOFT_CAPACITY: usize = 128;

struct Inner {
    queue: VecDeque<HspList>,
    closed: bool,
}

pub struct HspStream {
    inner: Mutex<Inner>,
    readable: Condvar,
    soft_capacity: usize,
}

impl HspStream {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_SOFT_CAPACITY)
    }

    pub fn with_capacity(soft_capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                queue: VecDeque::new(),
                closed: false,
            }),
            readable: Condvar::new(),
            soft_capacity: soft_capacity.max(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Queue one subject's hit list. Empty lists are dropped silently;
    /// writing after `close` fails.
    pub fn write(&self, list: HspList) -> Result<()> {
        if list.is_empty() {
            return Ok(());
        }
        let mut inner = self.lock();
        if inner.closed {
            return Err(SeedError::StreamClosed);
        }
        inner.queue.push_back(list);
        drop(inner);
        self.readable.notify_one();
        Ok(())
    }

    /// Take the next list, blocking while the stream is open and empty.
    /// `None` means closed and fully drained.
    pub fn read(&self) -> Option<HspList> {
        let mut inner = self.lock();
        loop {
            if let Some(list) = inner.queue.pop_front() {
                return Some(list);
            }
            if inner.closed {
                return None;
            }
            inner = match self.readable.wait(inner) {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
        }
    }

    /// Take the next list without blocking.
    pub fn try_read(&self) -> Option<HspList> {
        self.lock().queue.pop_front()
    }

    /// Stop accepting writes. Idempotent; wakes every blocked reader so
    /// they can observe end of stream.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.closed = true;
        drop(inner);
        self.readable.notify_all();
    }

    /// Producer-side backpressure hint: true while the queue holds more
    /// than the soft capacity.
    pub fn need_wait(&self) -> bool {
        self.lock().queue.len() > self.soft_capacity
    }

    pub fn len(&self) -> usize {
        self.lock().queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().queue.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

impl Default for HspStream {
    fn default() -> Self {
        Self::new()
    }
}
