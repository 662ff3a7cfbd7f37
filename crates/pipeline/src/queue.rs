//! Blocking bounded queue connecting pipeline stages.
//!
//! The queue is MPMC-capable: the parser pool pops the raw queue from N
//! threads and pushes the parsed queue from N threads. FIFO holds between
//! a single producer and a single consumer; concurrent consumers observe
//! FIFO subsequences interleaved arbitrarily.
//!
//! Closing is the only termination signal between stages: there are no
//! poison pills and no partial pushes.

use std::collections::VecDeque;

use parking_lot::{Condvar, Mutex};

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
}

/// Blocking FIFO queue with bounded capacity and idempotent close.
///
/// A `capacity` of 0 disables the bound entirely: pushes never block on
/// fullness. Once closed, every push fails immediately and pops drain the
/// remaining items before returning `None`.
pub struct BoundedQueue<T> {
    inner: Mutex<Inner<T>>,
    not_empty: Condvar,
    not_full: Condvar,
    capacity: usize,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `capacity` items; 0 means unbounded.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                items: VecDeque::new(),
                closed: false,
            }),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            capacity,
        }
    }

    /// Block until the item is accepted or the queue is closed.
    ///
    /// Returns `false` iff the queue was closed before the item was
    /// accepted; the item is dropped in that case.
    pub fn push(&self, item: T) -> bool {
        let mut inner = self.inner.lock();
        while self.capacity != 0 && inner.items.len() >= self.capacity && !inner.closed {
            self.not_full.wait(&mut inner);
        }
        if inner.closed {
            return false;
        }
        inner.items.push_back(item);
        drop(inner);
        self.not_empty.notify_one();
        true
    }

    /// Block until an item is available or the queue is closed and empty.
    pub fn pop(&self) -> Option<T> {
        let mut inner = self.inner.lock();
        while inner.items.is_empty() && !inner.closed {
            self.not_empty.wait(&mut inner);
        }
        let item = inner.items.pop_front();
        drop(inner);
        if item.is_some() {
            self.not_full.notify_one();
        }
        item
    }

    /// Close the queue. Idempotent; wakes every blocked producer and
    /// consumer.
    pub fn close(&self) {
        {
            let mut inner = self.inner.lock();
            inner.closed = true;
        }
        self.not_empty.notify_all();
        self.not_full.notify_all();
    }

    /// Whether `close` has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.lock().closed
    }

    /// Current number of buffered items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().items.len()
    }

    /// Whether the queue currently holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Configured capacity; 0 means unbounded.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}
