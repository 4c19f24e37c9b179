//! Mutex-guarded FIFO handing messages from I/O tasks to the simulation
//! thread.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// A thread-safe FIFO. Producers are the per-connection reader tasks, which
/// may run on different executor threads; the single consumer is the
/// simulation loop. Items come out in push order per queue instance.
///
/// Consumers wait with [`MessageQueue::pop_timeout`] rather than polling
/// `is_empty` in a loop.
pub struct MessageQueue<T> {
    items: Mutex<VecDeque<T>>,
    available: Condvar,
}

impl<T> MessageQueue<T> {
    pub fn new() -> Self {
        MessageQueue {
            items: Mutex::new(VecDeque::new()),
            available: Condvar::new(),
        }
    }

    pub fn push(&self, item: T) {
        let mut items = self.items.lock().unwrap();
        items.push_back(item);
        self.available.notify_one();
    }

    /// Pops the oldest item without blocking.
    pub fn try_pop(&self) -> Option<T> {
        self.items.lock().unwrap().pop_front()
    }

    /// Pops the oldest item, waiting up to `timeout` for one to arrive.
    /// Returns `None` if the queue is still empty when the timeout elapses.
    pub fn pop_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut items = self.items.lock().unwrap();

        loop {
            if let Some(item) = items.pop_front() {
                return Some(item);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            let (guard, _) = self.available.wait_timeout(items, remaining).unwrap();
            items = guard;
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().unwrap().is_empty()
    }
}

impl<T> Default for MessageQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
