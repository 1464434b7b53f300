//! Per-database connection admission.
//!
//! Cooperating processes take turns mutating a database. Each database has
//! one FIFO queue of process ids; the id at the head is the active
//! connection, and everyone else waits. Exclusivity is cooperative: row
//! operations trust that a caller admitted through [`AdmissionQueue::connect`]
//! stays the sole writer until it disconnects.

use crate::error::{StoreError, StoreResult};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

/// FIFO admission gate for one database.
#[derive(Debug)]
pub struct AdmissionQueue {
    database: String,
    queue: Mutex<VecDeque<u32>>,
    poll_interval: Duration,
}

impl AdmissionQueue {
    /// Creates an empty queue for the named database.
    pub fn new(database: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            database: database.into(),
            queue: Mutex::new(VecDeque::new()),
            poll_interval,
        }
    }

    /// Enqueues `pid` and blocks until it reaches the head of the queue.
    ///
    /// Waiting is a bounded-interval poll, so admission latency is bounded
    /// by the poll interval. There is no timeout and no cancellation: a
    /// holder that never disconnects blocks every later connect.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::AlreadyConnected`] if `pid` already holds or
    /// awaits a slot.
    pub fn connect(&self, pid: u32) -> StoreResult<()> {
        {
            let mut queue = self.queue.lock();
            if queue.contains(&pid) {
                return Err(StoreError::AlreadyConnected {
                    database: self.database.clone(),
                    pid,
                });
            }
            queue.push_back(pid);
        }

        while !self.is_connected(pid) {
            thread::sleep(self.poll_interval);
        }
        tracing::debug!(database = %self.database, pid, "connection admitted");
        Ok(())
    }

    /// Releases the active slot held by `pid`, promoting the next waiter.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotConnected`] unless `pid` is the active
    /// connection.
    pub fn disconnect(&self, pid: u32) -> StoreResult<()> {
        let mut queue = self.queue.lock();
        if queue.front() != Some(&pid) {
            return Err(StoreError::NotConnected {
                database: self.database.clone(),
                pid,
            });
        }
        queue.pop_front();
        tracing::debug!(database = %self.database, pid, "connection released");
        Ok(())
    }

    /// Returns true iff `pid` is the active connection.
    #[must_use]
    pub fn is_connected(&self, pid: u32) -> bool {
        self.queue.lock().front() == Some(&pid)
    }

    /// Returns true iff any connection is active.
    #[must_use]
    pub fn has_active(&self) -> bool {
        !self.queue.lock().is_empty()
    }

    /// Returns the number of queued process ids, the active one included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.queue.lock().len()
    }

    /// Returns true iff no process holds or awaits a connection.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.queue.lock().is_empty()
    }
}
