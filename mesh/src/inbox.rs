//! Per-rank buffer of received payloads.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::Notify;

use crate::Error;
use crate::transport::Tag;

/// Payloads that arrived for one rank, keyed by sender and tag.
///
/// Messages may arrive in any order; [`Inbox::take`] waits for the one it
/// asks for. Payloads with the same key are returned in arrival order.
pub struct Inbox {
    inner: Mutex<State>,
    arrived: Notify,
}

#[derive(Default)]
struct State {
    queues: HashMap<(usize, Tag), VecDeque<Vec<i64>>>,
    closed: Option<String>,
}

impl Inbox {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(State::default()),
            arrived: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn deliver(&self, source: usize, tag: Tag, values: Vec<i64>) {
        self.lock()
            .queues
            .entry((source, tag))
            .or_default()
            .push_back(values);
        self.arrived.notify_waiters();
    }

    /// Fails every current and future [`Inbox::take`] that finds nothing
    /// queued.
    pub fn close(&self, reason: &str) {
        {
            let mut state = self.lock();
            if state.closed.is_none() {
                state.closed = Some(reason.to_string());
            }
        }
        self.arrived.notify_waiters();
    }

    pub async fn take(&self, source: usize, tag: Tag) -> Result<Vec<i64>, Error> {
        loop {
            let arrived = self.arrived.notified();
            tokio::pin!(arrived);
            arrived.as_mut().enable();

            {
                let mut state = self.lock();
                if let Some(queue) = state.queues.get_mut(&(source, tag)) {
                    if let Some(values) = queue.pop_front() {
                        if queue.is_empty() {
                            state.queues.remove(&(source, tag));
                        }
                        return Ok(values);
                    }
                }
                if let Some(reason) = &state.closed {
                    return Err(Error::Aborted(reason.clone()));
                }
            }

            arrived.await;
        }
    }

    /// Number of payloads delivered but not yet taken.
    pub fn len(&self) -> usize {
        self.lock().queues.values().map(VecDeque::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed.is_some()
    }
}

impl Default for Inbox {
    fn default() -> Self {
        Self::new()
    }
}
