//! Suppression of superseded requests
//!
//! When the user changes the selection while a fetch is in flight, the old
//! response must not overwrite the new one. Every request takes a ticket from
//! a [`RequestGuard`]; only the most recently issued ticket is current.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Issues request tickets and remembers the latest one
#[derive(Debug, Clone, Default)]
pub struct RequestGuard {
    latest: Arc<AtomicU64>,
}

/// Proof of issue for one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestTicket(u64);

impl RequestTicket {
    pub fn id(&self) -> u64 {
        self.0
    }
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take a new ticket, superseding every earlier one
    pub fn issue(&self) -> RequestTicket {
        RequestTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    /// `value` if `ticket` is still current
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            tracing::debug!(ticket = ticket.0, "Dropping stale response");
            None
        }
    }

    /// Run `request` under a fresh ticket; `None` if another request was
    /// issued before it finished
    pub async fn run<F>(&self, request: F) -> Option<F::Output>
    where
        F: Future,
    {
        let ticket = self.issue();
        let output = request.await;
        self.accept(ticket, output)
    }
}
