use std::time::Duration;

use tokio::task::JoinHandle;

/// Identifies one scheduled firing. Only the ticket of the most recent
/// `schedule` call can settle.
pub type Ticket = u64;

/// Cancel-and-reschedule holder for a single pending delayed task.
///
/// Each `schedule` aborts the previous timer and hands out a new ticket. The
/// timer's callback receives its ticket and the owner confirms it with
/// [`Debouncer::settle`]: a timer that had already fired before it was
/// replaced carries a stale ticket and is rejected there.
#[derive(Debug)]
pub struct Debouncer {
    delay: Duration,
    generation: Ticket,
    pending: Option<JoinHandle<()>>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    /// Start (or restart) the window. `fire` runs once the delay elapses
    /// without another `schedule` or `cancel`.
    pub fn schedule<F>(&mut self, fire: F) -> Ticket
    where
        F: FnOnce(Ticket) + Send + 'static,
    {
        self.cancel();
        let ticket = self.generation;
        let delay = self.delay;
        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            fire(ticket);
        }));
        ticket
    }

    /// Drop the pending timer, if any. Tickets issued so far become stale.
    pub fn cancel(&mut self) {
        self.generation += 1;
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }

    /// Accept a fired ticket. Returns false for stale ones.
    pub fn settle(&mut self, ticket: Ticket) -> bool {
        if self.pending.is_none() || ticket != self.generation {
            return false;
        }
        self.pending = None;
        true
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}
