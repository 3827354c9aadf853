//! SearchDebouncer - collapses bursts of keystrokes into one committed search.
//!
//! Each input restarts a fixed timer. The commit callback only runs once the
//! timer elapses with no newer input and no cancellation in between. Once a
//! commit has started it is no longer cancellable; its effects are ordered
//! by the list's generation token instead.
//!
//! Must be used from within a tokio runtime.

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use log::debug;
use tokio::task::JoinHandle;

struct Pending {
    ticket: u64,
    text: String,
    timer: JoinHandle<()>,
}

#[derive(Default)]
struct Slot {
    issued: u64,
    pending: Option<Pending>,
}

pub struct SearchDebouncer {
    delay: Duration,
    slot: Arc<Mutex<Slot>>,
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            slot: Arc::new(Mutex::new(Slot::default())),
        }
    }

    /// Record `text` as the latest input and restart the timer.
    ///
    /// Any previously scheduled commit is dropped.
    pub fn on_input<F, Fut>(&self, text: impl Into<String>, commit: F)
    where
        F: FnOnce(String) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let text = text.into();
        let mut slot = lock(&self.slot);
        slot.issued += 1;
        let ticket = slot.issued;

        let shared = Arc::clone(&self.slot);
        let delay = self.delay;
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let text = {
                let mut slot = lock(&shared);
                match slot.pending.take() {
                    Some(pending) if pending.ticket == ticket => pending.text,
                    other => {
                        slot.pending = other;
                        return;
                    }
                }
            };
            debug!("search committed: {:?}", text);
            commit(text).await;
        });

        if let Some(previous) = slot.pending.replace(Pending {
            ticket,
            text,
            timer,
        }) {
            previous.timer.abort();
        }
    }

    /// Drop the pending commit, if any. Returns whether one was pending.
    pub fn cancel(&self) -> bool {
        match lock(&self.slot).pending.take() {
            Some(pending) => {
                pending.timer.abort();
                debug!("search cancelled: {:?}", pending.text);
                true
            }
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        lock(&self.slot).pending.is_some()
    }

    /// Text waiting to be committed.
    pub fn pending_text(&self) -> Option<String> {
        lock(&self.slot)
            .pending
            .as_ref()
            .map(|pending| pending.text.clone())
    }
}

impl Drop for SearchDebouncer {
    fn drop(&mut self) {
        if let Some(pending) = lock(&self.slot).pending.take() {
            pending.timer.abort();
        }
    }
}

fn lock(slot: &Mutex<Slot>) -> MutexGuard<'_, Slot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}
