//! ChangeFeed - state-change notifications for view code.
//!
//! Wraps an [`EventEmitter`]. Listeners run on their own threads, so the
//! controller publishing an event never waits on a subscriber.
//!
//! ## Example
//!
//! ```ignore
//! let list = ResourceList::<Trip, _>::new(transport, &config);
//! list.on_change(|event| {
//!     log::info!("{} is now {:?} ({} rows)", event.resource, event.status, event.item_count);
//! });
//! ```

use std::sync::{Mutex, PoisonError};
use std::thread::JoinHandle;

use event_emitter_rs::EventEmitter;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::TransportError;

/// Event name used for list transitions.
pub const LIST_CHANGED: &str = "list.changed";

/// Lifecycle of a list view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListStatus {
    Idle,
    Loading,
    Populated,
    Errored,
}

/// One list transition, as delivered to listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListEvent {
    /// Collection path of the list.
    pub resource: String,
    pub status: ListStatus,
    pub generation: u64,
    pub total_count: u64,
    pub item_count: usize,
    /// Display message of the recorded error, if any.
    pub error: Option<String>,
}

impl ListEvent {
    pub fn error_from(err: Option<&TransportError>) -> Option<String> {
        err.map(ToString::to_string)
    }
}

#[derive(Default)]
pub struct ChangeFeed {
    emitter: Mutex<EventEmitter>,
}

impl ChangeFeed {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to list transitions. Returns the listener id.
    pub fn on_change<F>(&self, listener: F) -> String
    where
        F: Fn(ListEvent) + Send + Sync + 'static,
    {
        self.emitter().on(LIST_CHANGED, move |payload: String| {
            match serde_json::from_str::<ListEvent>(&payload) {
                Ok(event) => listener(event),
                Err(err) => warn!("dropping malformed list event: {}", err),
            }
        })
    }

    /// Unsubscribe a listener by id.
    pub fn remove(&self, listener_id: &str) -> bool {
        self.emitter().remove_listener(listener_id).is_some()
    }

    /// Deliver `event` to every listener. The handles join the listener threads.
    pub fn publish(&self, event: &ListEvent) -> Vec<JoinHandle<()>> {
        match serde_json::to_string(event) {
            Ok(payload) => self.emitter().emit(LIST_CHANGED, payload),
            Err(err) => {
                warn!("could not encode list event: {}", err);
                Vec::new()
            }
        }
    }

    fn emitter(&self) -> std::sync::MutexGuard<'_, EventEmitter> {
        self.emitter.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
