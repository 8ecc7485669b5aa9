//! Local event fan-out for fronts.
//!
//! Each listener owns a bounded channel. Emission never blocks: a listener
//! whose channel is full misses the event, one whose receiver is gone is
//! pruned.

use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc;
use tracing::warn;

pub const DEFAULT_EVENT_BUFFER: usize = 64;

/// An event that can be filtered by name.
pub trait NamedEvent: Clone + Send + 'static {
    fn name(&self) -> &str;
}

struct Listener<E> {
    /// `None` listens to every event.
    filter: Option<String>,
    tx: mpsc::Sender<E>,
}

pub struct EventEmitter<E: NamedEvent> {
    listeners: Mutex<Vec<Listener<E>>>,
    buffer: usize,
}

impl<E: NamedEvent> EventEmitter<E> {
    pub fn new() -> Self {
        Self::with_buffer(DEFAULT_EVENT_BUFFER)
    }

    pub fn with_buffer(buffer: usize) -> Self {
        Self {
            listeners: Mutex::new(Vec::new()),
            buffer: buffer.max(1),
        }
    }

    /// Listen to events named `event`.
    pub fn on(&self, event: &str) -> mpsc::Receiver<E> {
        self.add(Some(event.to_string()))
    }

    /// Listen to every event.
    pub fn subscribe(&self) -> mpsc::Receiver<E> {
        self.add(None)
    }

    fn add(&self, filter: Option<String>) -> mpsc::Receiver<E> {
        let (tx, rx) = mpsc::channel(self.buffer);
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Listener { filter, tx });
        rx
    }

    /// Deliver `event` to every matching listener. Returns how many got it.
    pub fn emit(&self, event: E) -> usize {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| !l.tx.is_closed());

        let mut delivered = 0;
        for listener in listeners.iter() {
            if let Some(filter) = &listener.filter {
                if filter != event.name() {
                    continue;
                }
            }
            match listener.tx.try_send(event.clone()) {
                Ok(()) => delivered += 1,
                Err(mpsc::error::TrySendError::Full(_)) => {
                    warn!(event = event.name(), "event listener lagging, event dropped");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {}
            }
        }
        delivered
    }

    pub fn listener_count(&self) -> usize {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|l| !l.tx.is_closed());
        listeners.len()
    }
}

impl<E: NamedEvent> Default for EventEmitter<E> {
    fn default() -> Self {
        Self::new()
    }
}
