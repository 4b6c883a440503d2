//! Event bus: publish/subscribe keyed by event kind.
//!
//! Listeners are plain boxed closures stored in a list and called in
//! subscription order. They receive events by shared reference and the bus
//! is borrowed mutably for the whole dispatch, so a listener cannot reach
//! back into the state that emitted the event.

#[cfg(test)]
#[path = "bus_test.rs"]
mod bus_test;

use std::fmt;

/// An event that can be routed by kind.
pub trait Keyed {
    /// Discriminant listeners subscribe to.
    type Kind: Copy + Eq + fmt::Debug;

    fn kind(&self) -> Self::Kind;
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback<E> = Box<dyn FnMut(&E)>;

struct Listener<E: Keyed> {
    id: ListenerId,
    /// `None` receives every kind.
    kind: Option<E::Kind>,
    callback: Callback<E>,
}

/// Single-threaded pub/sub over events of type `E`.
pub struct EventBus<E: Keyed> {
    next_id: u64,
    listeners: Vec<Listener<E>>,
}

impl<E: Keyed> EventBus<E> {
    #[must_use]
    pub fn new() -> Self {
        Self { next_id: 0, listeners: Vec::new() }
    }

    /// Subscribe to one kind of event.
    pub fn subscribe(&mut self, kind: E::Kind, callback: impl FnMut(&E) + 'static) -> ListenerId {
        self.add(Some(kind), Box::new(callback))
    }

    /// Subscribe to every event.
    pub fn subscribe_all(&mut self, callback: impl FnMut(&E) + 'static) -> ListenerId {
        self.add(None, Box::new(callback))
    }

    /// Remove a listener. Returns `false` if it was not subscribed.
    pub fn unsubscribe(&mut self, id: ListenerId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|l| l.id != id);
        self.listeners.len() != before
    }

    /// Deliver `event` to matching listeners; returns how many were called.
    pub fn emit(&mut self, event: &E) -> usize {
        let kind = event.kind();
        let mut delivered = 0;
        for listener in &mut self.listeners {
            if listener.kind.is_none_or(|k| k == kind) {
                (listener.callback)(event);
                delivered += 1;
            }
        }
        tracing::trace!(?kind, delivered, "bus emit");
        delivered
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    fn add(&mut self, kind: Option<E::Kind>, callback: Callback<E>) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.listeners.push(Listener { id, kind, callback });
        id
    }
}

impl<E: Keyed> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Keyed> fmt::Debug for EventBus<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus").field("listeners", &self.listeners.len()).finish()
    }
}
