//! Input coalescing: at most one event per kind per interval.
//!
//! DESIGN
//! ======
//! Pointer moves and wheel ticks arrive far faster than a redraw is useful.
//! Each event kind gets its own window. The first event after a quiet window
//! passes straight through (leading edge) and opens a new window. Events that
//! land inside an open window overwrite a single pending slot for their kind;
//! `due_at` releases that slot once the window has elapsed (trailing edge).
//!
//! TRADE-OFFS
//! ==========
//! Only the latest event of a burst survives. That is the point for pointer
//! moves, whose position is absolute. For wheel input it means several ticks
//! inside one window collapse into one zoom step, which is the intended
//! backpressure.

#[cfg(test)]
#[path = "throttle_test.rs"]
mod throttle_test;

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

/// Per-kind leading/trailing-edge throttle.
#[derive(Debug)]
pub struct InputThrottle<K, E> {
    interval: Duration,
    last_emitted: HashMap<K, Instant>,
    /// Held events in arrival order, at most one per kind.
    pending: Vec<(K, E)>,
}

impl<K, E> InputThrottle<K, E>
where
    K: Copy + Eq + Hash,
{
    /// A zero `interval` disables throttling.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self { interval, last_emitted: HashMap::new(), pending: Vec::new() }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of held events.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Offer an event. Returns it back if it should be handled now; otherwise
    /// it is held (replacing any older held event of the same kind).
    pub fn offer_at(&mut self, kind: K, event: E, now: Instant) -> Option<E> {
        if self.interval.is_zero() {
            return Some(event);
        }
        if self.window_elapsed(kind, now) {
            self.pending.retain(|(k, _)| *k != kind);
            self.last_emitted.insert(kind, now);
            return Some(event);
        }
        if let Some(slot) = self.pending.iter_mut().find(|(k, _)| *k == kind) {
            slot.1 = event;
        } else {
            self.pending.push((kind, event));
        }
        tracing::trace!(pending = self.pending.len(), "input coalesced");
        None
    }

    /// Release held events whose window has elapsed.
    pub fn due_at(&mut self, now: Instant) -> Vec<E> {
        let mut due = Vec::new();
        let mut held = Vec::with_capacity(self.pending.len());
        for (kind, event) in std::mem::take(&mut self.pending) {
            if self.window_elapsed(kind, now) {
                self.last_emitted.insert(kind, now);
                due.push(event);
            } else {
                held.push((kind, event));
            }
        }
        self.pending = held;
        due
    }

    /// Release every held event immediately, in arrival order.
    pub fn flush_at(&mut self, now: Instant) -> Vec<E> {
        let pending = std::mem::take(&mut self.pending);
        pending
            .into_iter()
            .map(|(kind, event)| {
                self.last_emitted.insert(kind, now);
                event
            })
            .collect()
    }

    /// Number of kinds with an open or expired window on record.
    #[must_use]
    pub fn tracked_len(&self) -> usize {
        self.last_emitted.len()
    }

    /// Drop the window and any held event for `kind`. Call once a kind can no
    /// longer occur, such as a touch id after its finger lifts.
    pub fn forget(&mut self, kind: K) {
        self.last_emitted.remove(&kind);
        self.pending.retain(|(k, _)| *k != kind);
    }

    /// Drop held events and forget all windows.
    pub fn reset(&mut self) {
        self.pending.clear();
        self.last_emitted.clear();
    }

    fn window_elapsed(&self, kind: K, now: Instant) -> bool {
        self.last_emitted
            .get(&kind)
            .is_none_or(|last| now.saturating_duration_since(*last) >= self.interval)
    }
}
