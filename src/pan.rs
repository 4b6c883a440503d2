//! Pan gesture state machine: deadzone, drag, release.
//!
//! ```text
//! Idle --down--> Armed --displacement > ignore_move_until--> Moving
//!   ^              |                                            |
//!   +----up/cancel-+---------------------up/cancel--------------+
//! ```
//!
//! While `Armed`, pointer jitter inside the deadzone is swallowed. The
//! transition to `Moving` reports the full displacement since the press so
//! no motion is lost. Releasing from `Armed` is a tap, not a pan, and emits
//! no move events.

#[cfg(test)]
#[path = "pan_test.rs"]
mod pan_test;

use crate::geometry::Position;

/// Notifications produced by an active pan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MoveEvent {
    /// The deadzone was exceeded; `previous` is the press position.
    Start { previous: Position, current: Position },
    /// The pointer moved while panning.
    Move { previous: Position, current: Position },
    /// The pan ended.
    Stop { position: Position },
}

impl MoveEvent {
    /// Translation carried by this event; zero for `Stop`.
    #[must_use]
    pub fn delta(&self) -> (f64, f64) {
        match self {
            Self::Start { previous, current } | Self::Move { previous, current } => {
                (current.x - previous.x, current.y - previous.y)
            }
            Self::Stop { .. } => (0.0, 0.0),
        }
    }
}

/// Internal gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MoveState {
    /// No pointer is down.
    #[default]
    Idle,
    /// A pointer is down but has not left the deadzone.
    Armed {
        /// Where the press started; displacement is measured from here.
        origin: Position,
    },
    /// The pointer is dragging the canvas.
    Moving {
        /// Position of the previous move event.
        last: Position,
    },
}

/// Outcome of releasing the pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Release {
    /// No gesture was active.
    Idle,
    /// The press never left the deadzone.
    Tap { position: Position },
    /// A pan ended with this `Stop` event.
    Stopped(MoveEvent),
}

/// Tracks one pan gesture at a time.
#[derive(Debug, Clone, Copy)]
pub struct MoveController {
    ignore_move_until: f64,
    state: MoveState,
}

impl MoveController {
    #[must_use]
    pub fn new(ignore_move_until: f64) -> Self {
        Self { ignore_move_until, state: MoveState::Idle }
    }

    #[must_use]
    pub fn state(&self) -> MoveState {
        self.state
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.state == MoveState::Idle
    }

    #[must_use]
    pub fn is_moving(&self) -> bool {
        matches!(self.state, MoveState::Moving { .. })
    }

    /// Pointer or first touch went down. A second press while busy is ignored.
    pub fn press(&mut self, position: Position) {
        if self.is_idle() {
            self.state = MoveState::Armed { origin: position };
        }
    }

    /// Pointer moved; returns the pan event to apply, if any.
    pub fn motion(&mut self, position: Position) -> Option<MoveEvent> {
        match self.state {
            MoveState::Idle => None,
            MoveState::Armed { origin } => {
                let dx = (position.x - origin.x).abs();
                let dy = (position.y - origin.y).abs();
                if dx > self.ignore_move_until || dy > self.ignore_move_until {
                    tracing::debug!(?origin, ?position, "pan started");
                    self.state = MoveState::Moving { last: position };
                    Some(MoveEvent::Start { previous: origin, current: position })
                } else {
                    None
                }
            }
            MoveState::Moving { last } => {
                self.state = MoveState::Moving { last: position };
                Some(MoveEvent::Move { previous: last, current: position })
            }
        }
    }

    /// Pointer released or cancelled; always returns to `Idle`.
    pub fn release(&mut self, position: Position) -> Release {
        let previous = std::mem::take(&mut self.state);
        match previous {
            MoveState::Idle => Release::Idle,
            MoveState::Armed { .. } => Release::Tap { position },
            MoveState::Moving { .. } => {
                tracing::debug!(?position, "pan stopped");
                Release::Stopped(MoveEvent::Stop { position })
            }
        }
    }
}
