//! Trailing-edge debounce state machine.
//!
//! The debouncer holds at most one pending item. Pushing while pending
//! replaces the item and restarts the window; the item is released once the
//! window elapses with no further pushes. Time is passed in by the caller, so
//! the state machine itself never sleeps.

use std::time::{Duration, Instant};

#[derive(Debug)]
enum State<T> {
    Idle,
    Pending { item: T, deadline: Instant },
}

/// Single-slot trailing-edge debouncer.
#[derive(Debug)]
pub struct Debouncer<T> {
    window: Duration,
    state: State<T>,
}

impl<T> Debouncer<T> {
    /// Creates an idle debouncer with the given quiet window.
    #[must_use]
    pub const fn new(window: Duration) -> Self {
        Self {
            window,
            state: State::Idle,
        }
    }

    /// The quiet window.
    #[must_use]
    pub const fn window(&self) -> Duration {
        self.window
    }

    /// Arms the debouncer with `item` at time `now`.
    ///
    /// Returns the item that was pending before, if any. That item will never
    /// be released.
    pub fn push(&mut self, item: T, now: Instant) -> Option<T> {
        let deadline = now + self.window;
        match std::mem::replace(&mut self.state, State::Pending { item, deadline }) {
            State::Idle => None,
            State::Pending { item, .. } => Some(item),
        }
    }

    /// When the pending item is due, if one is pending.
    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        match &self.state {
            State::Idle => None,
            State::Pending { deadline, .. } => Some(*deadline),
        }
    }

    /// Returns true if an item is pending.
    #[must_use]
    pub const fn is_pending(&self) -> bool {
        matches!(self.state, State::Pending { .. })
    }

    /// Releases the pending item if its deadline is at or before `now`.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.state {
            State::Pending { deadline, .. } if deadline <= now => {
                match std::mem::replace(&mut self.state, State::Idle) {
                    State::Pending { item, .. } => Some(item),
                    State::Idle => None,
                }
            }
            _ => None,
        }
    }
}
