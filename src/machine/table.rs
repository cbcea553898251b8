//! The alarm line transition table.
//!
//! ```text
//!             Armed                SignalActive              TimerExpired
//!   Init ───────────► Watching ──────────────────► Prealarm ─────────────► Alarm
//!    │                 ▲   │                          │                      │
//!    │ Disarmed  Armed │   │ Disarmed   SignalInactive│                      │
//!    ▼                 │   ▼                          ▼                      │
//!   Disarmed ◄─────────┘ Disarmed                  Watching                  │
//!      ▲                                                                     │
//!      └──────────────── Disarmed (from Prealarm and Alarm too) ─────────────┘
//! ```
//!
//! Any (state, event) pair not drawn above is a no-op.

use crate::core::{AlarmLineState, InputEvent};

/// What happens to the delay timer when a transition applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimerAction {
    /// Leave the timer slot alone
    Keep,
    /// Start the arming delay
    Start,
    /// Cancel whatever is outstanding
    Cancel,
}

/// A row of the table that applies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Transition {
    pub to: AlarmLineState,
    pub timer: TimerAction,
}

impl Transition {
    const fn to(to: AlarmLineState, timer: TimerAction) -> Self {
        Self { to, timer }
    }
}

/// Look up the transition for `(from, event)`.
///
/// Pure and total: `None` means the event is a no-op in that state and
/// must neither change state nor touch the timer.
pub fn transition(from: AlarmLineState, event: &InputEvent) -> Option<Transition> {
    use AlarmLineState::*;
    use TimerAction::*;

    match (from, event) {
        (Init, InputEvent::Disarmed) => Some(Transition::to(Disarmed, Cancel)),
        (Init | Disarmed, InputEvent::Armed) => Some(Transition::to(Watching, Keep)),

        (Watching | Prealarm | Alarm, InputEvent::Disarmed) => {
            Some(Transition::to(Disarmed, Cancel))
        }

        (Watching, InputEvent::SignalActive) => Some(Transition::to(Prealarm, Start)),
        (Prealarm, InputEvent::SignalInactive) => Some(Transition::to(Watching, Cancel)),
        (Prealarm, InputEvent::TimerExpired { .. }) => Some(Transition::to(Alarm, Keep)),

        _ => None,
    }
}
