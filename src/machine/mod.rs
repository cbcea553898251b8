//! The alarm line state machine and its transition table.
//!
//! The table is a pure function; the machine applies it, owns the current
//! state and the delay timer slot, and emits one [`TransitionEvent`] per
//! committed change.
//!
//! [`TransitionEvent`]: crate::core::TransitionEvent

mod alarm;
pub mod table;

pub use alarm::{AlarmStateMachine, AlarmTransition};
pub use table::{TimerAction, Transition};
