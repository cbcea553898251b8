//! Machine inputs and the transition records it emits.

use super::contact::Signal;
use super::state::State;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Input accepted by the alarm state machine.
///
/// Malformed input is rejected at the caller's boundary; every value of
/// this type is handled, most of them as no-ops.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    Armed,
    Disarmed,
    SignalActive,
    SignalInactive,
    /// Expiry of the delay timer started with `generation`.
    TimerExpired { generation: u64 },
}

impl From<Signal> for InputEvent {
    fn from(signal: Signal) -> Self {
        match signal {
            Signal::Active => Self::SignalActive,
            Signal::Inactive => Self::SignalInactive,
        }
    }
}

impl InputEvent {
    /// The reason recorded on a transition caused by this input.
    pub fn cause(&self) -> Cause {
        match self {
            Self::Armed => Cause::Armed,
            Self::Disarmed => Cause::Disarmed,
            Self::SignalActive => Cause::SignalActive,
            Self::SignalInactive => Cause::SignalInactive,
            Self::TimerExpired { .. } => Cause::DelayElapsed,
        }
    }
}

/// Why a transition happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cause {
    Armed,
    Disarmed,
    SignalActive,
    SignalInactive,
    DelayElapsed,
}

/// Record of a single committed state change.
///
/// Produced once per transition and never mutated afterwards.
///
/// # Example
///
/// ```rust
/// use alarmline::core::{AlarmLineState, Cause, TransitionEvent};
///
/// let event = TransitionEvent::new(
///     AlarmLineState::Watching,
///     AlarmLineState::Prealarm,
///     Cause::SignalActive,
/// );
/// assert_eq!(event.to, AlarmLineState::Prealarm);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct TransitionEvent<S: State> {
    /// Unique id, lets subscribers drop duplicate deliveries
    pub id: Uuid,
    /// The state being transitioned from
    pub from: S,
    /// The state being transitioned to
    pub to: S,
    /// When the transition was committed
    pub timestamp: DateTime<Utc>,
    /// The input that caused it
    pub cause: Cause,
}

impl<S: State> TransitionEvent<S> {
    /// Stamp a new transition with a fresh id and the current time.
    pub fn new(from: S, to: S, cause: Cause) -> Self {
        Self {
            id: Uuid::new_v4(),
            from,
            to,
            timestamp: Utc::now(),
            cause,
        }
    }

    /// Whether this transition declared an alarm.
    pub fn raises_alarm(&self) -> bool {
        self.to.is_alarm() && !self.from.is_alarm()
    }
}
