//! The alarm line state machine.

use super::table::{self, TimerAction};
use crate::core::{AlarmLineState, InputEvent, TransitionEvent};
use crate::effects::DelayTimer;
use std::time::Duration;
use tracing::{debug, info};

/// Transition record emitted by an alarm line.
pub type AlarmTransition = TransitionEvent<AlarmLineState>;

/// Finite-state controller for one alarm line.
///
/// Sole owner of the current state and of the single delay timer slot.
/// Callers serialize access; the machine itself is not shared.
///
/// # Example
///
/// ```rust
/// use alarmline::core::{AlarmLineState, InputEvent};
/// use alarmline::effects::ManualTimer;
/// use alarmline::machine::AlarmStateMachine;
/// use std::time::Duration;
///
/// let mut machine = AlarmStateMachine::new(Duration::from_secs(5), ManualTimer::new());
/// machine.handle_event(InputEvent::Armed);
/// machine.handle_event(InputEvent::SignalActive);
/// assert_eq!(machine.current_state(), AlarmLineState::Prealarm);
///
/// let generation = machine.timer_mut().fire().unwrap();
/// machine.handle_event(InputEvent::TimerExpired { generation });
/// assert_eq!(machine.current_state(), AlarmLineState::Alarm);
/// ```
pub struct AlarmStateMachine<T: DelayTimer> {
    current: AlarmLineState,
    previous: Option<AlarmLineState>,
    arming_delay: Duration,
    timer: T,
    pending: Option<u64>,
    last_generation: u64,
}

impl<T: DelayTimer> AlarmStateMachine<T> {
    /// Create a machine in [`AlarmLineState::Init`] with an idle timer.
    pub fn new(arming_delay: Duration, timer: T) -> Self {
        Self {
            current: AlarmLineState::Init,
            previous: None,
            arming_delay,
            timer,
            pending: None,
            last_generation: 0,
        }
    }

    /// Get current state (pure)
    pub fn current_state(&self) -> AlarmLineState {
        self.current
    }

    /// State before the most recent transition, if any.
    pub fn previous_state(&self) -> Option<AlarmLineState> {
        self.previous
    }

    pub fn arming_delay(&self) -> Duration {
        self.arming_delay
    }

    /// Replace the arming delay used by future timer starts.
    ///
    /// An outstanding countdown keeps the delay it was started with.
    pub fn set_arming_delay(&mut self, arming_delay: Duration) {
        self.arming_delay = arming_delay;
    }

    /// Generation of the countdown the machine is waiting on.
    pub fn pending_timer(&self) -> Option<u64> {
        self.pending
    }

    pub fn has_pending_timer(&self) -> bool {
        self.pending.is_some()
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    /// Apply one input.
    ///
    /// Returns the committed transition, or `None` when the input is a
    /// no-op in the current state. An expiry whose generation is not the
    /// outstanding one was cancelled or superseded and is discarded.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<AlarmTransition> {
        if let InputEvent::TimerExpired { generation } = event {
            if self.pending != Some(generation) {
                debug!(
                    generation,
                    pending = ?self.pending,
                    state = %self.current,
                    "Discarding stale timer expiry"
                );
                return None;
            }
            self.pending = None;
        }

        let Some(step) = table::transition(self.current, &event) else {
            debug!(state = %self.current, ?event, "Event ignored");
            return None;
        };

        match step.timer {
            TimerAction::Keep => {}
            TimerAction::Start => self.start_timer(),
            TimerAction::Cancel => self.cancel_timer(),
        }

        let from = self.current;
        self.previous = Some(from);
        self.current = step.to;

        let record = TransitionEvent::new(from, step.to, event.cause());
        info!(
            from = %from,
            to = %step.to,
            cause = ?record.cause,
            "Alarm line transition"
        );
        Some(record)
    }

    /// Cancel any outstanding countdown ahead of discarding the machine.
    pub fn teardown(&mut self) {
        self.cancel_timer();
    }

    fn start_timer(&mut self) {
        self.last_generation += 1;
        let generation = self.last_generation;
        self.timer.start(self.arming_delay, generation);
        self.pending = Some(generation);
    }

    fn cancel_timer(&mut self) {
        self.pending = None;
        self.timer.cancel();
    }
}
