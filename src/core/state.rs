//! State trait and the alarm line's closed state set.
//!
//! States are plain `Copy` values with stable identifiers and
//! human-readable labels. Presentation (icons, translations) is keyed by
//! [`StateId`] and lives outside this crate.

use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Stable identifier of a state, as exchanged with the host.
pub type StateId = &'static str;

/// Trait for automation unit states.
///
/// All methods are pure. Implementations are usually generated with
/// [`state_enum!`](crate::state_enum).
///
/// # Example
///
/// ```rust
/// use alarmline::core::State;
/// use alarmline::state_enum;
///
/// state_enum! {
///     pub enum GateState {
///         Closed => ("closed", "Closed"),
///         Forced => ("forced", "Forced open"),
///     }
///     alarm: [Forced]
/// }
///
/// assert_eq!(GateState::Forced.id(), "forced");
/// assert!(GateState::Forced.is_alarm());
/// assert_eq!(GateState::descriptors().len(), 2);
/// ```
pub trait State:
    Copy + Eq + Debug + Serialize + for<'de> Deserialize<'de> + Send + Sync + 'static
{
    /// Identifier used by the host to reference this state.
    fn id(&self) -> StateId;

    /// Human-readable label for display.
    fn label(&self) -> &'static str;

    /// Whether this state represents a declared alarm condition.
    ///
    /// Default implementation returns `false`.
    fn is_alarm(&self) -> bool {
        false
    }

    /// Display descriptor for this state.
    ///
    /// States driven by sensors are never user-selectable, so descriptors
    /// are read-only unless an implementation says otherwise.
    fn descriptor(&self) -> StateDescriptor {
        StateDescriptor {
            id: self.id(),
            label: self.label(),
            read_only: true,
        }
    }
}

/// What the host needs to list a state: its id, a label, and whether a
/// user may pick it manually.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct StateDescriptor {
    pub id: StateId,
    pub label: &'static str,
    pub read_only: bool,
}

crate::state_enum! {
    /// Position of an alarm line. Exactly one is current at any instant.
    #[serde(rename_all = "snake_case")]
    pub enum AlarmLineState {
        /// Constructed, not yet evaluated against the arming policy.
        Init => ("init", "Unknown"),
        Disarmed => ("disarmed", "Disarmed"),
        /// Armed and quiescent.
        Watching => ("watching", "Watching"),
        /// Triggered, arming delay running.
        Prealarm => ("prealarm", "Prealarm"),
        /// Sticky until disarmed.
        Alarm => ("alarm", "Alarm"),
    }
    alarm: [Alarm]
}

impl Default for AlarmLineState {
    fn default() -> Self {
        Self::Init
    }
}
