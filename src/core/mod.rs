//! Core alarm line types and logic.
//!
//! This module contains the pure parts of an alarm line:
//! - State definitions via the `State` trait
//! - Contact polarity normalization
//! - Machine inputs and transition records
//! - Line configuration
//!
//! Nothing here performs I/O or touches a clock other than stamping
//! transition records.

mod config;
mod contact;
mod event;
mod state;

pub use config::{AlarmLineConfig, StartPolicy, UnitOptions, DEFAULT_PUBLISH_TIMEOUT};
pub use contact::{ContactType, Signal, UnknownContactType};
pub use event::{Cause, InputEvent, TransitionEvent};
pub use state::{AlarmLineState, State, StateDescriptor, StateId};
