//! Alarmline: intrusion-detection alarm lines for binary contact sensors
//!
//! An alarm line watches one binary input (a door contact, a PIR relay, a
//! tamper loop), interprets it according to its contact polarity, and
//! drives a small state machine: `Disarmed`, `Watching`, `Prealarm` while
//! an arming delay counts down, and a sticky `Alarm` that only disarming
//! clears.
//!
//! The crate follows a "pure core, imperative shell" layout:
//!
//! - **core**: states, contact normalization, inputs and transition records
//! - **machine**: the transition table and the machine that applies it
//! - **effects**: the delay timer and the transition publisher
//! - **ports**: the input abstraction and port resolution
//! - **builder**: field validation and the unit factory
//! - **unit**: the running per-line worker
//!
//! # Example
//!
//! ```rust
//! use alarmline::core::{AlarmLineState, InputEvent};
//! use alarmline::effects::ManualTimer;
//! use alarmline::machine::AlarmStateMachine;
//! use std::time::Duration;
//!
//! let mut line = AlarmStateMachine::new(Duration::from_secs(5), ManualTimer::new());
//!
//! line.handle_event(InputEvent::Disarmed);
//! line.handle_event(InputEvent::Armed);
//! line.handle_event(InputEvent::SignalActive);
//! assert_eq!(line.current_state(), AlarmLineState::Prealarm);
//!
//! let generation = line.timer_mut().fire().unwrap();
//! let event = line
//!     .handle_event(InputEvent::TimerExpired { generation })
//!     .unwrap();
//! assert!(event.raises_alarm());
//! assert_eq!(line.current_state(), AlarmLineState::Alarm);
//! ```

pub mod builder;
pub mod core;
pub mod effects;
pub mod machine;
pub mod ports;
pub mod unit;

// Re-export commonly used types
pub use builder::{AlarmLineError, AlarmLineFactory, ConfigurationError, FieldError, InstanceDto};
pub use core::{AlarmLineConfig, AlarmLineState, ContactType, State, TransitionEvent};
pub use effects::{Announcement, BroadcastBus, EventBus};
pub use ports::{BinaryInput, InputResolver, MemoryInput, PortRegistry};
pub use unit::{AlarmLineUnit, AutomationUnit, UnitError};
