//! Alarm line configuration and runtime options.

use super::contact::ContactType;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Delivery bound used when no option overrides it.
pub const DEFAULT_PUBLISH_TIMEOUT: Duration = Duration::from_secs(2);

/// Validated configuration of one alarm line.
///
/// Immutable; a running line is reconfigured by replacing it wholesale.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmLineConfig {
    /// Which raw level means triggered.
    pub contact_type: ContactType,
    /// Grace period between a triggering signal and the alarm. Zero
    /// escalates on the next step.
    pub arming_delay: Duration,
    /// Opaque id resolved to a live binary input by the host.
    pub source_input_id: String,
}

impl AlarmLineConfig {
    pub fn new(source_input_id: impl Into<String>) -> Self {
        Self {
            contact_type: ContactType::default(),
            arming_delay: Duration::ZERO,
            source_input_id: source_input_id.into(),
        }
    }

    pub fn with_contact_type(mut self, contact_type: ContactType) -> Self {
        self.contact_type = contact_type;
        self
    }

    pub fn with_arming_delay(mut self, arming_delay: Duration) -> Self {
        self.arming_delay = arming_delay;
        self
    }
}

/// Whether the system considers lines armed when a unit starts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPolicy {
    Armed,
    #[default]
    Disarmed,
}

/// Options that shape a running unit but are not user fields.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitOptions {
    /// Longest time one delivery attempt may take before it is abandoned.
    pub publish_timeout: Duration,
    pub start_policy: StartPolicy,
}

impl Default for UnitOptions {
    fn default() -> Self {
        Self {
            publish_timeout: DEFAULT_PUBLISH_TIMEOUT,
            start_policy: StartPolicy::default(),
        }
    }
}
