//! User-entered fields of an alarm line instance.
//!
//! Every field is checked and all problems are accumulated, so the user
//! sees the full list in one pass instead of fixing fields one at a time.

use crate::builder::error::{ConfigurationError, FieldError};
use crate::core::{AlarmLineConfig, ContactType};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

pub const FIELD_NAME: &str = "name";
pub const FIELD_PORT: &str = "portId";
pub const FIELD_CONTACT_TYPE: &str = "inactiveState";
pub const FIELD_DELAY_TIME: &str = "delayTime";

/// Shape of a configurable field, for hosts that render forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct FieldDefinition {
    pub key: &'static str,
    pub required: bool,
    /// Value assumed when the field is absent or blank.
    pub default: Option<&'static str>,
}

pub const FIELD_DEFINITIONS: [FieldDefinition; 4] = [
    FieldDefinition {
        key: FIELD_NAME,
        required: true,
        default: None,
    },
    FieldDefinition {
        key: FIELD_PORT,
        required: true,
        default: None,
    },
    FieldDefinition {
        key: FIELD_CONTACT_TYPE,
        required: false,
        default: Some("NO"),
    },
    FieldDefinition {
        key: FIELD_DELAY_TIME,
        required: false,
        default: Some("0"),
    },
];

/// A stored instance as handed over by the persistence layer.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceDto {
    pub id: u64,
    #[serde(default)]
    pub fields: HashMap<String, Option<String>>,
}

impl InstanceDto {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            fields: HashMap::new(),
        }
    }

    pub fn with_field(mut self, key: &str, value: impl Into<String>) -> Self {
        self.fields.insert(key.to_string(), Some(value.into()));
        self
    }

    /// Trimmed value of `key`; blank counts as absent.
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Option::as_deref)
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }
}

/// Fields that passed validation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ValidatedFields {
    pub name: String,
    pub config: AlarmLineConfig,
}

type FieldCheck = Validation<(), NonEmptyVec<FieldError>>;

fn check<T>(parsed: &Result<T, FieldError>) -> FieldCheck {
    match parsed {
        Ok(_) => Validation::success(()),
        Err(error) => Validation::fail(error.clone()),
    }
}

fn required_text(instance: &InstanceDto, key: &'static str) -> Result<String, FieldError> {
    instance
        .field(key)
        .map(str::to_string)
        .ok_or_else(|| FieldError::new(key, "is required"))
}

fn contact_type(instance: &InstanceDto) -> Result<ContactType, FieldError> {
    match instance.field(FIELD_CONTACT_TYPE) {
        None => Ok(ContactType::default()),
        Some(text) => text
            .parse()
            .map_err(|error| FieldError::new(FIELD_CONTACT_TYPE, format!("{error}"))),
    }
}

/// Bare integers are seconds; anything else goes through humantime.
fn delay_time(instance: &InstanceDto) -> Result<Duration, FieldError> {
    let Some(text) = instance.field(FIELD_DELAY_TIME) else {
        return Ok(Duration::ZERO);
    };

    if let Ok(seconds) = text.parse::<u64>() {
        return Ok(Duration::from_secs(seconds));
    }

    humantime::parse_duration(text).map_err(|error| {
        FieldError::new(
            FIELD_DELAY_TIME,
            format!("'{text}' is not a non-negative duration ({error})"),
        )
    })
}

/// Check every field of `instance`, accumulating ALL failures.
pub fn validate(instance: &InstanceDto) -> Result<ValidatedFields, ConfigurationError> {
    let name = required_text(instance, FIELD_NAME);
    let port = required_text(instance, FIELD_PORT);
    let contact = contact_type(instance);
    let delay = delay_time(instance);

    let outcome =
        Validation::all_vec(vec![check(&name), check(&port), check(&contact), check(&delay)])
            .map(|_| ());

    if let Validation::Failure(errors) = outcome {
        return Err(ConfigurationError {
            errors: errors.iter().cloned().collect(),
        });
    }

    Ok(ValidatedFields {
        name: name?,
        config: AlarmLineConfig {
            contact_type: contact?,
            arming_delay: delay?,
            source_input_id: port?,
        },
    })
}
