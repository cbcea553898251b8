//! Errors raised while turning a configured instance into a running line.

use crate::ports::ResolutionError;
use thiserror::Error;

/// A problem with one user-entered field.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct FieldError {
    /// Key of the offending field
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Every field problem found in one instance. Never empty.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid configuration: {}", summarize(.errors))]
pub struct ConfigurationError {
    pub errors: Vec<FieldError>,
}

impl ConfigurationError {
    /// Errors reported against `field`.
    pub fn for_field(&self, field: &str) -> impl Iterator<Item = &FieldError> + '_ {
        let field = field.to_string();
        self.errors.iter().filter(move |error| error.field == field)
    }
}

impl From<FieldError> for ConfigurationError {
    fn from(error: FieldError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

fn summarize(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Why an alarm line could not be built.
///
/// Both variants are local to the instance being built.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AlarmLineError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    Resolution(#[from] ResolutionError),
}
