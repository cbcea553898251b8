//! Contact polarity and raw level normalization.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Electrical quiescent state of a sensor contact.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContactType {
    /// Quiescent open; a raw `true` means triggered.
    #[default]
    NormallyOpen,
    /// Quiescent closed; a raw `false` means triggered.
    NormallyClosed,
}

/// Logical reading of a line after polarity is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    Active,
    Inactive,
}

impl Signal {
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl ContactType {
    /// Interpret a raw level against this polarity.
    ///
    /// Total over its input: every raw level maps to exactly one signal.
    ///
    /// ```
    /// use alarmline::core::{ContactType, Signal};
    ///
    /// assert_eq!(ContactType::NormallyOpen.normalize(true), Signal::Active);
    /// assert_eq!(ContactType::NormallyClosed.normalize(true), Signal::Inactive);
    /// ```
    pub fn normalize(self, raw: bool) -> Signal {
        let active = match self {
            Self::NormallyOpen => raw,
            Self::NormallyClosed => !raw,
        };
        if active {
            Signal::Active
        } else {
            Signal::Inactive
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown contact type '{0}' (expected NO or NC)")]
pub struct UnknownContactType(pub String);

impl FromStr for ContactType {
    type Err = UnknownContactType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| !matches!(c, '_' | '-' | ' '))
            .collect::<String>()
            .to_ascii_lowercase();

        match normalized.as_str() {
            "no" | "normallyopen" => Ok(Self::NormallyOpen),
            "nc" | "normallyclosed" => Ok(Self::NormallyClosed),
            _ => Err(UnknownContactType(s.to_string())),
        }
    }
}

impl fmt::Display for ContactType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NormallyOpen => f.write_str("NO"),
            Self::NormallyClosed => f.write_str("NC"),
        }
    }
}
