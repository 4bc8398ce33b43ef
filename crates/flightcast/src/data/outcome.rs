//! Arrival outcome keys.
//!
//! An [`Outcome`] is the classification target: a flight is either cancelled
//! (with a cancellation reason code), diverted, or arrives in one of the
//! on-time/delay groups.
//!
//! The textual form is `cancel:<code>`, `delay:<group>` or `divert`, which is
//! also the form used as map keys in the persisted model.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Classification target for a single flight.
///
/// Ordering is canonical and used for deterministic tie-breaking:
/// cancellations sorted by code, then delay groups sorted numerically,
/// then `Divert`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Outcome {
    /// Flight was cancelled with the given reason code (e.g. `A`).
    Cancel(String),
    /// Flight arrived in the given arrival-delay group (e.g. `-1`, `0`, `3`).
    Delay(i32),
    /// Flight was diverted to another airport.
    Divert,
}

impl Outcome {
    /// Prefix used for cancellation keys.
    pub const CANCEL_PREFIX: &'static str = "cancel:";
    /// Prefix used for delay keys.
    pub const DELAY_PREFIX: &'static str = "delay:";
    /// Literal key for diversions.
    pub const DIVERT_KEY: &'static str = "divert";

    /// Cancellation outcome.
    pub fn cancel(code: impl Into<String>) -> Self {
        Self::Cancel(code.into())
    }

    /// Delay-group outcome.
    pub fn delay(group: i32) -> Self {
        Self::Delay(group)
    }

    /// Returns true for cancellation outcomes.
    pub fn is_cancel(&self) -> bool {
        matches!(self, Self::Cancel(_))
    }

    /// Returns true for delay outcomes.
    pub fn is_delay(&self) -> bool {
        matches!(self, Self::Delay(_))
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cancel(code) => write!(f, "{}{}", Self::CANCEL_PREFIX, code),
            Self::Delay(group) => write!(f, "{}{}", Self::DELAY_PREFIX, group),
            Self::Divert => f.write_str(Self::DIVERT_KEY),
        }
    }
}

/// Error returned when a string is not a valid outcome key.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid outcome key {0:?}: expected `cancel:<code>`, `delay:<group>` or `divert`")]
pub struct ParseOutcomeError(pub String);

impl FromStr for Outcome {
    type Err = ParseOutcomeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == Self::DIVERT_KEY {
            return Ok(Self::Divert);
        }
        if let Some(code) = s.strip_prefix(Self::CANCEL_PREFIX) {
            if code.is_empty() {
                return Err(ParseOutcomeError(s.to_string()));
            }
            return Ok(Self::Cancel(code.to_string()));
        }
        if let Some(group) = s.strip_prefix(Self::DELAY_PREFIX) {
            return group
                .trim()
                .parse::<i32>()
                .map(Self::Delay)
                .map_err(|_| ParseOutcomeError(s.to_string()));
        }
        Err(ParseOutcomeError(s.to_string()))
    }
}

impl TryFrom<String> for Outcome {
    type Error = ParseOutcomeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Outcome> for String {
    fn from(value: Outcome) -> Self {
        value.to_string()
    }
}
