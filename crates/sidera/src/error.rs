//! Errors raised by chart computations.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur while deriving chart relationships
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ChartError {
    #[error("Invalid orb {value} for {object} ({aspect}): orbs must be finite and non-negative")]
    InvalidOrb {
        object: String,
        aspect: String,
        value: f64,
    },
    #[error("Invalid position for {object}: {reason}")]
    InvalidPosition { object: String, reason: String },
    #[error("Cannot resolve chart shape: {reason}")]
    UnresolvableShape { reason: String },
    #[error("Ambiguous midpoint for {object}: {lon_a} and {lon_b} are exactly opposite and no tie-break is configured")]
    AmbiguousMidpoint {
        object: String,
        lon_a: f64,
        lon_b: f64,
    },
    #[error("{operation} requires {object}, which is missing from the position set")]
    MissingObject { object: String, operation: String },
    #[error("{operation} requires an ephemeris provider")]
    EphemerisUnavailable { operation: String },
    #[error("Ephemeris lookup failed: {message}")]
    Ephemeris { message: String },
    #[error("Converse progression not permitted: target {target} precedes natal moment {natal}")]
    ConverseProgression {
        natal: DateTime<Utc>,
        target: DateTime<Utc>,
    },
    #[error("Invalid setting {setting}: {reason}")]
    InvalidSettings { setting: String, reason: String },
}

impl ChartError {
    pub(crate) fn invalid_position(object: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPosition {
            object: object.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_setting(setting: &str, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            setting: setting.to_string(),
            reason: reason.into(),
        }
    }

    pub(crate) fn missing(object: &str, operation: &str) -> Self {
        Self::MissingObject {
            object: object.to_string(),
            operation: operation.to_string(),
        }
    }
}
