//! Error taxonomy shared by the definition builders, the LOV service and the
//! extension registry.
//!
//! Configuration errors abort model registration. Everything else is a
//! per-request failure that the response envelope maps to a status code.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// A single rejected field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for FieldViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Errors raised by fieldforge operations.
#[derive(Error, Debug, Clone)]
pub enum FieldforgeError {
    /// Broken model or rule declarations, detected at build time
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Client-supplied data was rejected
    #[error("{message}")]
    Validation {
        message: String,
        violations: Vec<FieldViolation>,
    },

    /// Caller may not access the extension point or LOV
    #[error("Unauthorized: {0}")]
    Authorization(String),

    /// Unknown extension, field, model or LOV
    #[error("Not found: {0}")]
    NotFound(String),

    /// Storage uniqueness conflict that survived the internal retry
    #[error("Storage conflict: {0}")]
    StorageConflict(String),

    /// Unanticipated failure; never shown verbatim to clients
    #[error("Internal error: {0}")]
    Internal(String),
}

impl FieldforgeError {
    pub fn configuration(message: impl Into<String>) -> Self {
        FieldforgeError::Configuration(message.into())
    }

    /// Validation failure without a specific field.
    pub fn invalid(message: impl Into<String>) -> Self {
        FieldforgeError::Validation {
            message: message.into(),
            violations: Vec::new(),
        }
    }

    /// Validation failure for one named field.
    pub fn invalid_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::invalid_fields(vec![FieldViolation::new(field, message)])
    }

    /// Validation failure listing every offending field.
    pub fn invalid_fields(violations: Vec<FieldViolation>) -> Self {
        let details = violations
            .iter()
            .map(|v| format!("field '{}' - {}", v.field, v.message))
            .collect::<Vec<_>>()
            .join("; ");

        FieldforgeError::Validation {
            message: format!("Invalid values specified: {}", details),
            violations,
        }
    }

    /// Fields named by a validation failure (empty for other kinds).
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            FieldforgeError::Validation { violations, .. } => violations,
            _ => &[],
        }
    }
}

pub type Result<T> = std::result::Result<T, FieldforgeError>;
