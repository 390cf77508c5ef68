//! List-of-values resolution.
//!
//! - Static LOVs are backed by declared enumerations.
//! - Dynamic LOVs are backed by registered providers, optionally filtered by
//!   the value of a parent field.
//! - Stored LOVs are editable value lists kept by the service.

pub mod enums;
pub mod pattern_cache;
pub mod provider;
pub mod service;

use thiserror::Error;

use crate::error::FieldforgeError;

pub use enums::{EnumConstant, EnumRegistry};
pub use pattern_cache::{CompiledPattern, PatternCache};
pub use provider::{
    Dependent, InMemoryRowSource, LovProvider, LovProviderRegistry, QueryLovProvider, Row,
    RowSource,
};
pub use service::LovService;

#[derive(Error, Debug, Clone)]
pub enum LovError {
    #[error("Unknown LOV '{0}'")]
    NotFound(String),

    #[error("Not authorized to access LOV '{0}'")]
    Unauthorized(String),

    #[error("LOV provider '{name}' failed: {reason}")]
    Provider { name: String, reason: String },

    #[error("Invalid label pattern '{pattern}': {reason}")]
    Pattern { pattern: String, reason: String },
}

impl From<LovError> for FieldforgeError {
    fn from(err: LovError) -> Self {
        match err {
            LovError::NotFound(_) => FieldforgeError::NotFound(err.to_string()),
            LovError::Unauthorized(_) => FieldforgeError::Authorization(err.to_string()),
            LovError::Provider { .. } => FieldforgeError::Internal(err.to_string()),
            LovError::Pattern { .. } => FieldforgeError::Configuration(err.to_string()),
        }
    }
}
