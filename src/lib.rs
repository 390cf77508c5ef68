//! # Fieldforge: Metadata-Driven Model Definitions
//!
//! Fieldforge turns declared models into client-consumable definitions and
//! lets administrators attach extra fields to registered entity types.
//!
//! ## Features
//!
//! - **Model definitions**: labels, field types, LOV bindings and validation descriptors derived from YAML or builder declarations
//! - **Validation mapping**: declared rules mapped to client validation kinds over a value-kind lineage, with templated messages
//! - **Extension fields**: per-owner field definitions, storage column allocation and value validation
//! - **Lists of values**: enumeration-backed, provider/query-backed (optionally dependent) and stored LOVs
//!
//! ## Example: Model Declaration
//!
//! ```yaml
//! model:
//!   name: Customer
//!   qualified_name: crm.Customer
//!   marker: {}
//!   extendable: { name: customer }
//!   extensible: true
//!   fields:
//!     - name: name
//!       type: String
//!       validations:
//!         - rule: Required
//!         - rule: MaxLen
//!           attributes: { value: 100 }
//!     - name: status
//!       type: enum:Status
//!     - name: state
//!       type: Long
//!       lov: { name: states }
//!     - name: city
//!       type: Long
//!       lov: { name: cities, parent_field: state }
//! ```
//!
//! ## Example: Describing a Model
//!
//! ```ignore
//! use fieldforge::{Engine, EngineConfig};
//!
//! let engine = Engine::from_config(EngineConfig::from_file("fieldforge.yaml")?)?;
//! let customer = engine.models().model_def("Customer")?;
//! println!("{}", serde_json::to_string_pretty(&*customer)?);
//! ```

// Core modules
pub mod catalog;
pub mod error;
pub mod label;
pub mod security;

// Declarations, definitions and their builders
pub mod model;
pub mod validation;

// Lists of values and extension fields
pub mod extension;
pub mod lov;

// Wiring and outer surfaces
pub mod api;
pub mod config;
pub mod engine;
pub mod response;

// Re-export key types
pub use catalog::{CatalogError, EmptyMessages, MessageCatalog, MessageSource};
pub use error::{FieldViolation, FieldforgeError, Result};
pub use label::{humanize, humanize_constant, ElementNames, LabelResolver};
pub use security::{ExtensionOwner, SecurityContext, StaticSecurityContext};

pub use model::{
    FieldDecl, FieldDef, FieldType, LovDecl, LovDetails, LovOption, LovType, Model, ModelDecl,
    ModelDef, ModelRegistry, ValidationDecl, ValidationDef, ValueType,
};
pub use validation::{ValidationRegistry, ValidationRuleMapper};

pub use extension::{
    ExtendedRecord, ExtensionFieldModel, ExtensionPoint, ExtensionService, InMemoryExtensionStore,
    InMemoryRecordStore,
};
pub use lov::{EnumConstant, EnumRegistry, LovError, LovProvider, LovService};

pub use config::EngineConfig;
pub use engine::Engine;
pub use response::Response;
