//! Administrator-defined extension fields.
//!
//! An extension point is a fixed entity type that accepts extra fields. Each
//! owner gets its own extension instance, its own field definitions, and its
//! own allocation of the generic storage columns.

pub mod columns;
pub mod entity;
pub mod service;
pub mod store;
pub mod values;

pub use columns::ColumnAllocator;
pub use entity::{ExtendedRecord, ExtensionEntity, ExtensionFieldEntity, ExtensionFieldModel, ExtensionPoint};
pub use service::{ExtensionLimits, ExtensionService};
pub use store::{
    ExtendedRecordStore, ExtensionStore, InMemoryExtensionStore, InMemoryRecordStore, StoreError,
    StoreResult, UniqueConstraint,
};
pub use values::ExtensionValueValidator;
