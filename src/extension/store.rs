//! Persistence seams for extension metadata and extended records.
//!
//! The in-memory stores enforce the same uniqueness constraints a relational
//! schema would, so conflicts surface the same way in tests and production.

use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;

use super::entity::{ExtendedRecord, ExtensionEntity, ExtensionFieldEntity};
use crate::error::FieldforgeError;
use crate::security::ExtensionOwner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueConstraint {
    /// (space, target entity type, owner)
    ExtensionOwner,
    /// (space, name)
    ExtensionName,
    /// (extension, name)
    FieldName,
    /// (extension, column name)
    FieldColumn,
    /// (extension, label)
    FieldLabel,
}

impl fmt::Display for UniqueConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            UniqueConstraint::ExtensionOwner => "extension owner",
            UniqueConstraint::ExtensionName => "extension name",
            UniqueConstraint::FieldName => "field name",
            UniqueConstraint::FieldColumn => "field column",
            UniqueConstraint::FieldLabel => "field label",
        };
        write!(f, "{}", name)
    }
}

#[derive(Error, Debug, Clone)]
pub enum StoreError {
    #[error("Unique constraint violated: {constraint} '{value}'")]
    UniqueViolation {
        constraint: UniqueConstraint,
        value: String,
    },

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    Backend(String),
}

impl From<StoreError> for FieldforgeError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::UniqueViolation {
                constraint: UniqueConstraint::FieldColumn,
                ..
            } => FieldforgeError::StorageConflict(err.to_string()),
            StoreError::UniqueViolation { constraint, value } => {
                FieldforgeError::invalid(format!("Duplicate {} '{}'", constraint, value))
            }
            StoreError::NotFound(_) => FieldforgeError::NotFound(err.to_string()),
            StoreError::Backend(_) => FieldforgeError::Internal(err.to_string()),
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Persistence operations for extension instances and their fields.
pub trait ExtensionStore: Send + Sync {
    fn find_extension(
        &self,
        space: &str,
        target_entity_type: &str,
        owner: Option<&ExtensionOwner>,
    ) -> StoreResult<Option<ExtensionEntity>>;

    /// Insert an extension instance, assigning its id.
    fn insert_extension(&self, extension: ExtensionEntity) -> StoreResult<ExtensionEntity>;

    fn fields(&self, extension_id: i64) -> StoreResult<Vec<ExtensionFieldEntity>>;

    fn field(&self, field_id: i64) -> StoreResult<Option<ExtensionFieldEntity>>;

    fn used_column_names(&self, extension_id: i64) -> StoreResult<Vec<String>>;

    /// Insert a field, assigning its id.
    fn insert_field(&self, field: ExtensionFieldEntity) -> StoreResult<ExtensionFieldEntity>;

    fn update_field(&self, field: ExtensionFieldEntity) -> StoreResult<ExtensionFieldEntity>;

    fn delete_field(&self, field_id: i64) -> StoreResult<()>;

    /// Delete every extension in `space` with its fields; returns the number of fields removed.
    fn delete_space(&self, space: &str) -> StoreResult<usize>;
}

/// Storage of parent entities carrying extended values.
pub trait ExtendedRecordStore: Send + Sync {
    /// Insert (`id == 0`) or replace a record.
    fn save_record(&self, record: ExtendedRecord) -> StoreResult<ExtendedRecord>;

    fn record(&self, entity_type: &str, id: i64) -> StoreResult<Option<ExtendedRecord>>;

    fn count(&self, entity_type: &str) -> StoreResult<usize>;
}

#[derive(Default)]
struct ExtensionTables {
    next_id: i64,
    extensions: Vec<ExtensionEntity>,
    fields: Vec<ExtensionFieldEntity>,
}

impl ExtensionTables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn check_field(&self, field: &ExtensionFieldEntity) -> StoreResult<()> {
        for existing in self
            .fields
            .iter()
            .filter(|f| f.extension_id == field.extension_id && f.id != field.id)
        {
            let conflict = if existing.name == field.name {
                Some((UniqueConstraint::FieldName, &field.name))
            } else if existing.column_name == field.column_name {
                Some((UniqueConstraint::FieldColumn, &field.column_name))
            } else if existing.label == field.label {
                Some((UniqueConstraint::FieldLabel, &field.label))
            } else {
                None
            };

            if let Some((constraint, value)) = conflict {
                return Err(StoreError::UniqueViolation {
                    constraint,
                    value: value.clone(),
                });
            }
        }
        Ok(())
    }
}

/// Extension store kept in process memory.
#[derive(Default)]
pub struct InMemoryExtensionStore {
    tables: RwLock<ExtensionTables>,
}

impl InMemoryExtensionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, ExtensionTables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("extension tables lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, ExtensionTables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("extension tables lock poisoned".to_string()))
    }
}

impl ExtensionStore for InMemoryExtensionStore {
    fn find_extension(
        &self,
        space: &str,
        target_entity_type: &str,
        owner: Option<&ExtensionOwner>,
    ) -> StoreResult<Option<ExtensionEntity>> {
        Ok(self
            .read()?
            .extensions
            .iter()
            .find(|e| e.space == space && e.target_entity_type == target_entity_type && e.owner.as_ref() == owner)
            .cloned())
    }

    fn insert_extension(&self, mut extension: ExtensionEntity) -> StoreResult<ExtensionEntity> {
        let mut tables = self.write()?;

        for existing in tables.extensions.iter().filter(|e| e.space == extension.space) {
            if existing.target_entity_type == extension.target_entity_type && existing.owner == extension.owner {
                return Err(StoreError::UniqueViolation {
                    constraint: UniqueConstraint::ExtensionOwner,
                    value: extension.name.clone(),
                });
            }
            if existing.name == extension.name {
                return Err(StoreError::UniqueViolation {
                    constraint: UniqueConstraint::ExtensionName,
                    value: extension.name.clone(),
                });
            }
        }

        extension.id = tables.next_id();
        tables.extensions.push(extension.clone());
        Ok(extension)
    }

    fn fields(&self, extension_id: i64) -> StoreResult<Vec<ExtensionFieldEntity>> {
        Ok(self
            .read()?
            .fields
            .iter()
            .filter(|f| f.extension_id == extension_id)
            .cloned()
            .collect())
    }

    fn field(&self, field_id: i64) -> StoreResult<Option<ExtensionFieldEntity>> {
        Ok(self.read()?.fields.iter().find(|f| f.id == field_id).cloned())
    }

    fn used_column_names(&self, extension_id: i64) -> StoreResult<Vec<String>> {
        Ok(self
            .read()?
            .fields
            .iter()
            .filter(|f| f.extension_id == extension_id)
            .map(|f| f.column_name.clone())
            .collect())
    }

    fn insert_field(&self, mut field: ExtensionFieldEntity) -> StoreResult<ExtensionFieldEntity> {
        let mut tables = self.write()?;

        if !tables.extensions.iter().any(|e| e.id == field.extension_id) {
            return Err(StoreError::NotFound(format!("extension {}", field.extension_id)));
        }

        field.id = 0;
        tables.check_field(&field)?;
        field.id = tables.next_id();
        tables.fields.push(field.clone());
        Ok(field)
    }

    fn update_field(&self, field: ExtensionFieldEntity) -> StoreResult<ExtensionFieldEntity> {
        let mut tables = self.write()?;
        tables.check_field(&field)?;

        let slot = tables
            .fields
            .iter_mut()
            .find(|f| f.id == field.id)
            .ok_or_else(|| StoreError::NotFound(format!("extension field {}", field.id)))?;
        *slot = field.clone();
        Ok(field)
    }

    fn delete_field(&self, field_id: i64) -> StoreResult<()> {
        let mut tables = self.write()?;
        let before = tables.fields.len();
        tables.fields.retain(|f| f.id != field_id);

        if tables.fields.len() == before {
            return Err(StoreError::NotFound(format!("extension field {}", field_id)));
        }
        Ok(())
    }

    fn delete_space(&self, space: &str) -> StoreResult<usize> {
        let mut tables = self.write()?;
        let doomed: Vec<i64> = tables
            .extensions
            .iter()
            .filter(|e| e.space == space)
            .map(|e| e.id)
            .collect();

        let before = tables.fields.len();
        tables.fields.retain(|f| !doomed.contains(&f.extension_id));
        tables.extensions.retain(|e| e.space != space);
        Ok(before - tables.fields.len())
    }
}

/// Extended record store kept in process memory.
#[derive(Default)]
pub struct InMemoryRecordStore {
    records: RwLock<HashMap<String, Vec<ExtendedRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ExtendedRecordStore for InMemoryRecordStore {
    fn save_record(&self, mut record: ExtendedRecord) -> StoreResult<ExtendedRecord> {
        let mut records = self
            .records
            .write()
            .map_err(|_| StoreError::Backend("record table lock poisoned".to_string()))?;
        let table = records.entry(record.entity_type.clone()).or_default();

        if record.id == 0 {
            record.id = table.iter().map(|r| r.id).max().unwrap_or(0) + 1;
            table.push(record.clone());
            return Ok(record);
        }

        let slot = table
            .iter_mut()
            .find(|r| r.id == record.id)
            .ok_or_else(|| StoreError::NotFound(format!("{} {}", record.entity_type, record.id)))?;
        *slot = record.clone();
        Ok(record)
    }

    fn record(&self, entity_type: &str, id: i64) -> StoreResult<Option<ExtendedRecord>> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("record table lock poisoned".to_string()))?;
        Ok(records
            .get(entity_type)
            .and_then(|table| table.iter().find(|r| r.id == id).cloned()))
    }

    fn count(&self, entity_type: &str) -> StoreResult<usize> {
        let records = self
            .records
            .read()
            .map_err(|_| StoreError::Backend("record table lock poisoned".to_string()))?;
        Ok(records.get(entity_type).map_or(0, Vec::len))
    }
}
