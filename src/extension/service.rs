//! Extension registry operations.
//!
//! All operations act for the caller described by a [`SecurityContext`]:
//! the space scopes storage, the owner picks the extension instance, and
//! access to the extension point is checked before anything is read or
//! written.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock};

use super::columns::ColumnAllocator;
use super::entity::{ExtendedRecord, ExtensionEntity, ExtensionFieldEntity, ExtensionFieldModel, ExtensionPoint};
use super::store::{ExtendedRecordStore, ExtensionStore};
use super::values::ExtensionValueValidator;
use crate::error::{FieldforgeError, Result};
use crate::model::FieldType;
use crate::security::SecurityContext;

/// Limits applied to extension field definitions.
#[derive(Debug, Clone)]
pub struct ExtensionLimits {
    pub max_field_length: u32,
    /// Upper bound on the JSON-encoded option list of a LOV field
    pub max_lov_options_length: usize,
    pub column_prefix: String,
    pub column_pool_size: usize,
    pub date_format: String,
}

impl Default for ExtensionLimits {
    fn default() -> Self {
        Self {
            max_field_length: 1000,
            max_lov_options_length: 2000,
            column_prefix: "field".to_string(),
            column_pool_size: 20,
            date_format: "%d/%m/%Y".to_string(),
        }
    }
}

pub struct ExtensionService {
    points: RwLock<IndexMap<String, ExtensionPoint>>,
    store: Arc<dyn ExtensionStore>,
    records: Arc<dyn ExtendedRecordStore>,
    columns: ColumnAllocator,
    values: ExtensionValueValidator,
    limits: ExtensionLimits,
}

impl ExtensionService {
    /// Service over the given field and record stores.
    pub fn new(store: Arc<dyn ExtensionStore>, records: Arc<dyn ExtendedRecordStore>, limits: ExtensionLimits) -> Self {
        Self {
            points: RwLock::new(IndexMap::new()),
            store,
            records,
            columns: ColumnAllocator::new(limits.column_prefix.clone(), limits.column_pool_size),
            values: ExtensionValueValidator::new(limits.date_format.clone()),
            limits,
        }
    }

    /// Declare `point` as extendable.
    ///
    /// Re-registering an identical point is a no-op; rebinding a name to another
    /// target type is a configuration error.
    pub fn register_extension_point(&self, point: ExtensionPoint) -> Result<()> {
        let mut points = self
            .points
            .write()
            .map_err(|_| FieldforgeError::Internal("extension point lock poisoned".to_string()))?;

        if let Some(existing) = points.get(&point.name) {
            if existing != &point {
                return Err(FieldforgeError::configuration(format!(
                    "Extension '{}' is already bound to '{}'",
                    point.name, existing.target_entity_type
                )));
            }
            return Ok(());
        }

        tracing::info!("Registered extension point '{}' for '{}'", point.name, point.target_entity_type);
        points.insert(point.name.clone(), point);
        Ok(())
    }

    /// The registered point named `extension_name`.
    pub fn extension_point(&self, extension_name: &str) -> Result<ExtensionPoint> {
        let points = self
            .points
            .read()
            .map_err(|_| FieldforgeError::Internal("extension point lock poisoned".to_string()))?;

        points
            .get(extension_name)
            .cloned()
            .ok_or_else(|| FieldforgeError::NotFound(format!("Invalid extension name specified: {}", extension_name)))
    }

    /// Every registered point, in registration order.
    pub fn extension_points(&self) -> Vec<ExtensionPoint> {
        self.points
            .read()
            .map(|points| points.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Fields defined for the caller on `extension_name`.
    pub fn fetch_extension_fields(
        &self,
        extension_name: &str,
        security: &dyn SecurityContext,
    ) -> Result<Vec<ExtensionFieldModel>> {
        let point = self.authorized_point(extension_name, security)?;

        let Some(extension) = self.find_extension(&point, security)? else {
            return Ok(Vec::new());
        };

        Ok(self
            .store
            .fields(extension.id)?
            .iter()
            .map(|f| ExtensionFieldModel::from_entity(extension_name, f))
            .collect())
    }

    /// Define a new field, creating the caller's extension instance on first use.
    pub fn save_extension_field(
        &self,
        model: &ExtensionFieldModel,
        security: &dyn SecurityContext,
    ) -> Result<ExtensionFieldModel> {
        self.validate_field_model(model)?;
        let point = self.authorized_point(&model.extension_name, security)?;
        let extension = self.find_or_create_extension(&point, security)?;

        let entity = model.to_entity(extension.id);
        let saved = self.columns.allocate(
            extension.id,
            || self.store.used_column_names(extension.id),
            |column| {
                let mut field = entity.clone();
                field.column_name = column;
                self.store.insert_field(field)
            },
        )?;

        tracing::info!(
            "Saved extension field '{}' as '{}' in extension '{}'",
            saved.name,
            saved.column_name,
            extension.name
        );
        Ok(ExtensionFieldModel::from_entity(&model.extension_name, &saved))
    }

    /// Redefine an existing field; its storage column is kept.
    pub fn update_extension_field(
        &self,
        model: &ExtensionFieldModel,
        security: &dyn SecurityContext,
    ) -> Result<ExtensionFieldModel> {
        let field_id = match model.id {
            Some(id) if id > 0 => id,
            _ => return Err(FieldforgeError::invalid_field(&model.name, "a field id is required for update")),
        };

        self.validate_field_model(model)?;
        let (extension, existing) = self.owned_field(&model.extension_name, field_id, security)?;

        let mut updated = model.to_entity(extension.id);
        updated.id = existing.id;
        updated.column_name = existing.column_name;

        let saved = self.store.update_field(updated)?;
        tracing::info!("Updated extension field '{}' in extension '{}'", saved.name, extension.name);
        Ok(ExtensionFieldModel::from_entity(&model.extension_name, &saved))
    }

    /// Remove one of the caller's fields; its column becomes free for reuse.
    pub fn delete_extension_field(
        &self,
        extension_name: &str,
        field_id: i64,
        security: &dyn SecurityContext,
    ) -> Result<()> {
        let (extension, field) = self.owned_field(extension_name, field_id, security)?;
        self.store.delete_field(field.id)?;
        tracing::info!("Deleted extension field '{}' from extension '{}'", field.name, extension.name);
        Ok(())
    }

    /// One of the caller's fields by id.
    pub fn read_extension_field(
        &self,
        extension_name: &str,
        field_id: i64,
        security: &dyn SecurityContext,
    ) -> Result<ExtensionFieldModel> {
        let (_, field) = self.owned_field(extension_name, field_id, security)?;
        Ok(ExtensionFieldModel::from_entity(extension_name, &field))
    }

    /// Remove every extension instance and field in the caller's space.
    pub fn delete_all_extension_fields(&self, security: &dyn SecurityContext) -> Result<usize> {
        let space = security.space_identity();
        let removed = self.store.delete_space(&space)?;
        tracing::info!("Deleted {} extension fields in space '{}'", removed, space);
        Ok(removed)
    }

    /// Check submitted values (field name to text); returns them keyed by column.
    pub fn validate_extended_values(
        &self,
        extension_name: &str,
        values: &IndexMap<String, String>,
        security: &dyn SecurityContext,
    ) -> Result<IndexMap<String, String>> {
        let point = self.authorized_point(extension_name, security)?;
        let fields = match self.find_extension(&point, security)? {
            Some(extension) => self.store.fields(extension.id)?,
            None => Vec::new(),
        };

        self.values.validate(&fields, values)
    }

    /// Validate and persist a parent record with its extended values.
    ///
    /// Nothing is written unless every value passes.
    pub fn save_extended_record(
        &self,
        extension_name: &str,
        record_id: Option<i64>,
        values: &IndexMap<String, String>,
        security: &dyn SecurityContext,
    ) -> Result<ExtendedRecord> {
        let point = self.authorized_point(extension_name, security)?;
        let extension = self.find_or_create_extension(&point, security)?;

        let record_id = record_id.filter(|id| *id > 0);
        if let Some(id) = record_id {
            self.owned_record(&point, &extension, id)?;
        }

        let fields = self.store.fields(extension.id)?;
        let columns = self.values.validate(&fields, values)?;

        let record = ExtendedRecord {
            id: record_id.unwrap_or(0),
            entity_type: point.target_entity_type.clone(),
            extension_id: extension.id,
            values: columns,
        };

        Ok(self.records.save_record(record)?)
    }

    /// Extended values of a record, keyed by field name.
    pub fn read_extended_values(
        &self,
        extension_name: &str,
        record_id: i64,
        security: &dyn SecurityContext,
    ) -> Result<IndexMap<String, String>> {
        let point = self.authorized_point(extension_name, security)?;
        let extension = self
            .find_extension(&point, security)?
            .ok_or_else(|| record_not_found(&point, record_id))?;
        let record = self.owned_record(&point, &extension, record_id)?;

        let fields = self.store.fields(extension.id)?;
        Ok(fields
            .iter()
            .filter_map(|f| {
                record
                    .values
                    .get(&f.column_name)
                    .map(|v| (f.name.clone(), v.clone()))
            })
            .collect())
    }

    /// Number of stored records of the extension's target entity type.
    pub fn record_count(&self, extension_name: &str) -> Result<usize> {
        let point = self.extension_point(extension_name)?;
        Ok(self.records.count(&point.target_entity_type)?)
    }

    fn authorized_point(&self, extension_name: &str, security: &dyn SecurityContext) -> Result<ExtensionPoint> {
        let point = self.extension_point(extension_name)?;

        if !security.is_extension_authorized(&point) {
            tracing::warn!("Rejected unauthorized access to extension '{}'", extension_name);
            return Err(FieldforgeError::Authorization(format!(
                "Not authorized to access extension '{}'",
                extension_name
            )));
        }

        Ok(point)
    }

    fn find_extension(&self, point: &ExtensionPoint, security: &dyn SecurityContext) -> Result<Option<ExtensionEntity>> {
        let owner = security.extension_owner(point);
        Ok(self
            .store
            .find_extension(&security.space_identity(), &point.target_entity_type, owner.as_ref())?)
    }

    fn find_or_create_extension(&self, point: &ExtensionPoint, security: &dyn SecurityContext) -> Result<ExtensionEntity> {
        if let Some(existing) = self.find_extension(point, security)? {
            return Ok(existing);
        }

        let entity = ExtensionEntity::for_owner(security.space_identity(), point, security.extension_owner(point));
        match self.store.insert_extension(entity) {
            Ok(created) => {
                tracing::info!("Created extension '{}' in space '{}'", created.name, created.space);
                Ok(created)
            }
            // Lost a creation race; the winner's row is the one to use.
            Err(e) => self
                .find_extension(point, security)?
                .ok_or_else(|| FieldforgeError::from(e)),
        }
    }

    /// The caller's extension and one of its fields.
    ///
    /// A field that exists but belongs to another extension is reported as
    /// not found.
    fn owned_field(
        &self,
        extension_name: &str,
        field_id: i64,
        security: &dyn SecurityContext,
    ) -> Result<(ExtensionEntity, ExtensionFieldEntity)> {
        let point = self.authorized_point(extension_name, security)?;
        let not_found = || {
            FieldforgeError::NotFound(format!(
                "Extension field {} does not exist in extension '{}'",
                field_id, extension_name
            ))
        };

        let extension = self.find_extension(&point, security)?.ok_or_else(not_found)?;
        let field = self
            .store
            .field(field_id)?
            .filter(|f| f.extension_id == extension.id)
            .ok_or_else(not_found)?;

        Ok((extension, field))
    }

    /// A stored record of the point's entity type saved under `extension`.
    ///
    /// Records of other owners or spaces are reported as not found.
    fn owned_record(&self, point: &ExtensionPoint, extension: &ExtensionEntity, record_id: i64) -> Result<ExtendedRecord> {
        self.records
            .record(&point.target_entity_type, record_id)?
            .filter(|r| r.extension_id == extension.id)
            .ok_or_else(|| record_not_found(point, record_id))
    }

    fn validate_field_model(&self, model: &ExtensionFieldModel) -> Result<()> {
        let name = model.name.trim();
        if name.is_empty() {
            return Err(FieldforgeError::invalid("Extension field name is required"));
        }
        if model.label.trim().is_empty() {
            return Err(FieldforgeError::invalid_field(name, "label is required"));
        }
        if !model.field_type.is_extension_type() {
            return Err(FieldforgeError::invalid_field(
                name,
                format!("type {} is not supported for extension fields", model.field_type),
            ));
        }

        match model.field_type {
            FieldType::ListOfValues => {
                if model.lov_options.is_empty() {
                    return Err(FieldforgeError::invalid_field(name, "at least one LOV option is required"));
                }
                let encoded = serde_json::to_string(&model.lov_options)
                    .map_err(|e| FieldforgeError::Internal(format!("Failed to encode LOV options: {}", e)))?;
                if encoded.len() > self.limits.max_lov_options_length {
                    return Err(FieldforgeError::invalid_field(
                        name,
                        format!(
                            "LOV options exceed the maximum encoded length of {}",
                            self.limits.max_lov_options_length
                        ),
                    ));
                }
            }
            field_type if field_type.is_text() => match model.max_length {
                Some(len) if (1..=self.limits.max_field_length).contains(&len) => {}
                _ => {
                    return Err(FieldforgeError::invalid_field(
                        name,
                        format!("max length must be between 1 and {}", self.limits.max_field_length),
                    ))
                }
            },
            _ => {}
        }

        Ok(())
    }
}

fn record_not_found(point: &ExtensionPoint, record_id: i64) -> FieldforgeError {
    FieldforgeError::NotFound(format!("{} {}", point.target_entity_type, record_id))
}
