//! Extension entities and their client-facing shapes.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::{FieldType, LovOption};
use crate::security::ExtensionOwner;

/// A fixed entity type that accepts administrator-defined fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionPoint {
    /// Extension namespace, as named on the model
    pub name: String,
    pub target_entity_type: String,
}

impl ExtensionPoint {
    pub fn new(name: impl Into<String>, target_entity_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_entity_type: target_entity_type.into(),
        }
    }
}

/// One extension instance: an extension point as seen by one owner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionEntity {
    /// Assigned by the store; zero until saved
    pub id: i64,
    pub space: String,
    pub name: String,
    pub target_entity_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ExtensionOwner>,
    #[serde(default)]
    pub attributes: serde_json::Value,
}

impl ExtensionEntity {
    /// Unsaved instance of `point` for `owner` within `space`.
    pub fn for_owner(space: impl Into<String>, point: &ExtensionPoint, owner: Option<ExtensionOwner>) -> Self {
        let name = match &owner {
            Some(o) => format!("{}:{}:{}", point.name, o.owner_entity_type, o.owner_entity_id),
            None => point.name.clone(),
        };

        Self {
            id: 0,
            space: space.into(),
            name,
            target_entity_type: point.target_entity_type.clone(),
            owner,
            attributes: serde_json::Value::Null,
        }
    }
}

/// One administrator-defined field as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFieldEntity {
    pub id: i64,
    pub extension_id: i64,
    pub name: String,
    /// Generic storage slot; never changes after creation
    pub column_name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub field_type: FieldType,
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lov_options: Option<Vec<LovOption>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
}

/// Extension field as exchanged with clients.
///
/// `column_name` is reported back but ignored on input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionFieldModel {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub extension_name: String,
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub field_type: FieldType,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub lov_options: Vec<LovOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_name: Option<String>,
}

impl ExtensionFieldModel {
    pub fn new(extension_name: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        let name = name.into();
        Self {
            id: None,
            extension_name: extension_name.into(),
            label: name.clone(),
            name,
            description: None,
            field_type,
            required: false,
            lov_options: Vec::new(),
            max_length: None,
            column_name: None,
        }
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn max_length(mut self, max_length: u32) -> Self {
        self.max_length = Some(max_length);
        self
    }

    pub fn option(mut self, value: impl Into<String>, label: impl Into<String>) -> Self {
        self.lov_options.push(LovOption::new(value, label));
        self
    }

    pub fn from_entity(extension_name: &str, entity: &ExtensionFieldEntity) -> Self {
        Self {
            id: Some(entity.id),
            extension_name: extension_name.to_string(),
            name: entity.name.clone(),
            label: entity.label.clone(),
            description: entity.description.clone(),
            field_type: entity.field_type,
            required: entity.required,
            lov_options: entity.lov_options.clone().unwrap_or_default(),
            max_length: entity.max_length,
            column_name: Some(entity.column_name.clone()),
        }
    }

    /// Unsaved entity under `extension_id`; the column is allocated later.
    pub(crate) fn to_entity(&self, extension_id: i64) -> ExtensionFieldEntity {
        ExtensionFieldEntity {
            id: self.id.unwrap_or(0),
            extension_id,
            name: self.name.trim().to_string(),
            column_name: String::new(),
            label: self.label.trim().to_string(),
            description: self.description.clone(),
            field_type: self.field_type,
            required: self.required,
            lov_options: (self.field_type == FieldType::ListOfValues).then(|| self.lov_options.clone()),
            max_length: self.max_length,
        }
    }
}

/// A parent entity row carrying extended values keyed by column name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtendedRecord {
    pub id: i64,
    pub entity_type: String,
    pub extension_id: i64,
    pub values: IndexMap<String, String>,
}
