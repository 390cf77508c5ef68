//! Client-facing definition types.
//!
//! These are derived from model declarations, never persisted, and serialize
//! to the JSON shape clients use for form and validation rendering.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Field type taxonomy shared by static and extension fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FieldType {
    String,
    MultiLineString,
    Integer,
    Decimal,
    Boolean,
    Date,
    ListOfValues,
    File,
    Image,
}

impl FieldType {
    /// Types an administrator may pick for an extension field.
    pub fn is_extension_type(self) -> bool {
        !matches!(self, FieldType::File | FieldType::Image)
    }

    /// Types whose values are bounded by `max_length`.
    pub fn is_text(self) -> bool {
        matches!(self, FieldType::String | FieldType::MultiLineString)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::String => "STRING",
            FieldType::MultiLineString => "MULTI_LINE_STRING",
            FieldType::Integer => "INTEGER",
            FieldType::Decimal => "DECIMAL",
            FieldType::Boolean => "BOOLEAN",
            FieldType::Date => "DATE",
            FieldType::ListOfValues => "LIST_OF_VALUES",
            FieldType::File => "FILE",
            FieldType::Image => "IMAGE",
        };
        write!(f, "{}", name)
    }
}

/// How a list of values is resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LovType {
    /// Enumeration-backed
    Static,
    /// Provider/query-backed, optionally dependent on a sibling field
    Dynamic,
    /// Persisted, editable list
    Stored,
}

impl std::str::FromStr for LovType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STATIC" => Ok(LovType::Static),
            "DYNAMIC" => Ok(LovType::Dynamic),
            "STORED" => Ok(LovType::Stored),
            other => Err(format!("Unknown LOV type: {}", other)),
        }
    }
}

/// A single selectable choice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LovOption {
    pub value: String,
    pub label: String,
}

impl LovOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LovDetails {
    pub lov_type: LovType,
    pub lov_name: String,
    /// Sibling field whose value drives this LOV
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_field: Option<String>,
}

/// Portable description of one validation rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationDef {
    /// Client-recognized validation kind
    pub name: String,
    /// Attribute values the client needs to re-check the rule
    pub values: IndexMap<String, serde_json::Value>,
    pub cross_validation: bool,
    pub error_message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDef {
    pub name: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    pub field_type: FieldType,
    pub read_only: bool,
    pub displayable: bool,
    /// Present iff `field_type` is `LIST_OF_VALUES`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lov_details: Option<LovDetails>,
    #[serde(default)]
    pub validations: Vec<ValidationDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDef {
    /// Stable client cache key
    pub name: String,
    pub label: String,
    pub date_format: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension_name: Option<String>,
    pub fields: Vec<FieldDef>,
}

impl ModelDef {
    pub fn field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }
}
