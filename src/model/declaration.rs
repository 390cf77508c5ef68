//! Model and field declarations.
//!
//! A declaration is the explicit, per-field attribute map a model definition
//! is built from. Declarations come from YAML files (see
//! [`crate::model::yaml_loader`]) or from the builder methods below, usually
//! inside a [`Model`] implementation.
//!
//! ```yaml
//! model:
//!   name: MailConfig
//!   qualified_name: crm.settings.MailConfig
//!   marker: {}
//!   fields:
//!     - name: fromAddressPattern
//!       type: String
//!       validations:
//!         - rule: MaxLen
//!           attributes: { value: 100 }
//!     - name: state
//!       type: Long
//!       lov: { name: states }
//!     - name: city
//!       type: Long
//!       lov: { name: cities, parent_field: state }
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::value_type::RawType;

/// Wrapper for model YAML structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ModelSpec {
    pub model: ModelDecl,
}

/// Marks a declaration as a model; `name` overrides the client model name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct ModelMarker {
    #[serde(default)]
    pub name: Option<String>,
}

/// Extensibility marker naming the extension point.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ExtendableMarker {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ModelDecl {
    /// Simple name
    pub name: String,
    #[serde(default)]
    pub qualified_name: Option<String>,
    #[serde(default)]
    pub marker: Option<ModelMarker>,
    #[serde(default)]
    pub extendable: Option<ExtendableMarker>,
    /// Implements the extensible-model capability
    #[serde(default)]
    pub extensible: bool,
    /// Parent model whose fields precede this model's own
    #[serde(default)]
    pub extends: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub date_format: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

impl ModelDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn qualified_name(&self) -> &str {
        self.qualified_name.as_deref().unwrap_or(&self.name)
    }

    pub fn is_model(&self) -> bool {
        self.marker.is_some()
    }

    /// Client model name: marker override, else the simple name.
    pub fn model_name(&self) -> &str {
        self.marker
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or(&self.name)
    }

    /// Extension namespace, only when both the marker and the capability are present.
    pub fn extension_name(&self) -> Option<&str> {
        match &self.extendable {
            Some(marker) if self.extensible => Some(&marker.name),
            _ => None,
        }
    }

    pub fn field_decl(&self, name: &str) -> Option<&FieldDecl> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn marked(mut self) -> Self {
        self.marker = Some(ModelMarker::default());
        self
    }

    pub fn named(mut self, model_name: impl Into<String>) -> Self {
        self.marker = Some(ModelMarker {
            name: Some(model_name.into()),
        });
        self
    }

    pub fn qualified(mut self, qualified_name: impl Into<String>) -> Self {
        self.qualified_name = Some(qualified_name.into());
        self
    }

    /// Adds the extensibility marker and the capability together.
    pub fn extendable(mut self, extension_name: impl Into<String>) -> Self {
        self.extendable = Some(ExtendableMarker {
            name: extension_name.into(),
        });
        self.extensible = true;
        self
    }

    pub fn extends(mut self, parent: impl Into<String>) -> Self {
        self.extends = Some(parent.into());
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    pub fn field(mut self, field: FieldDecl) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct FieldDecl {
    pub name: String,
    /// Raw type text, see [`RawType::parse`]
    #[serde(rename = "type")]
    pub field_type: String,
    #[serde(default, rename = "static")]
    pub is_static: bool,
    #[serde(default)]
    pub ignored: bool,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub multiline: bool,
    #[serde(default)]
    pub read_only: bool,
    #[serde(default)]
    pub non_displayable: bool,
    #[serde(default)]
    pub lov: Option<LovDecl>,
    #[serde(default)]
    pub validations: Vec<ValidationDecl>,
}

impl FieldDecl {
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Default::default()
        }
    }

    pub fn raw_type(&self) -> RawType {
        RawType::parse(&self.field_type)
    }

    /// Non-static, non-ignored fields take part in model definitions.
    pub fn is_instance_field(&self) -> bool {
        !self.is_static && !self.ignored
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self
    }

    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.non_displayable = true;
        self
    }

    pub fn ignored(mut self) -> Self {
        self.ignored = true;
        self
    }

    pub fn static_field(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn lov(mut self, lov: LovDecl) -> Self {
        self.lov = Some(lov);
        self
    }

    pub fn validate(mut self, validation: ValidationDecl) -> Self {
        self.validations.push(validation);
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LovKind {
    #[default]
    Dynamic,
    Stored,
}

/// Explicit LOV binding on a field.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LovDecl {
    pub name: String,
    #[serde(default)]
    pub kind: LovKind,
    #[serde(default)]
    pub parent_field: Option<String>,
}

impl LovDecl {
    pub fn dynamic(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LovKind::Dynamic,
            parent_field: None,
        }
    }

    pub fn stored(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: LovKind::Stored,
            parent_field: None,
        }
    }

    pub fn depends_on(mut self, parent_field: impl Into<String>) -> Self {
        self.parent_field = Some(parent_field.into());
        self
    }
}

/// One validation rule attached to a field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ValidationDecl {
    pub rule: String,
    #[serde(default)]
    pub attributes: IndexMap<String, serde_json::Value>,
    /// Raw message; `{key}` indirections and `{attr}` tokens are resolved
    #[serde(default)]
    pub message: Option<String>,
}

impl ValidationDecl {
    pub fn new(rule: impl Into<String>) -> Self {
        Self {
            rule: rule.into(),
            ..Default::default()
        }
    }

    pub fn attr(mut self, name: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(name.into(), value.into());
        self
    }

    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Rust types that describe themselves as models.
///
/// # Example
///
/// ```
/// use fieldforge::model::{FieldDecl, Model, ModelDecl, ValidationDecl};
///
/// struct Customer;
///
/// impl Model for Customer {
///     fn declaration() -> ModelDecl {
///         ModelDecl::new("Customer")
///             .marked()
///             .extendable("customer")
///             .field(FieldDecl::new("name", "String").validate(ValidationDecl::new("Required")))
///     }
/// }
///
/// assert_eq!(Customer::declaration().extension_name(), Some("customer"));
/// ```
pub trait Model {
    fn declaration() -> ModelDecl;
}
