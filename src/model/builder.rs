//! Model and field definition builders.
//!
//! Turns declarations into the client-facing [`ModelDef`]/[`FieldDef`] tree.
//! Every problem found here is a configuration error: a model that cannot be
//! described is never registered.

use std::sync::Arc;

use super::declaration::{FieldDecl, LovKind, ModelDecl};
use super::types::{FieldDef, FieldType, LovDetails, LovType, ModelDef};
use super::value_type::{RawType, ValueType};
use crate::error::{FieldforgeError, Result};
use crate::label::{ElementNames, LabelResolver};
use crate::lov::LovService;
use crate::validation::ValidationRuleMapper;

/// Builds one [`FieldDef`] from a field declaration.
pub struct FieldDefinitionBuilder {
    labels: LabelResolver,
    validations: Arc<ValidationRuleMapper>,
    lovs: Arc<LovService>,
}

impl FieldDefinitionBuilder {
    pub fn new(labels: LabelResolver, validations: Arc<ValidationRuleMapper>, lovs: Arc<LovService>) -> Self {
        Self {
            labels,
            validations,
            lovs,
        }
    }

    /// Build the definition of `field`, declared on `model`.
    ///
    /// `model` must hold every field the owning model exposes, since
    /// `parent_field` references are checked against it.
    pub fn build(&self, model: &ModelDecl, field: &FieldDecl, locale: Option<&str>) -> Result<FieldDef> {
        let qualified = format!("{}.{}", model.qualified_name(), field.name);
        let element = ElementNames::new(&field.name, &qualified)
            .with_inline(field.label.as_deref(), field.description.as_deref());

        let raw_type = field.raw_type();
        let value_type = raw_type.value_type().ok_or_else(|| {
            FieldforgeError::configuration(format!(
                "Unsupported type '{}' for field '{}'",
                field.field_type, qualified
            ))
        })?;

        let (field_type, lov_details) = self.classify(model, field, &raw_type, value_type, &qualified)?;

        Ok(FieldDef {
            name: field.name.clone(),
            label: self.labels.label(&element, locale),
            description: self.labels.description(&element, locale),
            default_value: field.default_value.clone(),
            field_type,
            read_only: field.read_only,
            displayable: !field.non_displayable,
            lov_details,
            validations: self.validations.validations_for(field, value_type, locale),
        })
    }

    fn classify(
        &self,
        model: &ModelDecl,
        field: &FieldDecl,
        raw_type: &RawType,
        value_type: ValueType,
        qualified: &str,
    ) -> Result<(FieldType, Option<LovDetails>)> {
        // Enumeration types win over an explicit binding.
        if let RawType::Enum(enum_name) = raw_type {
            if !self.lovs.is_enum_lov(enum_name) {
                return Err(FieldforgeError::configuration(format!(
                    "Unknown enumeration '{}' for field '{}'",
                    enum_name, qualified
                )));
            }
            return Ok((
                FieldType::ListOfValues,
                Some(LovDetails {
                    lov_type: LovType::Static,
                    lov_name: enum_name.clone(),
                    parent_field: None,
                }),
            ));
        }

        if let Some(lov) = &field.lov {
            let lov_type = match lov.kind {
                LovKind::Dynamic => {
                    if !self.lovs.is_valid_dynamic_lov(&lov.name) {
                        return Err(FieldforgeError::configuration(format!(
                            "Unknown dynamic LOV '{}' for field '{}'",
                            lov.name, qualified
                        )));
                    }
                    LovType::Dynamic
                }
                LovKind::Stored => LovType::Stored,
            };

            if let Some(parent) = &lov.parent_field {
                if parent == &field.name || model.field_decl(parent).is_none() {
                    return Err(FieldforgeError::configuration(format!(
                        "Parent field '{}' of field '{}' is not declared on model '{}'",
                        parent,
                        qualified,
                        model.model_name()
                    )));
                }
            }

            return Ok((
                FieldType::ListOfValues,
                Some(LovDetails {
                    lov_type,
                    lov_name: lov.name.clone(),
                    parent_field: lov.parent_field.clone(),
                }),
            ));
        }

        let field_type = match value_type {
            ValueType::Text | ValueType::String | ValueType::Character if field.multiline => {
                FieldType::MultiLineString
            }
            ValueType::Text | ValueType::String | ValueType::Character => FieldType::String,
            ValueType::Integer | ValueType::Long | ValueType::Short | ValueType::Byte => FieldType::Integer,
            ValueType::Number | ValueType::Float | ValueType::Double | ValueType::Decimal => FieldType::Decimal,
            ValueType::Boolean => FieldType::Boolean,
            ValueType::Date => FieldType::Date,
            ValueType::File => FieldType::File,
            ValueType::Image => FieldType::Image,
            ValueType::Object | ValueType::Enum => {
                return Err(FieldforgeError::configuration(format!(
                    "Unsupported type '{}' for field '{}'",
                    field.field_type, qualified
                )))
            }
        };

        Ok((field_type, None))
    }
}

/// Builds a [`ModelDef`] from a model declaration.
pub struct ModelDefinitionBuilder {
    labels: LabelResolver,
    fields: FieldDefinitionBuilder,
    default_date_format: String,
}

impl ModelDefinitionBuilder {
    pub fn new(
        labels: LabelResolver,
        validations: Arc<ValidationRuleMapper>,
        lovs: Arc<LovService>,
        default_date_format: impl Into<String>,
    ) -> Self {
        Self {
            fields: FieldDefinitionBuilder::new(labels.clone(), validations, lovs),
            labels,
            default_date_format: default_date_format.into(),
        }
    }

    /// Build the definition of a marked model.
    ///
    /// Static and ignored fields are skipped; the rest keep declaration order.
    pub fn build(&self, model: &ModelDecl, locale: Option<&str>) -> Result<ModelDef> {
        if !model.is_model() {
            return Err(FieldforgeError::configuration(format!(
                "'{}' is not marked as a model",
                model.qualified_name()
            )));
        }

        let element = ElementNames::new(&model.name, model.qualified_name())
            .with_inline(model.label.as_deref(), model.description.as_deref());

        let fields = model
            .fields
            .iter()
            .filter(|f| f.is_instance_field())
            .map(|f| self.fields.build(model, f, locale))
            .collect::<Result<Vec<_>>>()?;

        Ok(ModelDef {
            name: model.model_name().to_string(),
            label: self.labels.label(&element, locale),
            date_format: model
                .date_format
                .clone()
                .unwrap_or_else(|| self.default_date_format.clone()),
            extension_name: model.extension_name().map(str::to_string),
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MessageCatalog;
    use crate::lov::{EnumConstant, EnumRegistry};
    use crate::model::{LovDecl, LovOption, ValidationDecl};
    use crate::validation::ValidationRegistry;

    fn builder() -> ModelDefinitionBuilder {
        let catalog = MessageCatalog::new("en")
            .with_message("en", "crm.Customer.name.label", "Customer name")
            .with_message("en", "Customer.label", "Client");
        let labels = LabelResolver::new(Arc::new(catalog));

        let mut enums = EnumRegistry::new();
        enums
            .register("Status", vec![EnumConstant::new("ACTIVE"), EnumConstant::new("CLOSED")])
            .unwrap();
        let lovs = LovService::new(enums, labels.clone());
        lovs.register_fn("states", |_, _| Ok(vec![LovOption::new("AP", "Andhra")]))
            .unwrap();
        lovs.register_dependent_fn("cities", |_, _| Ok(vec![])).unwrap();

        let mapper = ValidationRuleMapper::new(ValidationRegistry::with_defaults().unwrap(), labels.clone());
        ModelDefinitionBuilder::new(labels, Arc::new(mapper), Arc::new(lovs), "%d/%m/%Y")
    }

    fn customer() -> ModelDecl {
        ModelDecl::new("Customer")
            .qualified("crm.Customer")
            .marked()
            .field(FieldDecl::new("name", "String").validate(ValidationDecl::new("Required")))
            .field(FieldDecl::new("notes", "String").multiline().label("Remarks"))
            .field(FieldDecl::new("age", "int").read_only())
            .field(FieldDecl::new("rating", "BigDecimal").hidden())
            .field(FieldDecl::new("status", "enum:Status"))
            .field(FieldDecl::new("state", "Long").lov(LovDecl::dynamic("states")))
            .field(FieldDecl::new("city", "Long").lov(LovDecl::dynamic("cities").depends_on("state")))
            .field(FieldDecl::new("VERSION", "long").static_field())
            .field(FieldDecl::new("cacheKey", "String").ignored())
    }

    #[test]
    fn test_build_model() {
        let def = builder().build(&customer(), None).unwrap();

        assert_eq!(def.name, "Customer");
        assert_eq!(def.label, "Client");
        assert_eq!(def.date_format, "%d/%m/%Y");
        assert_eq!(def.extension_name, None);

        let names: Vec<_> = def.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["name", "notes", "age", "rating", "status", "state", "city"]);

        let name = def.field("name").unwrap();
        assert_eq!(name.label, "Customer name");
        assert_eq!(name.field_type, FieldType::String);
        assert_eq!(name.validations[0].name, "required");

        assert_eq!(def.field("notes").unwrap().field_type, FieldType::MultiLineString);
        assert_eq!(def.field("notes").unwrap().label, "Remarks");
        assert_eq!(def.field("age").unwrap().field_type, FieldType::Integer);
        assert!(def.field("age").unwrap().read_only);
        assert_eq!(def.field("rating").unwrap().field_type, FieldType::Decimal);
        assert!(!def.field("rating").unwrap().displayable);
    }

    #[test]
    fn test_lov_classification() {
        let def = builder().build(&customer(), None).unwrap();

        let status = def.field("status").unwrap();
        assert_eq!(status.field_type, FieldType::ListOfValues);
        assert_eq!(
            status.lov_details,
            Some(LovDetails {
                lov_type: LovType::Static,
                lov_name: "Status".to_string(),
                parent_field: None,
            })
        );

        let city = def.field("city").unwrap();
        let details = city.lov_details.as_ref().unwrap();
        assert_eq!(details.lov_type, LovType::Dynamic);
        assert_eq!(details.parent_field.as_deref(), Some("state"));
    }

    #[test]
    fn test_extension_name_requires_marker_and_capability() {
        let builder = builder();

        let both = ModelDecl::new("Order").marked().extendable("orders");
        assert_eq!(builder.build(&both, None).unwrap().extension_name.as_deref(), Some("orders"));

        let mut marker_only = ModelDecl::new("Order").marked().extendable("orders");
        marker_only.extensible = false;
        assert_eq!(builder.build(&marker_only, None).unwrap().extension_name, None);
    }

    #[test]
    fn test_configuration_errors() {
        let builder = builder();

        let unmarked = ModelDecl::new("Plain");
        assert!(matches!(builder.build(&unmarked, None), Err(FieldforgeError::Configuration(_))));

        let bad_type = ModelDecl::new("M").marked().field(FieldDecl::new("f", "Map"));
        assert!(matches!(builder.build(&bad_type, None), Err(FieldforgeError::Configuration(_))));

        let bad_lov = ModelDecl::new("M")
            .marked()
            .field(FieldDecl::new("f", "Long").lov(LovDecl::dynamic("countires")));
        assert!(matches!(builder.build(&bad_lov, None), Err(FieldforgeError::Configuration(_))));

        let bad_parent = ModelDecl::new("M")
            .marked()
            .field(FieldDecl::new("city", "Long").lov(LovDecl::dynamic("cities").depends_on("state")));
        assert!(matches!(builder.build(&bad_parent, None), Err(FieldforgeError::Configuration(_))));

        let bad_enum = ModelDecl::new("M").marked().field(FieldDecl::new("f", "enum:Priority"));
        assert!(matches!(builder.build(&bad_enum, None), Err(FieldforgeError::Configuration(_))));
    }

    #[test]
    fn test_stored_lov_is_not_checked_at_build_time() {
        let model = ModelDecl::new("M")
            .marked()
            .date_format("%Y-%m-%d")
            .field(FieldDecl::new("color", "String").lov(LovDecl::stored("colors")));

        let def = builder().build(&model, None).unwrap();
        assert_eq!(def.date_format, "%Y-%m-%d");
        assert_eq!(def.fields[0].lov_details.as_ref().unwrap().lov_type, LovType::Stored);
    }
}
