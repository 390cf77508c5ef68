//! Field validation declarations to client validation descriptors.

use indexmap::IndexMap;

use super::registry::ValidationRegistry;
use super::template::MessageFormatter;
use crate::label::LabelResolver;
use crate::model::{FieldDecl, ValidationDef, ValueType};

const FALLBACK_MESSAGE: &str = "Invalid value";

pub struct ValidationRuleMapper {
    registry: ValidationRegistry,
    formatter: MessageFormatter,
    labels: LabelResolver,
}

impl ValidationRuleMapper {
    pub fn new(registry: ValidationRegistry, labels: LabelResolver) -> Self {
        Self {
            registry,
            formatter: MessageFormatter::new(),
            labels,
        }
    }

    pub fn registry(&self) -> &ValidationRegistry {
        &self.registry
    }

    /// Descriptors for every declared rule that has a client mapping for `value_type`.
    ///
    /// Rules without a mapping are skipped; they are server-only checks.
    pub fn validations_for(
        &self,
        field: &FieldDecl,
        value_type: ValueType,
        locale: Option<&str>,
    ) -> Vec<ValidationDef> {
        let mut validations = Vec::with_capacity(field.validations.len());

        for decl in &field.validations {
            let Some(details) = self.registry.lookup(&decl.rule, value_type) else {
                tracing::debug!(
                    "No client validation for rule '{}' on field '{}' ({})",
                    decl.rule,
                    field.name,
                    value_type
                );
                continue;
            };
            let constraint = self.registry.constraint(&decl.rule);

            let mut attributes: IndexMap<String, serde_json::Value> =
                constraint.map(|c| c.defaults.clone()).unwrap_or_default();
            attributes.extend(decl.attributes.iter().map(|(k, v)| (k.clone(), v.clone())));

            let values = details
                .attributes
                .iter()
                .filter_map(|name| attributes.get(name).map(|v| (name.clone(), v.clone())))
                .collect();

            let raw_message = decl
                .message
                .as_deref()
                .or_else(|| constraint.and_then(|c| c.default_message.as_deref()))
                .unwrap_or(FALLBACK_MESSAGE);

            validations.push(ValidationDef {
                name: details.client_name.clone(),
                values,
                cross_validation: constraint.map_or(false, |c| c.cross_validation),
                error_message: self.formatter.format(raw_message, &attributes, &self.labels, locale),
            });
        }

        validations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MessageCatalog;
    use crate::model::ValidationDecl;
    use serde_json::json;
    use std::sync::Arc;

    fn mapper() -> ValidationRuleMapper {
        let catalog = MessageCatalog::new("en")
            .with_message("en", "age.range", "Age must be between {value} and 120");
        ValidationRuleMapper::new(
            ValidationRegistry::with_defaults().unwrap(),
            LabelResolver::new(Arc::new(catalog)),
        )
    }

    #[test]
    fn test_number_rule_applies_to_integer_and_decimal_fields() {
        let mapper = mapper();
        let field = FieldDecl::new("amount", "int").validate(ValidationDecl::new("Min").attr("value", 5));

        let on_int = mapper.validations_for(&field, ValueType::Integer, None);
        let on_decimal = mapper.validations_for(&field, ValueType::Decimal, None);

        assert_eq!(on_int.len(), 1);
        assert_eq!(on_int[0].name, "minValue");
        assert_eq!(on_int[0].values["value"], json!(5));
        assert_eq!(on_int[0].error_message, "Value should be greater than or equal to 5");
        assert_eq!(on_int, on_decimal);
    }

    #[test]
    fn test_unmapped_rules_are_skipped() {
        let mapper = mapper();
        let field = FieldDecl::new("name", "String")
            .validate(ValidationDecl::new("Min").attr("value", 1))
            .validate(ValidationDecl::new("ServerOnlyCheck"))
            .validate(ValidationDecl::new("Required"));

        let validations = mapper.validations_for(&field, ValueType::String, None);
        let names: Vec<_> = validations.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["required"]);
    }

    #[test]
    fn test_cross_validation_flag_and_deferred_tokens() {
        let mapper = mapper();
        let field = FieldDecl::new("toDate", "Date").validate(
            ValidationDecl::new("GreaterThan")
                .attr("field", "fromDate")
                .message("Must be after {field} (was ${value})"),
        );

        let validations = mapper.validations_for(&field, ValueType::Date, None);
        assert_eq!(validations[0].name, "greaterThanDate");
        assert!(validations[0].cross_validation);
        assert_eq!(validations[0].values["field"], json!("fromDate"));
        assert_eq!(validations[0].error_message, "Must be after fromDate (was ${value})");
    }

    #[test]
    fn test_catalog_indirection_in_declared_message() {
        let mapper = mapper();
        let field = FieldDecl::new("age", "Integer")
            .validate(ValidationDecl::new("Min").attr("value", 18).message("{age.range}"));

        let validations = mapper.validations_for(&field, ValueType::Integer, None);
        assert_eq!(validations[0].error_message, "Age must be between 18 and 120");
    }
}
