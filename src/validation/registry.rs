//! Registry of supported validation rules.
//!
//! Populated once from the declarative mapping resource and read-only
//! afterwards. Entries are hashed by rule id only; the value-kind lineage
//! picks the nearest registered target for a field's kind.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{FieldforgeError, Result};
use crate::model::ValueType;

/// Mapping bundled with the crate.
pub const DEFAULT_RULES: &str = include_str!("../../resources/validation-rules.yaml");

/// Rule-level metadata shared by every target of a rule id.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConstraintSpec {
    #[serde(default)]
    pub cross_validation: bool,
    #[serde(default)]
    pub default_message: Option<String>,
    /// Attribute values used when a declaration omits them
    #[serde(default)]
    pub defaults: IndexMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleSpec {
    pub rule: String,
    pub target: ValueType,
    pub client_name: String,
    #[serde(default)]
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RuleMapping {
    #[serde(default)]
    pub constraints: IndexMap<String, ConstraintSpec>,
    #[serde(default)]
    pub rules: Vec<RuleSpec>,
}

/// Client-side details of one registered rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationConfigDetails {
    pub client_name: String,
    pub attributes: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationRegistry {
    rules: HashMap<String, Vec<(ValueType, ValidationConfigDetails)>>,
    constraints: HashMap<String, ConstraintSpec>,
}

impl ValidationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry loaded from the bundled mapping.
    pub fn with_defaults() -> Result<Self> {
        Self::from_yaml_str(DEFAULT_RULES)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FieldforgeError::configuration(format!(
                "Failed to read validation mapping {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let mapping: RuleMapping = serde_yaml::from_str(yaml).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to parse validation mapping: {}", e))
        })?;

        Self::from_mapping(mapping)
    }

    pub fn from_mapping(mapping: RuleMapping) -> Result<Self> {
        let mut registry = Self::new();

        for (rule, constraint) in mapping.constraints {
            registry.constraints.insert(rule, constraint);
        }

        for spec in mapping.rules {
            if spec.client_name.trim().is_empty() {
                return Err(FieldforgeError::configuration(format!(
                    "Validation rule '{}' for {} has no client name",
                    spec.rule, spec.target
                )));
            }

            registry.register(
                spec.rule,
                spec.target,
                ValidationConfigDetails {
                    client_name: spec.client_name,
                    attributes: spec.attributes,
                },
            );
        }

        tracing::debug!("Validation registry loaded with {} rule ids", registry.rules.len());
        Ok(registry)
    }

    /// Register a rule for a target kind, replacing an entry for the same pair.
    pub fn register(&mut self, rule: impl Into<String>, target: ValueType, details: ValidationConfigDetails) {
        let candidates = self.rules.entry(rule.into()).or_default();

        match candidates.iter_mut().find(|(ty, _)| *ty == target) {
            Some(entry) => entry.1 = details,
            None => candidates.push((target, details)),
        }
    }

    /// Nearest registered target for `field_type`: exact match first, then up the lineage.
    pub fn lookup(&self, rule: &str, field_type: ValueType) -> Option<&ValidationConfigDetails> {
        let candidates = self.rules.get(rule)?;

        field_type.lineage().find_map(|ty| {
            candidates
                .iter()
                .find(|(target, _)| *target == ty)
                .map(|(_, details)| details)
        })
    }

    pub fn constraint(&self, rule: &str) -> Option<&ConstraintSpec> {
        self.constraints.get(rule)
    }

    pub fn has_rule(&self, rule: &str) -> bool {
        self.rules.contains_key(rule)
    }

    /// All registered entries, sorted by rule id.
    pub fn entries(&self) -> Vec<(&str, ValueType, &ValidationConfigDetails)> {
        let mut entries: Vec<_> = self
            .rules
            .iter()
            .flat_map(|(rule, candidates)| {
                candidates
                    .iter()
                    .map(move |(ty, details)| (rule.as_str(), *ty, details))
            })
            .collect();
        entries.sort_by(|a, b| a.0.cmp(b.0).then_with(|| a.2.client_name.cmp(&b.2.client_name)));
        entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load() {
        let registry = ValidationRegistry::with_defaults().unwrap();
        assert!(registry.has_rule("Required"));
        assert!(registry.has_rule("MaxLen"));
        assert!(registry.constraint("GreaterThan").unwrap().cross_validation);
    }

    #[test]
    fn test_supertype_rule_serves_subtypes() {
        let registry = ValidationRegistry::with_defaults().unwrap();

        let on_integer = registry.lookup("Min", ValueType::Integer).unwrap();
        let on_decimal = registry.lookup("Min", ValueType::Decimal).unwrap();
        assert_eq!(on_integer.client_name, "minValue");
        assert_eq!(on_integer, on_decimal);

        assert!(registry.lookup("Min", ValueType::String).is_none());
    }

    #[test]
    fn test_exact_target_wins_over_ancestor() {
        let mut registry = ValidationRegistry::new();
        registry.register(
            "GreaterThan",
            ValueType::Object,
            ValidationConfigDetails {
                client_name: "greaterThanAny".to_string(),
                attributes: vec![],
            },
        );
        registry.register(
            "GreaterThan",
            ValueType::Date,
            ValidationConfigDetails {
                client_name: "greaterThanDate".to_string(),
                attributes: vec!["field".to_string()],
            },
        );

        assert_eq!(
            registry.lookup("GreaterThan", ValueType::Date).unwrap().client_name,
            "greaterThanDate"
        );
        assert_eq!(
            registry.lookup("GreaterThan", ValueType::Long).unwrap().client_name,
            "greaterThanAny"
        );
    }

    #[test]
    fn test_rejects_rule_without_client_name() {
        let yaml = "rules:\n  - rule: Odd\n    target: Integer\n    client_name: ''\n";
        assert!(ValidationRegistry::from_yaml_str(yaml).is_err());
    }

    #[test]
    fn test_rejects_unknown_target() {
        let yaml = "rules:\n  - rule: Odd\n    target: Complex\n    client_name: odd\n";
        assert!(matches!(
            ValidationRegistry::from_yaml_str(yaml),
            Err(FieldforgeError::Configuration(_))
        ));
    }
}
