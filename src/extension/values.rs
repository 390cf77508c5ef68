//! Submitted extension values checked against field metadata.

use chrono::NaiveDate;
use indexmap::IndexMap;
use regex::Regex;

use super::entity::ExtensionFieldEntity;
use crate::error::{FieldViolation, FieldforgeError, Result};
use crate::model::FieldType;

pub struct ExtensionValueValidator {
    date_format: String,
    integer: Regex,
    decimal: Regex,
}

impl ExtensionValueValidator {
    pub fn new(date_format: impl Into<String>) -> Self {
        Self {
            date_format: date_format.into(),
            integer: Regex::new(r"^\d+$").expect("valid integer pattern"),
            decimal: Regex::new(r"^\d+(\.\d+)?$").expect("valid decimal pattern"),
        }
    }

    pub fn date_format(&self) -> &str {
        &self.date_format
    }

    /// Check `values` (field name to text) against `fields`.
    ///
    /// Every field is checked and all violations are reported together.
    /// Returns the accepted values keyed by storage column.
    pub fn validate(
        &self,
        fields: &[ExtensionFieldEntity],
        values: &IndexMap<String, String>,
    ) -> Result<IndexMap<String, String>> {
        let mut violations = Vec::new();
        let mut columns = IndexMap::new();

        for name in values.keys() {
            if !fields.iter().any(|f| &f.name == name) {
                violations.push(FieldViolation::new(name.clone(), "is not a defined extension field"));
            }
        }

        for field in fields {
            let value = values.get(&field.name).map(|v| v.trim()).filter(|v| !v.is_empty());

            match value {
                None if field.required => {
                    violations.push(FieldViolation::new(field.name.clone(), "value is required"));
                }
                None => {}
                Some(value) => match self.check(field, value) {
                    Ok(()) => {
                        columns.insert(field.column_name.clone(), value.to_string());
                    }
                    Err(message) => violations.push(FieldViolation::new(field.name.clone(), message)),
                },
            }
        }

        if violations.is_empty() {
            Ok(columns)
        } else {
            Err(FieldforgeError::invalid_fields(violations))
        }
    }

    fn check(&self, field: &ExtensionFieldEntity, value: &str) -> std::result::Result<(), String> {
        match field.field_type {
            FieldType::Integer if !self.integer.is_match(value) => {
                Err(format!("'{}' is not a valid integer", value))
            }
            FieldType::Decimal if !self.decimal.is_match(value) => {
                Err(format!("'{}' is not a valid decimal", value))
            }
            FieldType::Boolean if value != "true" && value != "false" => {
                Err(format!("'{}' is not a valid boolean, expected true or false", value))
            }
            FieldType::Date if NaiveDate::parse_from_str(value, &self.date_format).is_err() => {
                Err(format!("'{}' is not a valid date ({})", value, self.date_format))
            }
            FieldType::ListOfValues => {
                let options = field.lov_options.as_deref().unwrap_or_default();
                if options.iter().any(|o| o.value == value) {
                    Ok(())
                } else {
                    Err(format!("'{}' is not one of the allowed values", value))
                }
            }
            FieldType::String | FieldType::MultiLineString => match field.max_length {
                Some(max) if value.chars().count() > max as usize => {
                    Err(format!("value exceeds the maximum length of {}", max))
                }
                _ => Ok(()),
            },
            FieldType::File | FieldType::Image => {
                Err(format!("{} values cannot be stored as extension values", field.field_type))
            }
            _ => Ok(()),
        }
    }
}
