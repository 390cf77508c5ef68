//! Declared enumerations backing static LOVs.
//!
//! ```yaml
//! enums:
//!   Status: [ACTIVE, { name: IN_PROGRESS, label: Working }, CLOSED]
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{FieldforgeError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
enum ConstantSpec {
    Name(String),
    Full {
        name: String,
        #[serde(default)]
        label: Option<String>,
    },
}

impl From<ConstantSpec> for EnumConstant {
    fn from(spec: ConstantSpec) -> Self {
        match spec {
            ConstantSpec::Name(name) => EnumConstant { name, label: None },
            ConstantSpec::Full { name, label } => EnumConstant { name, label },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct EnumFile {
    #[serde(default)]
    enums: IndexMap<String, Vec<ConstantSpec>>,
}

/// One enumeration constant with its optional inline label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumConstant {
    pub name: String,
    pub label: Option<String>,
}

impl EnumConstant {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: None,
        }
    }

    pub fn labeled(name: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            label: Some(label.into()),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EnumRegistry {
    enums: IndexMap<String, Vec<EnumConstant>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FieldforgeError::configuration(format!(
                "Failed to read enum file {}: {}",
                path.display(),
                e
            ))
        })?;

        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let file: EnumFile = serde_yaml::from_str(yaml).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to parse enum declarations: {}", e))
        })?;

        let mut registry = Self::new();
        for (name, constants) in file.enums {
            registry.register(name, constants.into_iter().map(EnumConstant::from).collect())?;
        }
        Ok(registry)
    }

    pub fn register(&mut self, name: impl Into<String>, constants: Vec<EnumConstant>) -> Result<()> {
        let name = name.into();

        if constants.is_empty() {
            return Err(FieldforgeError::configuration(format!(
                "Enumeration '{}' declares no constants",
                name
            )));
        }

        self.enums.insert(name, constants);
        Ok(())
    }

    pub fn constants(&self, name: &str) -> Option<&[EnumConstant]> {
        self.enums.get(name).map(Vec::as_slice)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.enums.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.enums.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_and_labeled_constants() {
        let yaml = "enums:\n  Status: [ACTIVE, { name: IN_PROGRESS, label: Working }]\n";
        let registry = EnumRegistry::from_yaml_str(yaml).unwrap();

        let constants = registry.constants("Status").unwrap();
        assert_eq!(constants[0], EnumConstant::new("ACTIVE"));
        assert_eq!(constants[1], EnumConstant::labeled("IN_PROGRESS", "Working"));
        assert!(registry.contains("Status"));
        assert!(!registry.contains("Priority"));
    }

    #[test]
    fn test_empty_enumeration_rejected() {
        let yaml = "enums:\n  Empty: []\n";
        assert!(EnumRegistry::from_yaml_str(yaml).is_err());
    }
}
