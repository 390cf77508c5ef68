//! Engine configuration.
//!
//! Loaded from `fieldforge.yaml`; every key is optional. Binaries apply
//! `FIELDFORGE_*` environment overrides on top (after `dotenv`).
//!
//! ```yaml
//! models_dir: config/models
//! enums_file: config/enums.yaml
//! messages_dir: config/messages
//! default_locale: en
//! date_format: "%d/%m/%Y"
//! column_pool_size: 20
//! lov_data_file: config/lov-data.yaml
//! query_lovs:
//!   - name: cities
//!     query: cities
//!     value_column: id
//!     label_pattern: "{name}"
//!     depends_on: state
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FieldforgeError, Result};
use crate::extension::ExtensionLimits;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    /// Directory of model declaration YAML files
    pub models_dir: Option<PathBuf>,
    /// YAML file with the `enums:` map
    pub enums_file: Option<PathBuf>,
    /// Directory of `messages.yaml` / `messages_<locale>.yaml` bundles
    pub messages_dir: Option<PathBuf>,
    /// Replaces the built-in validation rule mapping
    pub validation_rules: Option<PathBuf>,
    pub default_locale: String,
    /// chrono format used for model definitions and DATE extension values
    pub date_format: String,
    pub max_extension_field_length: u32,
    pub max_lov_options_length: usize,
    pub column_pool_size: usize,
    pub column_prefix: String,
    /// Tables backing `query_lovs` when no external row source is supplied
    pub lov_data_file: Option<PathBuf>,
    pub query_lovs: Vec<QueryLovConfig>,
}

/// Dynamic LOV rendered from rows of a named query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QueryLovConfig {
    pub name: String,
    pub query: String,
    pub value_column: String,
    /// Label template over row columns, e.g. `"{name} ({code})"`
    pub label_pattern: String,
    /// Query parameter bound to the parent field value
    #[serde(default)]
    pub depends_on: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            models_dir: None,
            enums_file: None,
            messages_dir: None,
            validation_rules: None,
            default_locale: "en".to_string(),
            date_format: "%d/%m/%Y".to_string(),
            max_extension_field_length: 1000,
            max_lov_options_length: 2000,
            column_pool_size: 20,
            column_prefix: "field".to_string(),
            lov_data_file: None,
            query_lovs: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load configuration from a YAML file.
    ///
    /// Relative paths inside the file are resolved against the file's directory.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use fieldforge::EngineConfig;
    ///
    /// let config = EngineConfig::from_file("fieldforge.yaml")?.with_env_overrides()?;
    /// config.validate()?;
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to read config file {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_yaml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        Ok(config)
    }

    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml)
            .map_err(|e| FieldforgeError::configuration(format!("Failed to parse config: {}", e)))
    }

    /// Apply `FIELDFORGE_*` variables from the process environment.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Apply overrides from `lookup`, keyed by environment variable name.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("FIELDFORGE_MODELS_DIR") {
            self.models_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FIELDFORGE_ENUMS_FILE") {
            self.enums_file = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FIELDFORGE_MESSAGES_DIR") {
            self.messages_dir = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FIELDFORGE_VALIDATION_RULES") {
            self.validation_rules = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("FIELDFORGE_DEFAULT_LOCALE") {
            self.default_locale = v;
        }
        if let Some(v) = lookup("FIELDFORGE_DATE_FORMAT") {
            self.date_format = v;
        }
        if let Some(v) = lookup("FIELDFORGE_MAX_EXTENSION_FIELD_LENGTH") {
            self.max_extension_field_length = parse_number("FIELDFORGE_MAX_EXTENSION_FIELD_LENGTH", &v)?;
        }
        if let Some(v) = lookup("FIELDFORGE_MAX_LOV_OPTIONS_LENGTH") {
            self.max_lov_options_length = parse_number("FIELDFORGE_MAX_LOV_OPTIONS_LENGTH", &v)?;
        }
        if let Some(v) = lookup("FIELDFORGE_COLUMN_POOL_SIZE") {
            self.column_pool_size = parse_number("FIELDFORGE_COLUMN_POOL_SIZE", &v)?;
        }
        if let Some(v) = lookup("FIELDFORGE_COLUMN_PREFIX") {
            self.column_prefix = v;
        }
        if let Some(v) = lookup("FIELDFORGE_LOV_DATA_FILE") {
            self.lov_data_file = Some(PathBuf::from(v));
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.default_locale.trim().is_empty() {
            return Err(FieldforgeError::configuration("default_locale cannot be empty"));
        }
        if self.date_format.trim().is_empty() {
            return Err(FieldforgeError::configuration("date_format cannot be empty"));
        }
        if self.max_extension_field_length == 0 {
            return Err(FieldforgeError::configuration("max_extension_field_length must be positive"));
        }
        if self.max_lov_options_length == 0 {
            return Err(FieldforgeError::configuration("max_lov_options_length must be positive"));
        }
        if self.column_pool_size == 0 {
            return Err(FieldforgeError::configuration("column_pool_size must be positive"));
        }
        for lov in &self.query_lovs {
            if lov.name.trim().is_empty() || lov.query.trim().is_empty() || lov.value_column.trim().is_empty() {
                return Err(FieldforgeError::configuration(format!(
                    "Query LOV '{}' needs a name, a query and a value column",
                    lov.name
                )));
            }
        }
        if self.column_prefix.trim().is_empty() || !self.column_prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FieldforgeError::configuration(format!(
                "column_prefix '{}' must be a non-empty identifier",
                self.column_prefix
            )));
        }
        Ok(())
    }

    pub fn extension_limits(&self) -> ExtensionLimits {
        ExtensionLimits {
            max_field_length: self.max_extension_field_length,
            max_lov_options_length: self.max_lov_options_length,
            column_prefix: self.column_prefix.clone(),
            column_pool_size: self.column_pool_size,
            date_format: self.date_format.clone(),
        }
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.models_dir,
            &mut self.enums_file,
            &mut self.messages_dir,
            &mut self.validation_rules,
            &mut self.lov_data_file,
        ]
        .into_iter()
        .flatten()
        {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| FieldforgeError::configuration(format!("{} must be a number, got '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = EngineConfig::from_yaml_str("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.date_format, "%d/%m/%Y");
        assert_eq!(config.column_pool_size, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(EngineConfig::from_yaml_str("colum_pool_size: 5").is_err());
    }

    #[test]
    fn test_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("FIELDFORGE_COLUMN_POOL_SIZE", "5"),
            ("FIELDFORGE_DEFAULT_LOCALE", "de"),
        ]);
        let config = EngineConfig::default()
            .with_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.column_pool_size, 5);
        assert_eq!(config.default_locale, "de");

        let bad = EngineConfig::default().with_overrides(|key| {
            (key == "FIELDFORGE_COLUMN_POOL_SIZE").then(|| "many".to_string())
        });
        assert!(bad.is_err());
    }

    #[test]
    fn test_validate_rejects_nonsense() {
        let mut config = EngineConfig::default();
        config.column_pool_size = 0;
        assert!(config.validate().is_err());

        let mut config = EngineConfig::default();
        config.column_prefix = "field-".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_query_lovs() {
        let yaml = "query_lovs:\n  - name: cities\n    query: cities\n    value_column: id\n    label_pattern: \"{name}\"\n    depends_on: state\n";
        let config = EngineConfig::from_yaml_str(yaml).unwrap();

        assert_eq!(config.query_lovs[0].depends_on.as_deref(), Some("state"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_relative_paths_resolved_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fieldforge.yaml");
        std::fs::write(&path, "models_dir: models\nenums_file: /etc/enums.yaml\n").unwrap();

        let config = EngineConfig::from_file(&path).unwrap();
        assert_eq!(config.models_dir, Some(dir.path().join("models")));
        assert_eq!(config.enums_file, Some(PathBuf::from("/etc/enums.yaml")));
    }
}
