//! External message catalog.
//!
//! Bundles are flat YAML maps of key to text. `messages.yaml` holds the default
//! locale, `messages_<locale>.yaml` holds overrides for one locale.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum CatalogError {
    #[error("Failed to read message bundle {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("Failed to parse message bundle {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Message lookup failed for '{key}': {reason}")]
    Lookup { key: String, reason: String },
}

/// Source of localized messages.
///
/// Lookups may fail; callers resolving labels treat failures as "not found".
pub trait MessageSource: Send + Sync {
    fn message(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, CatalogError>;
}

/// Catalog with no messages.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyMessages;

impl MessageSource for EmptyMessages {
    fn message(&self, _key: &str, _locale: Option<&str>) -> Result<Option<String>, CatalogError> {
        Ok(None)
    }
}

/// In-memory, per-locale message catalog.
#[derive(Debug, Clone)]
pub struct MessageCatalog {
    default_locale: String,
    bundles: HashMap<String, HashMap<String, String>>,
}

impl MessageCatalog {
    pub fn new(default_locale: impl Into<String>) -> Self {
        Self {
            default_locale: default_locale.into(),
            bundles: HashMap::new(),
        }
    }

    /// Load every `messages*.yaml` bundle from a directory.
    pub fn load_dir<P: AsRef<Path>>(dir: P, default_locale: &str) -> Result<Self, CatalogError> {
        let dir = dir.as_ref();
        let mut catalog = Self::new(default_locale);

        let read_dir = fs::read_dir(dir).map_err(|e| CatalogError::Io {
            path: dir.display().to_string(),
            reason: e.to_string(),
        })?;

        for entry in read_dir {
            let entry = entry.map_err(|e| CatalogError::Io {
                path: dir.display().to_string(),
                reason: e.to_string(),
            })?;
            let path = entry.path();

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let is_yaml = path
                .extension()
                .map_or(false, |ext| ext == "yaml" || ext == "yml");
            if !is_yaml {
                continue;
            }

            let locale = match stem.strip_prefix("messages") {
                Some("") => default_locale.to_string(),
                Some(rest) => match rest.strip_prefix('_') {
                    Some(locale) => locale.to_string(),
                    None => continue,
                },
                None => continue,
            };

            let bundle = Self::read_bundle(&path)?;
            tracing::debug!("Loaded {} messages for locale '{}'", bundle.len(), locale);
            catalog.add_bundle(&locale, bundle);
        }

        Ok(catalog)
    }

    fn read_bundle(path: &Path) -> Result<HashMap<String, String>, CatalogError> {
        let contents = fs::read_to_string(path).map_err(|e| CatalogError::Io {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        serde_yaml::from_str(&contents).map_err(|e| CatalogError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    pub fn default_locale(&self) -> &str {
        &self.default_locale
    }

    /// Merge messages into a locale bundle.
    pub fn add_bundle(&mut self, locale: &str, messages: HashMap<String, String>) {
        self.bundles
            .entry(locale.to_string())
            .or_default()
            .extend(messages);
    }

    pub fn with_message(
        mut self,
        locale: &str,
        key: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        self.bundles
            .entry(locale.to_string())
            .or_default()
            .insert(key.into(), text.into());
        self
    }

    /// Exact locale, then its language part (`fr_CA` -> `fr`), then the default locale.
    pub fn lookup(&self, key: &str, locale: Option<&str>) -> Option<&str> {
        let mut candidates: Vec<&str> = Vec::with_capacity(3);
        if let Some(locale) = locale {
            candidates.push(locale);
            if let Some((language, _)) = locale.split_once(['_', '-']) {
                candidates.push(language);
            }
        }
        candidates.push(&self.default_locale);

        candidates.into_iter().find_map(|locale| {
            self.bundles
                .get(locale)
                .and_then(|bundle| bundle.get(key))
                .map(String::as_str)
        })
    }
}

impl MessageSource for MessageCatalog {
    fn message(&self, key: &str, locale: Option<&str>) -> Result<Option<String>, CatalogError> {
        Ok(self.lookup(key, locale).map(str::to_string))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_falls_back_to_default_locale() {
        let catalog = MessageCatalog::new("en")
            .with_message("en", "greeting", "Hello")
            .with_message("fr", "greeting", "Bonjour")
            .with_message("en", "farewell", "Bye");

        assert_eq!(catalog.lookup("greeting", Some("fr")), Some("Bonjour"));
        assert_eq!(catalog.lookup("greeting", Some("fr_CA")), Some("Bonjour"));
        assert_eq!(catalog.lookup("farewell", Some("fr")), Some("Bye"));
        assert_eq!(catalog.lookup("greeting", None), Some("Hello"));
        assert_eq!(catalog.lookup("missing", Some("fr")), None);
    }

    #[test]
    fn test_load_dir_assigns_locales_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("messages.yaml"),
            "\"Customer.label\": Customer\n",
        )
        .unwrap();
        fs::write(
            dir.path().join("messages_de.yaml"),
            "\"Customer.label\": Kunde\n",
        )
        .unwrap();
        fs::write(dir.path().join("other.yaml"), "x: y\n").unwrap();

        let catalog = MessageCatalog::load_dir(dir.path(), "en").unwrap();
        assert_eq!(catalog.lookup("Customer.label", None), Some("Customer"));
        assert_eq!(catalog.lookup("Customer.label", Some("de")), Some("Kunde"));
        assert_eq!(catalog.lookup("x", None), None);
    }

    #[test]
    fn test_load_dir_reports_parse_errors() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("messages.yaml"), "- not\n- a map\n").unwrap();

        let result = MessageCatalog::load_dir(dir.path(), "en");
        assert!(matches!(result, Err(CatalogError::Parse { .. })));
    }
}
