//! Dynamic LOV providers.
//!
//! A provider produces value/label pairs from live data. Any closure with the
//! right signature is a provider; [`QueryLovProvider`] covers the common case
//! of rendering rows returned by the external query layer.

use indexmap::IndexMap;
use serde_json::Value;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::{Arc, RwLock};

use super::pattern_cache::{CompiledPattern, PatternCache};
use super::LovError;
use crate::error::FieldforgeError;
use crate::model::LovOption;

/// One row returned by a [`RowSource`].
pub type Row = IndexMap<String, Value>;

/// Trait for dynamic LOV providers
pub trait LovProvider: Send + Sync {
    /// Resolve the options; `dependency` is the parent field value for dependent LOVs.
    fn values(&self, dependency: Option<&str>, locale: Option<&str>) -> Result<Vec<LovOption>, LovError>;

    /// Dependent providers yield nothing until a parent value is known.
    fn is_dependent(&self) -> bool {
        false
    }
}

/// Simple function-based implementation of LovProvider
impl<F> LovProvider for F
where
    F: Fn(Option<&str>, Option<&str>) -> Result<Vec<LovOption>, LovError> + Send + Sync,
{
    fn values(&self, dependency: Option<&str>, locale: Option<&str>) -> Result<Vec<LovOption>, LovError> {
        self(dependency, locale)
    }
}

/// Marks the wrapped provider as dependent on a parent field value.
pub struct Dependent<P>(pub P);

impl<P: LovProvider> LovProvider for Dependent<P> {
    fn values(&self, dependency: Option<&str>, locale: Option<&str>) -> Result<Vec<LovOption>, LovError> {
        self.0.values(dependency, locale)
    }

    fn is_dependent(&self) -> bool {
        true
    }
}

/// Registry for named dynamic LOV providers
#[derive(Default)]
pub struct LovProviderRegistry {
    providers: HashMap<String, Arc<dyn LovProvider>>,
}

impl LovProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a provider, replacing any provider with the same name
    pub fn register(&mut self, name: impl Into<String>, provider: Arc<dyn LovProvider>) {
        self.providers.insert(name.into(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LovProvider>> {
        self.providers.get(name).cloned()
    }

    pub fn has_provider(&self, name: &str) -> bool {
        self.providers.contains_key(name)
    }

    /// Get list of all registered provider names, sorted
    pub fn list_providers(&self) -> Vec<String> {
        let mut names: Vec<String> = self.providers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// External query layer.
///
/// `params` holds named filter values; implementations decide how the query
/// text and parameters map onto their storage.
pub trait RowSource: Send + Sync {
    fn query(&self, query: &str, params: &IndexMap<String, String>) -> Result<Vec<Row>, LovError>;
}

/// Row source over named in-memory tables.
///
/// The query text names a table; each parameter keeps only rows whose column
/// of the same name has that value. Row order is insertion order.
#[derive(Default)]
pub struct InMemoryRowSource {
    tables: RwLock<HashMap<String, Vec<Row>>>,
}

impl InMemoryRowSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load tables from YAML:
    ///
    /// ```yaml
    /// tables:
    ///   cities:
    ///     - { id: 1, name: Hyderabad, state: AP }
    /// ```
    pub fn load_file<P: AsRef<Path>>(path: P) -> crate::error::Result<Self> {
        #[derive(Deserialize)]
        struct TableFile {
            #[serde(default)]
            tables: IndexMap<String, Vec<Row>>,
        }

        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to read LOV data file {}: {}", path.display(), e))
        })?;
        let file: TableFile = serde_yaml::from_str(&contents).map_err(|e| {
            FieldforgeError::configuration(format!("Failed to parse LOV data file {}: {}", path.display(), e))
        })?;

        let source = Self::new();
        for (table, rows) in file.tables {
            source.insert_rows(table, rows);
        }
        Ok(source)
    }

    pub fn insert_rows(&self, table: impl Into<String>, rows: impl IntoIterator<Item = Row>) {
        if let Ok(mut tables) = self.tables.write() {
            tables.entry(table.into()).or_default().extend(rows);
        }
    }
}

impl RowSource for InMemoryRowSource {
    fn query(&self, query: &str, params: &IndexMap<String, String>) -> Result<Vec<Row>, LovError> {
        let tables = self.tables.read().map_err(|_| LovError::Provider {
            name: query.to_string(),
            reason: "row source lock poisoned".to_string(),
        })?;

        let rows = tables.get(query).ok_or_else(|| LovError::Provider {
            name: query.to_string(),
            reason: format!("unknown table '{}'", query),
        })?;

        Ok(rows
            .iter()
            .filter(|row| {
                params
                    .iter()
                    .all(|(column, expected)| row.get(column).map(value_text).as_deref() == Some(expected.as_str()))
            })
            .cloned()
            .collect())
    }
}

/// Provider rendering rows of a named query into options.
pub struct QueryLovProvider {
    name: String,
    query: String,
    value_column: String,
    label_pattern: Arc<CompiledPattern>,
    dependency_param: Option<String>,
    source: Arc<dyn RowSource>,
}

impl QueryLovProvider {
    pub fn new(
        name: impl Into<String>,
        query: impl Into<String>,
        value_column: impl Into<String>,
        label_pattern: &str,
        patterns: &PatternCache,
        source: Arc<dyn RowSource>,
    ) -> Result<Self, LovError> {
        Ok(Self {
            name: name.into(),
            query: query.into(),
            value_column: value_column.into(),
            label_pattern: patterns.get_or_compile(label_pattern)?,
            dependency_param: None,
            source,
        })
    }

    /// Filter rows by the parent field value bound to `param`.
    pub fn depends_on(mut self, param: impl Into<String>) -> Self {
        self.dependency_param = Some(param.into());
        self
    }
}

impl LovProvider for QueryLovProvider {
    fn values(&self, dependency: Option<&str>, _locale: Option<&str>) -> Result<Vec<LovOption>, LovError> {
        let mut params = IndexMap::new();
        if let (Some(param), Some(value)) = (&self.dependency_param, dependency) {
            params.insert(param.clone(), value.to_string());
        }

        let rows = self.source.query(&self.query, &params)?;

        rows.iter()
            .map(|row| {
                let value = row
                    .get(&self.value_column)
                    .map(value_text)
                    .ok_or_else(|| LovError::Provider {
                        name: self.name.clone(),
                        reason: format!("row has no '{}' column", self.value_column),
                    })?;

                Ok(LovOption::new(value, self.label_pattern.render(row)))
            })
            .collect()
    }

    fn is_dependent(&self) -> bool {
        self.dependency_param.is_some()
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
