//! LOV resolution service.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::enums::{EnumConstant, EnumRegistry};
use super::pattern_cache::PatternCache;
use super::provider::{Dependent, LovProvider, LovProviderRegistry, QueryLovProvider, RowSource};
use super::LovError;
use crate::label::{humanize_constant, LabelResolver};
use crate::model::{LovOption, LovType};
use crate::security::SecurityContext;

pub struct LovService {
    enums: RwLock<EnumRegistry>,
    providers: RwLock<LovProviderRegistry>,
    stored: RwLock<IndexMap<String, Vec<LovOption>>>,
    patterns: PatternCache,
    labels: LabelResolver,
}

impl LovService {
    /// Service over `enums`, with labels resolved through `labels`.
    pub fn new(enums: EnumRegistry, labels: LabelResolver) -> Self {
        Self {
            enums: RwLock::new(enums),
            providers: RwLock::new(LovProviderRegistry::new()),
            stored: RwLock::new(IndexMap::new()),
            patterns: PatternCache::new(),
            labels,
        }
    }

    /// Compiled label patterns shared by query LOVs.
    pub fn patterns(&self) -> &PatternCache {
        &self.patterns
    }

    /// Add an enumeration usable as a static LOV.
    pub fn register_enum(&self, name: impl Into<String>, constants: Vec<EnumConstant>) -> crate::error::Result<()> {
        let mut enums = write(&self.enums, "enums")?;
        enums.register(name, constants)
    }

    /// Whether `lov_name` names a registered enumeration.
    pub fn is_enum_lov(&self, lov_name: &str) -> bool {
        read(&self.enums, "enums").map_or(false, |enums| enums.contains(lov_name))
    }

    /// Register a dynamic LOV provider.
    pub fn register_provider(&self, name: impl Into<String>, provider: Arc<dyn LovProvider>) -> Result<(), LovError> {
        let name = name.into();
        tracing::info!("Registering dynamic LOV '{}'", name);
        write(&self.providers, &name)?.register(name.clone(), provider);
        Ok(())
    }

    /// Register a closure as a dynamic LOV provider.
    pub fn register_fn<F>(&self, name: impl Into<String>, provider: F) -> Result<(), LovError>
    where
        F: Fn(Option<&str>, Option<&str>) -> Result<Vec<LovOption>, LovError> + Send + Sync + 'static,
    {
        self.register_provider(name, Arc::new(provider))
    }

    /// Register a closure whose options depend on a parent field value.
    pub fn register_dependent_fn<F>(&self, name: impl Into<String>, provider: F) -> Result<(), LovError>
    where
        F: Fn(Option<&str>, Option<&str>) -> Result<Vec<LovOption>, LovError> + Send + Sync + 'static,
    {
        self.register_provider(name, Arc::new(Dependent(provider)))
    }

    /// Register a query-backed LOV rendering rows with `label_pattern`.
    pub fn register_query(
        &self,
        name: &str,
        query: &str,
        value_column: &str,
        label_pattern: &str,
        dependency_param: Option<&str>,
        source: Arc<dyn RowSource>,
    ) -> Result<(), LovError> {
        let mut provider = QueryLovProvider::new(name, query, value_column, label_pattern, &self.patterns, source)?;
        if let Some(param) = dependency_param {
            provider = provider.depends_on(param);
        }
        self.register_provider(name, Arc::new(provider))
    }

    /// One option per enumeration constant, in declaration order.
    ///
    /// Labels: catalog key `<Enum>.<CONSTANT>.label`, then the inline label,
    /// then the humanized constant name.
    pub fn get_enum_lov_values(&self, lov_name: &str, locale: Option<&str>) -> Result<Vec<LovOption>, LovError> {
        let enums = read(&self.enums, lov_name)?;
        let constants = enums
            .constants(lov_name)
            .ok_or_else(|| LovError::NotFound(lov_name.to_string()))?;

        Ok(constants
            .iter()
            .map(|constant| {
                let label = self
                    .labels
                    .message(&format!("{}.{}.label", lov_name, constant.name), locale)
                    .or_else(|| constant.label.clone())
                    .unwrap_or_else(|| humanize_constant(&constant.name));

                LovOption::new(constant.name.clone(), label)
            })
            .collect())
    }

    /// Whether a dynamic LOV provider is registered under `name`.
    pub fn is_valid_dynamic_lov(&self, name: &str) -> bool {
        read(&self.providers, name).map_or(false, |providers| providers.has_provider(name))
    }

    /// Names of every registered dynamic LOV, sorted.
    pub fn dynamic_lov_names(&self) -> Vec<String> {
        read(&self.providers, "providers")
            .map(|providers| providers.list_providers())
            .unwrap_or_default()
    }

    /// Resolve a dynamic LOV for the caller.
    ///
    /// A dependent LOV with no parent value resolves to no options.
    pub fn get_dynamic_lov_values(
        &self,
        lov_name: &str,
        dependency: Option<&str>,
        locale: Option<&str>,
        security: &dyn SecurityContext,
    ) -> Result<Vec<LovOption>, LovError> {
        let provider = read(&self.providers, lov_name)?
            .get(lov_name)
            .ok_or_else(|| LovError::NotFound(lov_name.to_string()))?;

        if !security.is_lov_authorized(lov_name) {
            tracing::warn!("Rejected unauthorized access to dynamic LOV '{}'", lov_name);
            return Err(LovError::Unauthorized(lov_name.to_string()));
        }

        let dependency = dependency.map(str::trim).filter(|d| !d.is_empty());
        if provider.is_dependent() && dependency.is_none() {
            return Ok(Vec::new());
        }

        provider.values(dependency, locale)
    }

    /// Whether `value` is a constant name of the enumeration `lov_name`.
    ///
    /// Matching is case-sensitive; unknown enumerations accept nothing.
    pub fn is_valid_static_lov_value(&self, lov_name: &str, value: &str) -> bool {
        read(&self.enums, lov_name)
            .ok()
            .and_then(|enums| {
                enums
                    .constants(lov_name)
                    .map(|constants| constants.iter().any(|c| c.name == value))
            })
            .unwrap_or(false)
    }

    /// Whether `value` is among the options the caller can see for `lov_name`.
    pub fn is_valid_dynamic_lov_value(
        &self,
        lov_name: &str,
        dependency: Option<&str>,
        value: &str,
        security: &dyn SecurityContext,
    ) -> Result<bool, LovError> {
        let options = self.get_dynamic_lov_values(lov_name, dependency, None, security)?;
        Ok(options.iter().any(|o| o.value == value))
    }

    /// Create or replace a stored LOV.
    pub fn save_stored_lov(&self, name: impl Into<String>, options: Vec<LovOption>) -> Result<(), LovError> {
        let name = name.into();
        tracing::info!("Saving stored LOV '{}' with {} options", name, options.len());
        write(&self.stored, &name)?.insert(name, options);
        Ok(())
    }

    /// Options of a stored LOV, in saved order.
    pub fn get_stored_lov_values(&self, name: &str) -> Result<Vec<LovOption>, LovError> {
        read(&self.stored, name)?
            .get(name)
            .cloned()
            .ok_or_else(|| LovError::NotFound(name.to_string()))
    }

    /// Whether a stored LOV named `name` exists.
    pub fn is_valid_stored_lov(&self, name: &str) -> bool {
        read(&self.stored, name).map_or(false, |stored| stored.contains_key(name))
    }

    /// Whether `value` is an option of the stored LOV `name`.
    pub fn is_valid_stored_lov_value(&self, name: &str, value: &str) -> bool {
        self.get_stored_lov_values(name)
            .map(|options| options.iter().any(|o| o.value == value))
            .unwrap_or(false)
    }

    /// Resolve any LOV kind, as exposed by `fetch/{lovName}/{type}`.
    pub fn fetch(
        &self,
        lov_name: &str,
        lov_type: LovType,
        locale: Option<&str>,
        security: &dyn SecurityContext,
    ) -> Result<Vec<LovOption>, LovError> {
        match lov_type {
            LovType::Static => self.get_enum_lov_values(lov_name, locale),
            LovType::Dynamic => self.get_dynamic_lov_values(lov_name, None, locale, security),
            LovType::Stored => self.get_stored_lov_values(lov_name),
        }
    }
}

fn read<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockReadGuard<'a, T>, LovError> {
    lock.read().map_err(|_| LovError::Provider {
        name: name.to_string(),
        reason: "LOV registry lock poisoned".to_string(),
    })
}

fn write<'a, T>(lock: &'a RwLock<T>, name: &str) -> Result<RwLockWriteGuard<'a, T>, LovError> {
    lock.write().map_err(|_| LovError::Provider {
        name: name.to_string(),
        reason: "LOV registry lock poisoned".to_string(),
    })
}
