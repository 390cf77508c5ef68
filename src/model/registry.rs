//! Model registry with a build-once definition cache.

use indexmap::IndexMap;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::builder::ModelDefinitionBuilder;
use super::declaration::{Model, ModelDecl};
use super::types::ModelDef;
use super::yaml_loader::validate_model;
use crate::error::{FieldforgeError, Result};
use crate::extension::ExtensionPoint;

/// Registered declarations and their lazily built definitions.
///
/// Definitions are built at most once per model and shared afterwards.
pub struct ModelRegistry {
    builder: ModelDefinitionBuilder,
    /// Keyed by simple name
    declarations: RwLock<IndexMap<String, Arc<ModelDecl>>>,
    /// Keyed by client model name
    definitions: RwLock<HashMap<String, Arc<ModelDef>>>,
    build_lock: Mutex<()>,
    builds: AtomicUsize,
}

impl ModelRegistry {
    pub fn new(builder: ModelDefinitionBuilder) -> Self {
        Self {
            builder,
            declarations: RwLock::new(IndexMap::new()),
            definitions: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
            builds: AtomicUsize::new(0),
        }
    }

    /// Register a declaration.
    ///
    /// Unmarked declarations may be registered as `extends` parents but cannot
    /// be described on their own.
    pub fn register(&self, decl: ModelDecl) -> Result<()> {
        validate_model(&decl)?;

        let mut declarations = self
            .declarations
            .write()
            .map_err(|_| poisoned("model declarations"))?;

        if declarations.contains_key(&decl.name) {
            return Err(FieldforgeError::configuration(format!(
                "Model '{}' is already registered",
                decl.name
            )));
        }

        tracing::info!("Registered model '{}'", decl.qualified_name());
        declarations.insert(decl.name.clone(), Arc::new(decl));
        Ok(())
    }

    /// Drop a declaration registered under its simple `name`.
    pub fn unregister(&self, name: &str) -> Result<()> {
        let mut declarations = self
            .declarations
            .write()
            .map_err(|_| poisoned("model declarations"))?;
        if declarations.shift_remove(name).is_some() {
            tracing::info!("Unregistered model '{}'", name);
        }
        Ok(())
    }

    pub fn register_model<T: Model>(&self) -> Result<()> {
        self.register(T::declaration())
    }

    /// Build every marked model now, so configuration errors surface at startup.
    pub fn build_all(&self) -> Result<Vec<Arc<ModelDef>>> {
        self.model_names()?
            .iter()
            .map(|name| self.model_def(name))
            .collect()
    }

    /// Client names of every marked model, in registration order.
    pub fn model_names(&self) -> Result<Vec<String>> {
        let declarations = self
            .declarations
            .read()
            .map_err(|_| poisoned("model declarations"))?;

        Ok(declarations
            .values()
            .filter(|d| d.is_model())
            .map(|d| d.model_name().to_string())
            .collect())
    }

    /// Cached definition of a model, built on first use.
    pub fn model_def(&self, model_name: &str) -> Result<Arc<ModelDef>> {
        if let Some(def) = self.cached(model_name)? {
            tracing::debug!("Model definition cache hit for '{}'", model_name);
            return Ok(def);
        }

        let _guard = self.build_lock.lock().map_err(|_| poisoned("model build lock"))?;

        // Another thread may have finished the build while we waited.
        if let Some(def) = self.cached(model_name)? {
            return Ok(def);
        }

        tracing::debug!("Building model definition for '{}'", model_name);
        let decl = self.resolve(model_name)?;
        let def = Arc::new(self.builder.build(&decl, None)?);
        self.builds.fetch_add(1, Ordering::SeqCst);

        self.definitions
            .write()
            .map_err(|_| poisoned("model definitions"))?
            .insert(model_name.to_string(), Arc::clone(&def));

        Ok(def)
    }

    /// Uncached definition with labels and messages resolved for `locale`.
    pub fn localized_model_def(&self, model_name: &str, locale: &str) -> Result<ModelDef> {
        let decl = self.resolve(model_name)?;
        self.builder.build(&decl, Some(locale))
    }

    pub fn model_defs(&self) -> Result<Vec<Arc<ModelDef>>> {
        self.build_all()
    }

    /// Number of definitions built so far.
    pub fn build_count(&self) -> usize {
        self.builds.load(Ordering::SeqCst)
    }

    /// Extension points declared by registered extendable models.
    pub fn extension_points(&self) -> Result<Vec<ExtensionPoint>> {
        let declarations = self
            .declarations
            .read()
            .map_err(|_| poisoned("model declarations"))?;

        Ok(declarations
            .values()
            .filter_map(|d| {
                d.extension_name()
                    .map(|name| ExtensionPoint::new(name, d.qualified_name()))
            })
            .collect())
    }

    fn cached(&self, model_name: &str) -> Result<Option<Arc<ModelDef>>> {
        let definitions = self
            .definitions
            .read()
            .map_err(|_| poisoned("model definitions"))?;
        Ok(definitions.get(model_name).cloned())
    }

    /// Declaration of `model_name` with inherited fields merged in front.
    fn resolve(&self, model_name: &str) -> Result<ModelDecl> {
        let declarations = self
            .declarations
            .read()
            .map_err(|_| poisoned("model declarations"))?;

        let decl = declarations
            .values()
            .find(|d| d.is_model() && d.model_name() == model_name)
            .ok_or_else(|| FieldforgeError::NotFound(format!("model '{}'", model_name)))?;

        let mut chain = vec![Arc::clone(decl)];
        let mut seen: HashSet<&str> = HashSet::from([decl.name.as_str()]);
        let mut current = decl;

        while let Some(parent_name) = &current.extends {
            let parent = declarations.get(parent_name).ok_or_else(|| {
                FieldforgeError::configuration(format!(
                    "Model '{}' extends unknown model '{}'",
                    current.name, parent_name
                ))
            })?;

            if !seen.insert(parent.name.as_str()) {
                return Err(FieldforgeError::configuration(format!(
                    "Model '{}' has a cyclic extends chain",
                    decl.name
                )));
            }

            chain.push(Arc::clone(parent));
            current = parent;
        }

        let mut merged = ModelDecl::clone(decl);
        merged.fields = chain.iter().rev().flat_map(|d| d.fields.iter().cloned()).collect();
        validate_model(&merged)?;

        Ok(merged)
    }
}

fn poisoned(what: &str) -> FieldforgeError {
    FieldforgeError::Internal(format!("{} lock poisoned", what))
}
