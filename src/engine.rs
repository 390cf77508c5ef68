//! Wiring of the registries and services into one engine.

use std::sync::Arc;

use crate::catalog::{EmptyMessages, MessageCatalog, MessageSource};
use crate::config::EngineConfig;
use crate::error::{FieldforgeError, Result};
use crate::extension::{
    ExtendedRecordStore, ExtensionPoint, ExtensionService, ExtensionStore, InMemoryExtensionStore,
    InMemoryRecordStore,
};
use crate::label::LabelResolver;
use crate::lov::{EnumRegistry, InMemoryRowSource, LovService, RowSource};
use crate::model::{load_models, Model, ModelDecl, ModelDefinitionBuilder, ModelRegistry};
use crate::validation::{ValidationRegistry, ValidationRuleMapper};

pub struct Engine {
    config: EngineConfig,
    labels: LabelResolver,
    validations: Arc<ValidationRuleMapper>,
    lovs: Arc<LovService>,
    models: ModelRegistry,
    extensions: ExtensionService,
}

impl Engine {
    /// Engine with in-memory extension and record stores.
    pub fn from_config(config: EngineConfig) -> Result<Self> {
        Self::with_stores(
            config,
            Arc::new(InMemoryExtensionStore::new()),
            Arc::new(InMemoryRecordStore::new()),
        )
    }

    /// Build the engine and register every model found in `models_dir`.
    ///
    /// Models are described lazily; call [`Engine::check`] to surface
    /// configuration errors up front.
    pub fn with_stores(
        config: EngineConfig,
        store: Arc<dyn ExtensionStore>,
        records: Arc<dyn ExtendedRecordStore>,
    ) -> Result<Self> {
        config.validate()?;

        let messages: Arc<dyn MessageSource> = match &config.messages_dir {
            Some(dir) => Arc::new(
                MessageCatalog::load_dir(dir, &config.default_locale)
                    .map_err(|e| FieldforgeError::configuration(e.to_string()))?,
            ),
            None => Arc::new(EmptyMessages),
        };
        let labels = LabelResolver::new(messages);

        let rules = match &config.validation_rules {
            Some(path) => ValidationRegistry::from_file(path)?,
            None => ValidationRegistry::with_defaults()?,
        };
        let validations = Arc::new(ValidationRuleMapper::new(rules, labels.clone()));

        let enums = match &config.enums_file {
            Some(path) => EnumRegistry::load_file(path)?,
            None => EnumRegistry::new(),
        };
        let lovs = Arc::new(LovService::new(enums, labels.clone()));

        let builder = ModelDefinitionBuilder::new(
            labels.clone(),
            Arc::clone(&validations),
            Arc::clone(&lovs),
            config.date_format.clone(),
        );

        let engine = Self {
            models: ModelRegistry::new(builder),
            extensions: ExtensionService::new(store, records, config.extension_limits()),
            config,
            labels,
            validations,
            lovs,
        };

        if !engine.config.query_lovs.is_empty() {
            let source: Arc<dyn RowSource> = match &engine.config.lov_data_file {
                Some(path) => Arc::new(InMemoryRowSource::load_file(path)?),
                None => Arc::new(InMemoryRowSource::new()),
            };
            engine.register_query_lovs(source)?;
        }

        if let Some(dir) = engine.config.models_dir.clone() {
            for decl in load_models(&dir)? {
                engine.register_model(decl)?;
            }
        }

        tracing::info!(
            "Engine ready with {} models and {} extension points",
            engine.models.model_names()?.len(),
            engine.extensions.extension_points().len()
        );
        Ok(engine)
    }

    /// Register a model; an extendable model also registers its extension point.
    ///
    /// The model is not left registered when its extension point is rejected.
    pub fn register_model(&self, decl: ModelDecl) -> Result<()> {
        let name = decl.name.clone();
        let point = decl
            .extension_name()
            .map(|name| ExtensionPoint::new(name, decl.qualified_name()));

        self.models.register(decl)?;
        if let Some(point) = point {
            if let Err(err) = self.extensions.register_extension_point(point) {
                self.models.unregister(&name)?;
                return Err(err);
            }
        }
        Ok(())
    }

    /// Register the configured query LOVs against `source`.
    ///
    /// Replaces providers registered under the same names.
    pub fn register_query_lovs(&self, source: Arc<dyn RowSource>) -> Result<()> {
        for lov in &self.config.query_lovs {
            self.lovs.register_query(
                &lov.name,
                &lov.query,
                &lov.value_column,
                &lov.label_pattern,
                lov.depends_on.as_deref(),
                Arc::clone(&source),
            )?;
        }
        Ok(())
    }

    pub fn register<T: Model>(&self) -> Result<()> {
        self.register_model(T::declaration())
    }

    /// Build every model definition, failing on the first configuration error.
    pub fn check(&self) -> Result<usize> {
        Ok(self.models.build_all()?.len())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn labels(&self) -> &LabelResolver {
        &self.labels
    }

    pub fn validations(&self) -> &ValidationRuleMapper {
        &self.validations
    }

    pub fn lovs(&self) -> &LovService {
        &self.lovs
    }

    pub fn models(&self) -> &ModelRegistry {
        &self.models
    }

    pub fn extensions(&self) -> &ExtensionService {
        &self.extensions
    }
}
