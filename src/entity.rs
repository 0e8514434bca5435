//! Entity contracts and the implementation registry
//!
//! Datasources, products and targets are stateless, configuration-driven
//! units re-instantiated per pipeline invocation; only their on-disk
//! instances persist between runs. Implementations are selected through a
//! registration table mapping string keys to constructor functions, so the
//! configured entity maps stay data while construction stays compile-time
//! checked.

use std::collections::HashMap;
use std::fmt;

use crate::analysis::{Analysis, AnalysisKind, FormatKind, JsonFeed};
use crate::config::Settings;
use crate::pipeline::{PipelineError, PipelineResult};
use crate::storage::{FileStore, StorageError};

/// A source of raw upstream data
///
/// `fetch` writes into the fresh instance selected by the runner; `analyse`
/// derives artifacts inside the current instance. Downstream products
/// discover derived data through the `provides_analysis`/`analysis`
/// capability query.
pub trait Datasource {
    fn id(&self) -> &str;

    fn store(&self) -> &FileStore;

    fn store_mut(&mut self) -> &mut FileStore;

    fn fetch(&mut self) -> PipelineResult<()>;

    fn analyse(&mut self) -> PipelineResult<()>;

    /// Whether this datasource can supply the given analysis kind
    fn provides_analysis(&self, _kind: AnalysisKind) -> bool {
        false
    }

    /// Retrieve an analysis result, `None` when the kind is unsupported
    fn analysis(&self, _kind: AnalysisKind) -> PipelineResult<Option<Analysis>> {
        Ok(None)
    }

    /// Run retention cleanup on this entity's storage scope
    fn cleanup(&self) -> Result<(), StorageError> {
        self.store().cleanup()
    }
}

/// An intermediary dataset assembled from one or more datasources
pub trait Product {
    fn id(&self) -> &str;

    fn store(&self) -> &FileStore;

    fn store_mut(&mut self) -> &mut FileStore;

    /// Bring this product's upstream datasources up to date (a nested
    /// resolve run over its configured sources)
    fn gather(&mut self, force_update: bool) -> PipelineResult<()>;

    fn analyse(&mut self) -> PipelineResult<()>;

    fn assemble(&mut self) -> PipelineResult<()>;

    /// Whether this product can supply the given feed format
    fn provides_format(&self, _kind: FormatKind) -> bool {
        false
    }

    /// Retrieve a feed over the assembled output, `None` when unsupported
    fn format(&self, _kind: FormatKind) -> PipelineResult<Option<JsonFeed>> {
        Ok(None)
    }

    /// Run retention cleanup on this entity's storage scope
    fn cleanup(&self) -> Result<(), StorageError> {
        self.store().cleanup()
    }
}

/// A downstream system fed from assembled products
pub trait Target {
    fn id(&self) -> &str;

    fn store(&self) -> &FileStore;

    fn store_mut(&mut self) -> &mut FileStore;

    fn prepare(&mut self) -> PipelineResult<()>;

    fn load(&mut self) -> PipelineResult<()>;

    /// Run retention cleanup on this entity's storage scope
    fn cleanup(&self) -> Result<(), StorageError> {
        self.store().cleanup()
    }
}

impl fmt::Debug for dyn Datasource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Datasource").field("id", &self.id()).finish()
    }
}

/// Constructor for a registered datasource implementation
pub type DatasourceCtor = fn(&Settings, &str) -> Box<dyn Datasource>;
/// Constructor for a registered product implementation
pub type ProductCtor = fn(&Settings, &str) -> Box<dyn Product>;
/// Constructor for a registered target implementation
pub type TargetCtor = fn(&Settings, &str) -> Box<dyn Target>;

/// Registration table from implementation keys to constructors
pub struct Registry {
    datasources: HashMap<String, DatasourceCtor>,
    products: HashMap<String, ProductCtor>,
    targets: HashMap<String, TargetCtor>,
}

impl Registry {
    /// An empty registry
    pub fn new() -> Self {
        Self {
            datasources: HashMap::new(),
            products: HashMap::new(),
            targets: HashMap::new(),
        }
    }

    /// A registry holding every built-in implementation
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_datasource("journals", crate::datasources::journals::construct);
        registry.register_datasource("curated", crate::datasources::curated::construct);
        registry.register_product("jac", crate::products::jac::construct);
        registry.register_target("search", crate::targets::search::construct);
        registry
    }

    pub fn register_datasource(&mut self, key: impl Into<String>, ctor: DatasourceCtor) {
        self.datasources.insert(key.into(), ctor);
    }

    pub fn register_product(&mut self, key: impl Into<String>, ctor: ProductCtor) {
        self.products.insert(key.into(), ctor);
    }

    pub fn register_target(&mut self, key: impl Into<String>, ctor: TargetCtor) {
        self.targets.insert(key.into(), ctor);
    }

    /// Construct the datasource configured under `name`
    pub fn datasource(
        &self,
        settings: &Settings,
        name: &str,
    ) -> PipelineResult<Box<dyn Datasource>> {
        let key = settings
            .datasources
            .get(name)
            .ok_or_else(|| PipelineError::UnknownEntity {
                kind: "datasource",
                name: name.to_string(),
            })?;
        let ctor =
            self.datasources
                .get(key)
                .ok_or_else(|| PipelineError::UnknownImplementation {
                    kind: "datasource",
                    key: key.clone(),
                })?;
        Ok(ctor(settings, name))
    }

    /// Construct the product configured under `name`
    pub fn product(&self, settings: &Settings, name: &str) -> PipelineResult<Box<dyn Product>> {
        let key = settings
            .products
            .get(name)
            .ok_or_else(|| PipelineError::UnknownEntity {
                kind: "product",
                name: name.to_string(),
            })?;
        let ctor = self
            .products
            .get(key)
            .ok_or_else(|| PipelineError::UnknownImplementation {
                kind: "product",
                key: key.clone(),
            })?;
        Ok(ctor(settings, name))
    }

    /// Construct the target configured under `name`
    pub fn target(&self, settings: &Settings, name: &str) -> PipelineResult<Box<dyn Target>> {
        let key = settings
            .targets
            .get(name)
            .ok_or_else(|| PipelineError::UnknownEntity {
                kind: "target",
                name: name.to_string(),
            })?;
        let ctor = self
            .targets
            .get(key)
            .ok_or_else(|| PipelineError::UnknownImplementation {
                kind: "target",
                key: key.clone(),
            })?;
        Ok(ctor(settings, name))
    }

    /// Construct every configured datasource, in name order
    pub fn all_datasources(&self, settings: &Settings) -> PipelineResult<Vec<Box<dyn Datasource>>> {
        let mut names: Vec<&String> = settings.datasources.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| self.datasource(settings, name))
            .collect()
    }

    /// Construct every configured product, in name order
    pub fn all_products(&self, settings: &Settings) -> PipelineResult<Vec<Box<dyn Product>>> {
        let mut names: Vec<&String> = settings.products.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| self.product(settings, name))
            .collect()
    }

    /// Construct every configured target, in name order
    pub fn all_targets(&self, settings: &Settings) -> PipelineResult<Vec<Box<dyn Target>>> {
        let mut names: Vec<&String> = settings.targets.keys().collect();
        names.sort();
        names
            .into_iter()
            .map(|name| self.target(settings, name))
            .collect()
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
