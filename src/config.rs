//! Pipeline settings
//!
//! All entity wiring is configuration-driven: entity names map to registered
//! implementation keys, storage scopes, retention counts and freshness
//! windows. Settings load from a TOML file or are built programmatically.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error loading settings from disk
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read settings file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Main pipeline settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base directory for all storage scopes
    pub store_root: PathBuf,
    /// Explicit per-entity scope directories; entities absent from the map
    /// live under `store_root/<id>`
    pub store_scopes: HashMap<String, PathBuf>,
    /// Per-entity retention counts
    pub keep_historic: HashMap<String, usize>,
    /// Retention count for entities without an explicit entry
    pub default_keep_historic: usize,
    /// Datasource name to implementation key
    pub datasources: HashMap<String, String>,
    /// Product name to implementation key
    pub products: HashMap<String, String>,
    /// Target name to implementation key
    pub targets: HashMap<String, String>,
    /// Product name to its upstream datasource names
    pub product_sources: HashMap<String, Vec<String>>,
    /// Target name to the products it serves
    pub target_products: HashMap<String, Vec<String>>,
    /// Per-datasource fetch freshness window in seconds (missing = always stale)
    pub resolver_max_age: HashMap<String, u64>,
    /// Source preference for canonical value selection
    pub preference_order: Vec<String>,
    /// Origin file for the journals datasource
    pub journals_dump: Option<PathBuf>,
    /// Origin file for the curated datasource
    pub curated_file: Option<PathBuf>,
    /// Delivery directory for the search target
    pub outgoing: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            store_root: PathBuf::from("databases"),
            store_scopes: HashMap::new(),
            keep_historic: HashMap::new(),
            default_keep_historic: 1,
            datasources: HashMap::new(),
            products: HashMap::new(),
            targets: HashMap::new(),
            product_sources: HashMap::new(),
            target_products: HashMap::new(),
            resolver_max_age: HashMap::new(),
            preference_order: Vec::new(),
            journals_dump: None,
            curated_file: None,
            outgoing: None,
        }
    }
}

impl Settings {
    /// Create empty settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Load settings from a TOML file
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let content = std::fs::read_to_string(path).map_err(|e| SettingsError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        toml::from_str(&content).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Set the base storage directory
    pub fn with_store_root(mut self, path: impl Into<PathBuf>) -> Self {
        self.store_root = path.into();
        self
    }

    /// Set an explicit scope directory for an entity
    pub fn with_scope(mut self, id: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.store_scopes.insert(id.into(), path.into());
        self
    }

    /// Set the retention count for an entity
    pub fn with_keep_historic(mut self, id: impl Into<String>, keep: usize) -> Self {
        self.keep_historic.insert(id.into(), keep);
        self
    }

    /// Register a datasource name against an implementation key
    pub fn with_datasource(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.datasources.insert(name.into(), key.into());
        self
    }

    /// Register a product name against an implementation key
    pub fn with_product(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.products.insert(name.into(), key.into());
        self
    }

    /// Register a target name against an implementation key
    pub fn with_target(mut self, name: impl Into<String>, key: impl Into<String>) -> Self {
        self.targets.insert(name.into(), key.into());
        self
    }

    /// Declare a product's upstream datasources
    pub fn with_product_sources(
        mut self,
        product: impl Into<String>,
        sources: Vec<String>,
    ) -> Self {
        self.product_sources.insert(product.into(), sources);
        self
    }

    /// Declare the products a target serves
    pub fn with_target_products(
        mut self,
        target: impl Into<String>,
        products: Vec<String>,
    ) -> Self {
        self.target_products.insert(target.into(), products);
        self
    }

    /// Set a datasource's fetch freshness window in seconds
    pub fn with_max_age(mut self, id: impl Into<String>, seconds: u64) -> Self {
        self.resolver_max_age.insert(id.into(), seconds);
        self
    }

    /// Set the source preference order
    pub fn with_preference_order(mut self, order: Vec<String>) -> Self {
        self.preference_order = order;
        self
    }

    /// Set the journals dump path
    pub fn with_journals_dump(mut self, path: impl Into<PathBuf>) -> Self {
        self.journals_dump = Some(path.into());
        self
    }

    /// Set the curated file path
    pub fn with_curated_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.curated_file = Some(path.into());
        self
    }

    /// Set the outgoing delivery directory
    pub fn with_outgoing(mut self, path: impl Into<PathBuf>) -> Self {
        self.outgoing = Some(path.into());
        self
    }

    /// Storage scope directory for an entity
    pub fn scope_dir(&self, id: &str) -> PathBuf {
        self.store_scopes
            .get(id)
            .cloned()
            .unwrap_or_else(|| self.store_root.join(id))
    }

    /// Retention count for an entity
    pub fn keep_historic_for(&self, id: &str) -> usize {
        self.keep_historic
            .get(id)
            .copied()
            .unwrap_or(self.default_keep_historic)
    }

    /// Fetch freshness window for a datasource, in seconds
    pub fn max_age(&self, id: &str) -> u64 {
        self.resolver_max_age.get(id).copied().unwrap_or(0)
    }

    /// Upstream datasource names for a product
    pub fn sources_for(&self, product: &str) -> &[String] {
        self.product_sources
            .get(product)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Product names served by a target
    pub fn products_for(&self, target: &str) -> &[String] {
        self.target_products
            .get(target)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Validate cross-references between entity maps
    pub fn validate(&self) -> Result<(), String> {
        for (product, sources) in &self.product_sources {
            for source in sources {
                if !self.datasources.contains_key(source) {
                    return Err(format!(
                        "product '{product}' references unconfigured datasource '{source}'"
                    ));
                }
            }
        }
        for (target, products) in &self.target_products {
            for product in products {
                if !self.products.contains_key(product) {
                    return Err(format!(
                        "target '{target}' references unconfigured product '{product}'"
                    ));
                }
            }
        }
        Ok(())
    }
}
