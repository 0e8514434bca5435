//! Shared mock entities for the pipeline integration tests
//!
//! The mocks mirror the built-in entities at minimum size: a datasource
//! that copies a fixture dump and derives coincidence rows, a product that
//! clusters them into a JSON feed, and a target that collects the feed and
//! delivers it to the outgoing directory.

#![allow(dead_code)]

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;

use dataimport::analysis::{Analysis, AnalysisKind, FormatKind, JsonFeed, read_csv_rows};
use dataimport::cluster;
use dataimport::config::Settings;
use dataimport::entity::{Datasource, Product, Target};
use dataimport::pipeline::{PipelineError, PipelineResult, ResolveStage, Resolver};
use dataimport::storage::FileStore;

pub fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Settings wiring the mock entities together under a temp store root
pub fn mock_settings(root: &Path) -> Settings {
    Settings::new()
        .with_store_root(root)
        .with_datasource("mockdatasource", "mock")
        .with_product("mockproduct", "mock")
        .with_target("mocktarget", "mock")
        .with_product_sources("mockproduct", vec!["mockdatasource".to_string()])
        .with_target_products("mocktarget", vec!["mockproduct".to_string()])
        .with_keep_historic("mockdatasource", 3)
        .with_keep_historic("mockproduct", 3)
        .with_keep_historic("mocktarget", 3)
        .with_max_age("mockdatasource", 60)
        .with_outgoing(root.join("outgoing"))
}

/// The most recent instance directory of an entity's scope
pub fn latest_dir(settings: &Settings, id: &str) -> PathBuf {
    let scope = settings.scope_dir(id);
    let latest = fs::read_dir(&scope)
        .unwrap()
        .filter_map(|entry| entry.unwrap().file_name().into_string().ok())
        .max()
        .unwrap();
    scope.join(latest)
}

/// Number of instance directories in an entity's scope
pub fn instance_count(settings: &Settings, id: &str) -> usize {
    let scope = settings.scope_dir(id);
    if !scope.exists() {
        return 0;
    }
    fs::read_dir(&scope).unwrap().count()
}

pub struct MockDatasource {
    id: String,
    store: FileStore,
}

impl MockDatasource {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
        }
    }
}

pub fn mock_datasource_ctor(settings: &Settings, id: &str) -> Box<dyn Datasource> {
    Box::new(MockDatasource::new(settings, id))
}

impl Datasource for MockDatasource {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn fetch(&mut self) -> PipelineResult<()> {
        let dest = self.store.path_for("origin.csv")?;
        fs::copy(fixture("origin.csv"), &dest)?;
        Ok(())
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        let mut rows = read_csv_rows(&self.store.path_for("origin.csv")?)?;
        rows.sort();

        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(self.store.open_output("analysed.csv")?);
        for row in &rows {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn provides_analysis(&self, kind: AnalysisKind) -> bool {
        matches!(kind, AnalysisKind::CoincidentIssns)
    }

    fn analysis(&self, kind: AnalysisKind) -> PipelineResult<Option<Analysis>> {
        match kind {
            AnalysisKind::CoincidentIssns => Ok(Some(Analysis::from_csv(
                &self.id,
                self.store.path_for("analysed.csv")?,
            ))),
            _ => Ok(None),
        }
    }
}

/// A datasource whose fetch always fails, for fail-fast tests
pub struct FailingDatasource {
    id: String,
    store: FileStore,
}

impl FailingDatasource {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
        }
    }
}

impl Datasource for FailingDatasource {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn fetch(&mut self) -> PipelineResult<()> {
        Err(PipelineError::MissingInput("deliberate failure".to_string()))
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        Err(PipelineError::MissingInput("deliberate failure".to_string()))
    }
}

pub struct MockProduct {
    id: String,
    settings: Settings,
    store: FileStore,
}

impl MockProduct {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }
}

pub fn mock_product_ctor(settings: &Settings, id: &str) -> Box<dyn Product> {
    Box::new(MockProduct::new(settings, id))
}

impl Product for MockProduct {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn gather(&mut self, force_update: bool) -> PipelineResult<()> {
        let mut datasources: Vec<Box<dyn Datasource>> = self
            .settings
            .sources_for(&self.id)
            .iter()
            .map(|name| mock_datasource_ctor(&self.settings, name))
            .collect();
        Resolver::new(&self.settings).resolve(&mut datasources, force_update, &ResolveStage::all())
    }

    fn analyse(&mut self) -> PipelineResult<()> {
        let mut analyses = Vec::new();
        for name in self.settings.sources_for(&self.id) {
            let mut datasource = MockDatasource::new(&self.settings, name);
            datasource.store_mut().resolve_current(false)?;
            if datasource.provides_analysis(AnalysisKind::CoincidentIssns)
                && let Some(analysis) = datasource.analysis(AnalysisKind::CoincidentIssns)?
            {
                analyses.push(analysis);
            }
        }

        let clusters = cluster::issn_clusters(&analyses)?;
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(self.store.open_output("clusters.csv")?);
        for row in &clusters {
            writer.write_record(row)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn assemble(&mut self) -> PipelineResult<()> {
        let clusters = read_csv_rows(&self.store.path_for("clusters.csv")?)?;
        let mut out = self.store.open_output("mapping.json")?;
        for cluster in &clusters {
            serde_json::to_writer(&mut out, &json!({ "issns": cluster }))?;
            writeln!(out)?;
        }
        out.flush().map_err(PipelineError::Io)?;
        Ok(())
    }

    fn provides_format(&self, kind: FormatKind) -> bool {
        matches!(kind, FormatKind::JsonFeed)
    }

    fn format(&self, kind: FormatKind) -> PipelineResult<Option<JsonFeed>> {
        match kind {
            FormatKind::JsonFeed => Ok(Some(JsonFeed::new(self.store.path_for("mapping.json")?))),
        }
    }
}

pub struct MockTarget {
    id: String,
    settings: Settings,
    store: FileStore,
}

impl MockTarget {
    pub fn new(settings: &Settings, id: &str) -> Self {
        Self {
            id: id.to_string(),
            store: FileStore::new(settings, id),
            settings: settings.clone(),
        }
    }
}

pub fn mock_target_ctor(settings: &Settings, id: &str) -> Box<dyn Target> {
    Box::new(MockTarget::new(settings, id))
}

impl Target for MockTarget {
    fn id(&self) -> &str {
        &self.id
    }

    fn store(&self) -> &FileStore {
        &self.store
    }

    fn store_mut(&mut self) -> &mut FileStore {
        &mut self.store
    }

    fn prepare(&mut self) -> PipelineResult<()> {
        let mut out = self.store.open_output("load.json")?;
        for name in self.settings.products_for(&self.id) {
            let mut product = MockProduct::new(&self.settings, name);
            product.store_mut().resolve_current(false)?;
            if product.provides_format(FormatKind::JsonFeed)
                && let Some(feed) = product.format(FormatKind::JsonFeed)?
            {
                for record in feed.entries()? {
                    serde_json::to_writer(&mut out, &record)?;
                    writeln!(out)?;
                }
            }
        }
        out.flush().map_err(PipelineError::Io)?;
        Ok(())
    }

    fn load(&mut self) -> PipelineResult<()> {
        let outgoing = self.settings.outgoing.as_ref().ok_or_else(|| {
            PipelineError::MissingInput(format!("outgoing directory for target '{}'", self.id))
        })?;
        let source = self.store.path_for("load.json")?;
        fs::create_dir_all(outgoing)?;
        fs::copy(&source, outgoing.join(format!("{}.json", self.id)))?;
        Ok(())
    }
}
