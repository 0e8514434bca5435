//! Datasource pipeline: fetch → analyse

use chrono::{Duration, Utc};
use tracing::info;

use crate::config::Settings;
use crate::entity::Datasource;

use super::error::{PipelineError, PipelineResult};

/// Stages of the resolve pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveStage {
    Fetch,
    Analyse,
}

impl ResolveStage {
    /// All stages in pipeline order
    pub fn all() -> Vec<Self> {
        vec![Self::Fetch, Self::Analyse]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Analyse => "analyse",
        }
    }
}

impl std::fmt::Display for ResolveStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ResolveStage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fetch" => Ok(Self::Fetch),
            "analyse" => Ok(Self::Analyse),
            _ => Err(PipelineError::InvalidStage(s.to_string())),
        }
    }
}

/// Runs datasources through the resolve pipeline, entity-major: freshness
/// decisions are per-datasource, so each one completes its stages before
/// the next starts.
pub struct Resolver<'a> {
    settings: &'a Settings,
}

impl<'a> Resolver<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Run the selected stages for every datasource, in pipeline order
    pub fn resolve(
        &self,
        datasources: &mut [Box<dyn Datasource>],
        force_update: bool,
        stages: &[ResolveStage],
    ) -> PipelineResult<()> {
        for datasource in datasources.iter_mut() {
            for stage in stages {
                match stage {
                    ResolveStage::Fetch => self.fetch(datasource.as_mut(), force_update)?,
                    ResolveStage::Analyse => self.analyse(datasource.as_mut())?,
                }
            }
        }
        Ok(())
    }

    /// Fetch a datasource into a fresh instance when an update is due
    ///
    /// An update is due when `force_update` is set, when the datasource has
    /// no current instance, or when the current instance is older than the
    /// configured max age. Otherwise the stage is a logged no-op.
    pub fn fetch(&self, datasource: &mut dyn Datasource, force_update: bool) -> PipelineResult<()> {
        let id = datasource.id().to_string();

        if !force_update && !self.requires_update(datasource)? {
            info!(entity = %id, stage = "fetch", "datasource is fresh, skipping fetch");
            return Ok(());
        }

        info!(entity = %id, stage = "fetch", "fetching datasource");
        datasource.store_mut().fresh();
        datasource
            .fetch()
            .map_err(|e| PipelineError::stage("datasource", &id, "fetch", e))?;
        datasource
            .cleanup()
            .map_err(|e| PipelineError::stage("datasource", &id, "fetch", e))?;
        Ok(())
    }

    /// Analyse a datasource's current instance
    ///
    /// The current instance must already exist; analysing an empty scope is
    /// a loud failure rather than a silent run over nothing.
    pub fn analyse(&self, datasource: &mut dyn Datasource) -> PipelineResult<()> {
        let id = datasource.id().to_string();
        info!(entity = %id, stage = "analyse", "analysing datasource");

        datasource
            .store_mut()
            .resolve_current(false)
            .map_err(|e| PipelineError::stage("datasource", &id, "analyse", e))?;
        datasource
            .analyse()
            .map_err(|e| PipelineError::stage("datasource", &id, "analyse", e))?;
        datasource
            .cleanup()
            .map_err(|e| PipelineError::stage("datasource", &id, "analyse", e))?;
        Ok(())
    }

    fn requires_update(&self, datasource: &dyn Datasource) -> PipelineResult<bool> {
        let max_age = self.settings.max_age(datasource.id());
        match datasource.store().current_created()? {
            Some(created) => Ok(created + Duration::seconds(max_age as i64) < Utc::now()),
            None => Ok(true),
        }
    }
}
