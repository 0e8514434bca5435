//! Target pipeline: assemble → prepare → load
//!
//! Iteration is stage-major: every target finishes a stage before the next
//! stage begins, so the assembled product outputs feeding a shared
//! downstream load land close together in time.

use tracing::info;

use crate::config::Settings;
use crate::entity::{Registry, Target};

use super::assembler::{AssembleStage, Assembler};
use super::error::{PipelineError, PipelineResult};

/// Stages of the load pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    Assemble,
    Prepare,
    Load,
}

impl LoadStage {
    /// All stages in pipeline order
    pub fn all() -> Vec<Self> {
        vec![Self::Assemble, Self::Prepare, Self::Load]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Assemble => "assemble",
            Self::Prepare => "prepare",
            Self::Load => "load",
        }
    }
}

impl std::fmt::Display for LoadStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for LoadStage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "assemble" => Ok(Self::Assemble),
            "prepare" => Ok(Self::Prepare),
            "load" => Ok(Self::Load),
            _ => Err(PipelineError::InvalidStage(s.to_string())),
        }
    }
}

/// Runs targets through the load pipeline, stage-major
pub struct Loader<'a> {
    settings: &'a Settings,
    registry: &'a Registry,
}

impl<'a> Loader<'a> {
    pub fn new(settings: &'a Settings, registry: &'a Registry) -> Self {
        Self { settings, registry }
    }

    /// Run the selected stages, each across every target, in pipeline order
    pub fn load(
        &self,
        targets: &mut [Box<dyn Target>],
        force_update: bool,
        stages: &[LoadStage],
    ) -> PipelineResult<()> {
        for stage in stages {
            for target in targets.iter_mut() {
                match stage {
                    LoadStage::Assemble => self.assemble(target.as_mut(), force_update)?,
                    LoadStage::Prepare => self.prepare(target.as_mut())?,
                    LoadStage::Load => self.loads(target.as_mut())?,
                }
            }
        }
        Ok(())
    }

    /// Assemble the products a target serves: a nested assemble run
    pub fn assemble(&self, target: &mut dyn Target, force_update: bool) -> PipelineResult<()> {
        let id = target.id().to_string();
        let product_names = self.settings.products_for(&id);
        info!(entity = %id, stage = "assemble", products = ?product_names, "assembling products for target");

        let mut products = Vec::with_capacity(product_names.len());
        for name in product_names {
            products.push(self.registry.product(self.settings, name)?);
        }
        Assembler::new(self.settings).assemble(&mut products, force_update, &AssembleStage::all())
    }

    /// Prepare the target's payload into a fresh target instance
    pub fn prepare(&self, target: &mut dyn Target) -> PipelineResult<()> {
        let id = target.id().to_string();
        info!(entity = %id, stage = "prepare", "preparing target");

        target.store_mut().fresh();
        target
            .prepare()
            .map_err(|e| PipelineError::stage("target", &id, "prepare", e))?;
        target
            .cleanup()
            .map_err(|e| PipelineError::stage("target", &id, "prepare", e))?;
        Ok(())
    }

    /// Load the current target instance into the downstream system
    pub fn loads(&self, target: &mut dyn Target) -> PipelineResult<()> {
        let id = target.id().to_string();
        info!(entity = %id, stage = "load", "loading target");

        target
            .store_mut()
            .resolve_current(false)
            .map_err(|e| PipelineError::stage("target", &id, "load", e))?;
        target
            .load()
            .map_err(|e| PipelineError::stage("target", &id, "load", e))?;
        target
            .cleanup()
            .map_err(|e| PipelineError::stage("target", &id, "load", e))?;
        Ok(())
    }
}
