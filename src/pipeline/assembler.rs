//! Product pipeline: gather → analyse → assemble

use tracing::info;

use crate::config::Settings;
use crate::entity::Product;

use super::error::{PipelineError, PipelineResult};

/// Stages of the assemble pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssembleStage {
    Gather,
    Analyse,
    Assemble,
}

impl AssembleStage {
    /// All stages in pipeline order
    pub fn all() -> Vec<Self> {
        vec![Self::Gather, Self::Analyse, Self::Assemble]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Gather => "gather",
            Self::Analyse => "analyse",
            Self::Assemble => "assemble",
        }
    }
}

impl std::fmt::Display for AssembleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for AssembleStage {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gather" => Ok(Self::Gather),
            "analyse" => Ok(Self::Analyse),
            "assemble" => Ok(Self::Assemble),
            _ => Err(PipelineError::InvalidStage(s.to_string())),
        }
    }
}

/// Runs products through the assemble pipeline, entity-major
pub struct Assembler<'a> {
    settings: &'a Settings,
}

impl<'a> Assembler<'a> {
    pub fn new(settings: &'a Settings) -> Self {
        Self { settings }
    }

    /// Run the selected stages for every product, in pipeline order
    pub fn assemble(
        &self,
        products: &mut [Box<dyn Product>],
        force_update: bool,
        stages: &[AssembleStage],
    ) -> PipelineResult<()> {
        for product in products.iter_mut() {
            for stage in stages {
                match stage {
                    AssembleStage::Gather => self.gather(product.as_mut(), force_update)?,
                    AssembleStage::Analyse => self.analyse(product.as_mut())?,
                    AssembleStage::Assemble => self.assembly(product.as_mut())?,
                }
            }
        }
        Ok(())
    }

    /// Gather upstream data: a nested resolve run over the product's sources
    pub fn gather(&self, product: &mut dyn Product, force_update: bool) -> PipelineResult<()> {
        let id = product.id().to_string();
        let sources = self.settings.sources_for(&id);
        info!(entity = %id, stage = "gather", ?sources, "gathering data for product");
        product
            .gather(force_update)
            .map_err(|e| PipelineError::stage("product", &id, "gather", e))
    }

    /// Analyse gathered data into a fresh product instance
    pub fn analyse(&self, product: &mut dyn Product) -> PipelineResult<()> {
        let id = product.id().to_string();
        info!(entity = %id, stage = "analyse", "analysing product");

        product.store_mut().fresh();
        product
            .analyse()
            .map_err(|e| PipelineError::stage("product", &id, "analyse", e))?;
        product
            .cleanup()
            .map_err(|e| PipelineError::stage("product", &id, "analyse", e))?;
        Ok(())
    }

    /// Assemble the current product instance into its output form
    pub fn assembly(&self, product: &mut dyn Product) -> PipelineResult<()> {
        let id = product.id().to_string();
        info!(entity = %id, stage = "assemble", "assembling product");

        product
            .store_mut()
            .resolve_current(false)
            .map_err(|e| PipelineError::stage("product", &id, "assemble", e))?;
        product
            .assemble()
            .map_err(|e| PipelineError::stage("product", &id, "assemble", e))?;
        product
            .cleanup()
            .map_err(|e| PipelineError::stage("product", &id, "assemble", e))?;
        Ok(())
    }
}
