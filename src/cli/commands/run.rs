//! The `run` command: drive a pipeline over named entities

use std::path::PathBuf;

use crate::config::Settings;
use crate::entity::Registry;
use crate::pipeline::{
    AssembleStage, Assembler, LoadStage, Loader, PipelineError, PipelineResult, ResolveStage,
    Resolver, stage_range,
};

/// Pipeline selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Mode {
    /// Fetch and analyse datasources
    Resolve,
    /// Gather, analyse and assemble products
    Assemble,
    /// Assemble, prepare and load targets
    Load,
}

/// Arguments for the `run` command
pub struct RunArgs {
    /// Pipeline to run
    pub mode: Mode,
    /// Entity names; `_all` expands to every configured entity of the
    /// mode's type
    pub entities: Vec<String>,
    /// Stage to run up to (or exactly, with `only`)
    pub stage: Option<String>,
    /// Run only the named stage instead of the pipeline prefix
    pub only: bool,
    /// Force datasource updates regardless of max-age freshness
    pub force_update: bool,
    /// Settings file path
    pub config: PathBuf,
}

/// Handle the `run` command
pub fn handle_run(args: &RunArgs) -> PipelineResult<()> {
    let settings =
        Settings::load(&args.config).map_err(|e| PipelineError::Config(e.to_string()))?;
    settings.validate().map_err(PipelineError::Config)?;

    let registry = Registry::with_defaults();
    run(&settings, &registry, args)
}

/// Run a pipeline against already-loaded settings
pub fn run(settings: &Settings, registry: &Registry, args: &RunArgs) -> PipelineResult<()> {
    let wants_all = args.entities.first().is_some_and(|name| name == "_all");

    match args.mode {
        Mode::Resolve => {
            let stage = args
                .stage
                .as_deref()
                .map(str::parse::<ResolveStage>)
                .transpose()?;
            let stages = stage_range(&ResolveStage::all(), stage, args.only);

            let mut datasources = if wants_all {
                registry.all_datasources(settings)?
            } else {
                args.entities
                    .iter()
                    .map(|name| registry.datasource(settings, name))
                    .collect::<PipelineResult<Vec<_>>>()?
            };
            Resolver::new(settings).resolve(&mut datasources, args.force_update, &stages)
        }
        Mode::Assemble => {
            let stage = args
                .stage
                .as_deref()
                .map(str::parse::<AssembleStage>)
                .transpose()?;
            let stages = stage_range(&AssembleStage::all(), stage, args.only);

            let mut products = if wants_all {
                registry.all_products(settings)?
            } else {
                args.entities
                    .iter()
                    .map(|name| registry.product(settings, name))
                    .collect::<PipelineResult<Vec<_>>>()?
            };
            Assembler::new(settings).assemble(&mut products, args.force_update, &stages)
        }
        Mode::Load => {
            let stage = args
                .stage
                .as_deref()
                .map(str::parse::<LoadStage>)
                .transpose()?;
            let stages = stage_range(&LoadStage::all(), stage, args.only);

            let mut targets = if wants_all {
                registry.all_targets(settings)?
            } else {
                args.entities
                    .iter()
                    .map(|name| registry.target(settings, name))
                    .collect::<PipelineResult<Vec<_>>>()?
            };
            Loader::new(settings, registry).load(&mut targets, args.force_update, &stages)
        }
    }
}
