//! Staged pipeline runners
//!
//! Three runners drive entities through fixed stage sequences:
//!
//! - [`Resolver`]: `fetch → analyse` over datasources, entity-major
//! - [`Assembler`]: `gather → analyse → assemble` over products, entity-major
//! - [`Loader`]: `assemble → prepare → load` over targets, stage-major
//!
//! Entity-major runs every stage for one entity before the next entity;
//! stage-major runs one stage for every entity before the next stage, so
//! the outputs feeding a shared downstream load land close together in
//! time. The first error aborts the whole run.

pub mod error;

mod assembler;
mod loader;
mod resolver;

pub use assembler::{AssembleStage, Assembler};
pub use error::{PipelineError, PipelineResult};
pub use loader::{LoadStage, Loader};
pub use resolver::{ResolveStage, Resolver};

/// Select the stages to run: the contiguous prefix of `pipeline` up to and
/// including `stage` (default), exactly `stage` with `only`, or the full
/// pipeline when no stage is named.
pub fn stage_range<S: Copy + PartialEq>(pipeline: &[S], stage: Option<S>, only: bool) -> Vec<S> {
    match stage {
        None => pipeline.to_vec(),
        Some(stage) if only => vec![stage],
        Some(stage) => pipeline
            .iter()
            .position(|s| *s == stage)
            .map(|end| pipeline[..=end].to_vec())
            .unwrap_or_else(|| pipeline.to_vec()),
    }
}
