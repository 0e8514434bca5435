//! Batch import pipeline for COVID-19-era open datasets
//!
//! Scrapes and downloads land as datasource dumps, get normalised into an
//! intermediary schema, and are loaded into downstream search and
//! repository targets. The crate provides:
//! - Versioned, timestamped per-entity storage with historic-retention
//!   cleanup
//! - Staged pipeline runners (resolve, assemble, load)
//! - ISSN coincidence clustering and preference resolution over competing
//!   source values
//! - Built-in datasource, product and target implementations, selected
//!   through a configuration-driven registry

pub mod analysis;
pub mod cli;
pub mod cluster;
pub mod config;
pub mod datasources;
pub mod entity;
pub mod pipeline;
pub mod products;
pub mod storage;
pub mod targets;

// Re-export commonly used types
pub use analysis::{Analysis, AnalysisError, AnalysisKind, FormatKind, JsonFeed};
pub use config::Settings;
pub use entity::{Datasource, Product, Registry, Target};
pub use pipeline::{
    AssembleStage, Assembler, LoadStage, Loader, PipelineError, PipelineResult, ResolveStage,
    Resolver,
};
pub use storage::{FileStore, StorageError};
