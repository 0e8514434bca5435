//! Error types for pipeline execution
//!
//! Entity failures are wrapped with the entity id and stage name so the
//! process boundary can report exactly where an unattended run died.

use thiserror::Error;

use crate::analysis::AnalysisError;
use crate::storage::StorageError;

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors that can occur while running a pipeline
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A stage failed for one entity; the underlying cause is attached
    #[error("stage '{stage}' failed for {kind} '{entity}'")]
    Stage {
        kind: &'static str,
        entity: String,
        stage: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// An entity name has no entry in the configured entity map
    #[error("unknown {kind} '{name}'")]
    UnknownEntity { kind: &'static str, name: String },

    /// A configured implementation key has no registered constructor
    #[error("no {kind} implementation registered for key '{key}'")]
    UnknownImplementation { kind: &'static str, key: String },

    /// A stage name could not be parsed for the selected pipeline
    #[error("invalid stage: {0}")]
    InvalidStage(String),

    /// Missing required input
    #[error("missing required input: {0}")]
    MissingInput(String),

    /// Storage error
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Analysis error
    #[error(transparent)]
    Analysis(#[from] AnalysisError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PipelineError {
    /// Wrap an entity failure with its id and stage name
    pub fn stage<E>(
        kind: &'static str,
        entity: impl Into<String>,
        stage: impl Into<String>,
        source: E,
    ) -> Self
    where
        E: Into<Box<dyn std::error::Error + Send + Sync>>,
    {
        Self::Stage {
            kind,
            entity: entity.into(),
            stage: stage.into(),
            source: source.into(),
        }
    }

    /// The stage name if this is a stage error
    pub fn stage_name(&self) -> Option<&str> {
        match self {
            Self::Stage { stage, .. } => Some(stage),
            _ => None,
        }
    }

    /// The entity id if this is a stage error
    pub fn entity(&self) -> Option<&str> {
        match self {
            Self::Stage { entity, .. } => Some(entity),
            _ => None,
        }
    }
}
