//! Error taxonomy for the pipeline.
//!
//! Source, generation and persistence failures are contained to the item they
//! affect; the pipeline logs them and keeps going. Only errors that stop the
//! whole run reach the caller of `TrendPipeline::run_daily`.

use chrono::NaiveDate;
use thiserror::Error;

use crate::model::ArtifactId;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// One signal source failed; it is excluded from the run.
    #[error("signal source `{source_name}` unavailable: {reason}")]
    SourceUnavailable { source_name: String, reason: String },

    /// Generated content for one trend was malformed or missing.
    #[error("generation failed for `{trend}`: {reason}")]
    GenerationFailure { trend: String, reason: String },

    /// No storage backend is configured.
    #[error("persistence unavailable")]
    PersistenceUnavailable,

    /// The storage backend rejected or failed an operation.
    #[error("persistence error: {0}")]
    Persistence(String),

    #[error("artifact not found: {0}")]
    NotFound(ArtifactId),

    /// A second publication for the same day was attempted.
    #[error("an artifact is already published for {date}")]
    AlreadyPublished { date: NaiveDate },

    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: &'static str, secs: u64 },

    #[error("configuration error: {0}")]
    Config(String),
}

pub type PipelineResult<T> = Result<T, PipelineError>;

impl From<serde_json::Error> for PipelineError {
    fn from(err: serde_json::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Persistence(err.to_string())
    }
}
