// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod aggregate;
pub mod config;
pub mod error;
pub mod generate;
pub mod ingest;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod repo;
pub mod select;
pub mod strength;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregatedTrend, TrendAggregator};
pub use crate::config::PipelineConfig;
pub use crate::error::{PipelineError, PipelineResult};
pub use crate::model::{ArtifactId, Category, ContentArtifact, IdeaContent, RevenuePotential};
pub use crate::pipeline::{RunReport, TrendPipeline};
pub use crate::repo::{Repository, Storage};
pub use crate::select::Selection;
