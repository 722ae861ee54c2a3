//! Persistence for generated artifacts and raw signals.
//!
//! `Repository` is the backend seam. `Storage` is what the pipeline holds: a
//! configured backend with a per-call timeout, or `Degraded` when nothing is
//! configured (reads come back empty, writes are skipped with a log line).

pub mod file;
pub mod memory;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

use crate::config::{StorageBackend, StorageConfig};
use crate::error::{PipelineError, PipelineResult};
use crate::model::{ArtifactId, ContentArtifact, StoredSignal};

pub use file::JsonFileRepository;
pub use memory::MemoryRepository;

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("artifacts_stored_total", "Artifacts inserted into storage.");
        describe_counter!("artifacts_published_total", "Artifacts marked as published.");
    });
}

#[async_trait]
pub trait Repository: Send + Sync {
    /// Store a new artifact and return its assigned id.
    async fn insert(&self, artifact: ContentArtifact) -> PipelineResult<ArtifactId>;

    /// Up to `limit` unpublished artifacts, most recent first.
    async fn query_unpublished(&self, limit: usize) -> PipelineResult<Vec<ContentArtifact>>;

    /// Flip one artifact to published for `date` and return it.
    /// Fails with `AlreadyPublished` when `date` already has a publication.
    async fn mark_published(&self, id: ArtifactId, date: NaiveDate) -> PipelineResult<ContentArtifact>;

    async fn query_published_for_date(&self, date: NaiveDate) -> PipelineResult<Option<ContentArtifact>>;

    /// Append raw signals; returns how many were stored.
    async fn store_signals(&self, signals: Vec<StoredSignal>) -> PipelineResult<usize>;

    fn name(&self) -> &str;
}

/// Backend-independent table state shared by the built-in repositories.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct RepoState {
    next_id: u64,
    artifacts: Vec<ContentArtifact>,
    #[serde(default)]
    signals: Vec<StoredSignal>,
}

impl RepoState {
    fn insert(&mut self, mut artifact: ContentArtifact) -> ArtifactId {
        self.next_id += 1;
        let id = ArtifactId(self.next_id);
        artifact.id = Some(id);
        self.artifacts.push(artifact);
        id
    }

    fn query_unpublished(&self, limit: usize) -> Vec<ContentArtifact> {
        let mut out: Vec<&ContentArtifact> = self.artifacts.iter().filter(|a| !a.is_published).collect();
        // Newest first; later inserts win ties on creation time.
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out.into_iter().take(limit).cloned().collect()
    }

    fn mark_published(&mut self, id: ArtifactId, date: NaiveDate) -> PipelineResult<ContentArtifact> {
        if self.published_for_date(date).is_some() {
            return Err(PipelineError::AlreadyPublished { date });
        }
        let artifact = self
            .artifacts
            .iter_mut()
            .find(|a| a.id == Some(id))
            .ok_or(PipelineError::NotFound(id))?;
        artifact.publish(date)?;
        Ok(artifact.clone())
    }

    fn published_for_date(&self, date: NaiveDate) -> Option<&ContentArtifact> {
        self.artifacts
            .iter()
            .find(|a| a.is_published && a.published_date == Some(date))
    }

    fn store_signals(&mut self, signals: Vec<StoredSignal>) -> usize {
        let n = signals.len();
        self.signals.extend(signals);
        n
    }

    pub(crate) fn artifact_count(&self) -> usize {
        self.artifacts.len()
    }

    pub(crate) fn signal_count(&self) -> usize {
        self.signals.len()
    }
}

async fn bounded<T, F>(timeout: Duration, fut: F) -> PipelineResult<T>
where
    F: std::future::Future<Output = PipelineResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .unwrap_or(Err(PipelineError::Timeout {
            operation: "storage",
            secs: timeout.as_secs(),
        }))
}

#[derive(Clone)]
pub enum Storage {
    Configured {
        repo: Arc<dyn Repository>,
        timeout: Duration,
    },
    Degraded,
}

impl Storage {
    pub fn new(repo: Arc<dyn Repository>, timeout: Duration) -> Self {
        Storage::Configured { repo, timeout }
    }

    /// Backend selected by configuration.
    pub fn from_config(cfg: &StorageConfig) -> Self {
        match cfg.backend {
            StorageBackend::Memory => Self::new(Arc::new(MemoryRepository::new()), cfg.timeout()),
            StorageBackend::File => {
                Self::new(Arc::new(JsonFileRepository::new(&cfg.path)), cfg.timeout())
            }
            StorageBackend::None => {
                tracing::info!(target: "storage", "no storage configured; running degraded");
                Storage::Degraded
            }
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Storage::Configured { repo, .. } => repo.name(),
            Storage::Degraded => "degraded",
        }
    }

    /// `None` when degraded (nothing written).
    pub async fn insert(&self, artifact: ContentArtifact) -> PipelineResult<Option<ArtifactId>> {
        ensure_metrics_described();
        match self {
            Storage::Configured { repo, timeout } => {
                let title = artifact.title().to_string();
                let id = bounded(*timeout, repo.insert(artifact)).await?;
                counter!("artifacts_stored_total").increment(1);
                tracing::info!(target: "storage", %id, %title, "artifact stored");
                Ok(Some(id))
            }
            Storage::Degraded => {
                tracing::info!(target: "storage", title = artifact.title(), "storage degraded; artifact not stored");
                Ok(None)
            }
        }
    }

    /// Empty when degraded.
    pub async fn query_unpublished(&self, limit: usize) -> PipelineResult<Vec<ContentArtifact>> {
        match self {
            Storage::Configured { repo, timeout } => {
                bounded(*timeout, repo.query_unpublished(limit)).await
            }
            Storage::Degraded => Ok(Vec::new()),
        }
    }

    pub async fn mark_published(&self, id: ArtifactId, date: NaiveDate) -> PipelineResult<ContentArtifact> {
        ensure_metrics_described();
        match self {
            Storage::Configured { repo, timeout } => {
                let artifact = bounded(*timeout, repo.mark_published(id, date)).await?;
                counter!("artifacts_published_total").increment(1);
                Ok(artifact)
            }
            Storage::Degraded => Err(PipelineError::PersistenceUnavailable),
        }
    }

    /// Degraded storage has no answer: `PersistenceUnavailable`.
    pub async fn published_for_date(&self, date: NaiveDate) -> PipelineResult<Option<ContentArtifact>> {
        match self {
            Storage::Configured { repo, timeout } => {
                bounded(*timeout, repo.query_published_for_date(date)).await
            }
            Storage::Degraded => Err(PipelineError::PersistenceUnavailable),
        }
    }

    pub async fn store_signals(&self, signals: Vec<StoredSignal>) -> PipelineResult<usize> {
        match self {
            Storage::Configured { repo, timeout } => {
                bounded(*timeout, repo.store_signals(signals)).await
            }
            Storage::Degraded => {
                tracing::info!(target: "storage", count = signals.len(), "storage degraded; raw signals not stored");
                Ok(0)
            }
        }
    }
}
