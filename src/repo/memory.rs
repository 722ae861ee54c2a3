use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{RepoState, Repository};
use crate::error::PipelineResult;
use crate::model::{ArtifactId, ContentArtifact, StoredSignal};

/// In-process repository. Contents live as long as the value.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    state: Mutex<RepoState>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn artifact_count(&self) -> usize {
        self.state.lock().await.artifact_count()
    }

    pub async fn signal_count(&self) -> usize {
        self.state.lock().await.signal_count()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn insert(&self, artifact: ContentArtifact) -> PipelineResult<ArtifactId> {
        Ok(self.state.lock().await.insert(artifact))
    }

    async fn query_unpublished(&self, limit: usize) -> PipelineResult<Vec<ContentArtifact>> {
        Ok(self.state.lock().await.query_unpublished(limit))
    }

    async fn mark_published(&self, id: ArtifactId, date: NaiveDate) -> PipelineResult<ContentArtifact> {
        self.state.lock().await.mark_published(id, date)
    }

    async fn query_published_for_date(&self, date: NaiveDate) -> PipelineResult<Option<ContentArtifact>> {
        Ok(self.state.lock().await.published_for_date(date).cloned())
    }

    async fn store_signals(&self, signals: Vec<StoredSignal>) -> PipelineResult<usize> {
        Ok(self.state.lock().await.store_signals(signals))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
