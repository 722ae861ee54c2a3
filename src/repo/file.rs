//! JSON-file repository.
//!
//! The whole table is one JSON document. It is read lazily on first use and
//! rewritten after every mutation via a temp file plus rename, so a crash
//! mid-write leaves the previous document intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::NaiveDate;
use tokio::sync::Mutex;

use super::{RepoState, Repository};
use crate::error::{PipelineError, PipelineResult};
use crate::model::{ArtifactId, ContentArtifact, StoredSignal};

pub struct JsonFileRepository {
    path: PathBuf,
    state: Mutex<Option<RepoState>>,
}

impl JsonFileRepository {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            state: Mutex::new(None),
        }
    }

    async fn load(&self) -> PipelineResult<RepoState> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(body) if body.trim().is_empty() => Ok(RepoState::default()),
            Ok(body) => serde_json::from_str(&body).map_err(|e| {
                PipelineError::Persistence(format!("corrupt store {}: {e}", self.path.display()))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(RepoState::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn persist(&self, state: &RepoState) -> PipelineResult<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = self.path.with_extension("json.tmp");
        let json = serde_json::to_vec_pretty(state)?;
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Run `f` against the loaded state; persist when it reports a change.
    ///
    /// The cache is taken out of the lock while persisting. If the write fails
    /// or the call is cancelled mid-write, it stays empty and the next call
    /// reloads whatever actually reached disk.
    async fn with_state<T>(
        &self,
        f: impl FnOnce(&mut RepoState) -> PipelineResult<(T, bool)>,
    ) -> PipelineResult<T> {
        let mut guard = self.state.lock().await;
        let state = match guard.take() {
            Some(state) => state,
            None => self.load().await?,
        };

        let mut working = state.clone();
        match f(&mut working) {
            Ok((out, true)) => {
                self.persist(&working).await?;
                *guard = Some(working);
                Ok(out)
            }
            Ok((out, false)) => {
                *guard = Some(state);
                Ok(out)
            }
            Err(e) => {
                *guard = Some(state);
                Err(e)
            }
        }
    }
}

#[async_trait]
impl Repository for JsonFileRepository {
    async fn insert(&self, artifact: ContentArtifact) -> PipelineResult<ArtifactId> {
        self.with_state(|s| Ok((s.insert(artifact), true))).await
    }

    async fn query_unpublished(&self, limit: usize) -> PipelineResult<Vec<ContentArtifact>> {
        self.with_state(|s| Ok((s.query_unpublished(limit), false))).await
    }

    async fn mark_published(&self, id: ArtifactId, date: NaiveDate) -> PipelineResult<ContentArtifact> {
        self.with_state(|s| Ok((s.mark_published(id, date)?, true))).await
    }

    async fn query_published_for_date(&self, date: NaiveDate) -> PipelineResult<Option<ContentArtifact>> {
        self.with_state(|s| Ok((s.published_for_date(date).cloned(), false)))
            .await
    }

    async fn store_signals(&self, signals: Vec<StoredSignal>) -> PipelineResult<usize> {
        let dirty = !signals.is_empty();
        self.with_state(|s| Ok((s.store_signals(signals), dirty))).await
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::degraded::synthetic_artifact;
    use chrono::{TimeZone, Utc};

    #[tokio::test]
    async fn failed_mutation_leaves_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.json");
        let repo = JsonFileRepository::new(&path);
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();

        let id = repo.insert(synthetic_artifact(None, now)).await.unwrap();
        repo.mark_published(id, now.date_naive()).await.unwrap();
        let before = std::fs::read_to_string(&path).unwrap();

        assert!(repo.mark_published(ArtifactId(42), now.date_naive()).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), before);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_drops_the_cache_and_rereads_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.json");
        let repo = JsonFileRepository::new(&path);
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        repo.insert(synthetic_artifact(None, now)).await.unwrap();

        // A directory where the temp file goes makes the write fail.
        let tmp = path.with_extension("json.tmp");
        std::fs::create_dir(&tmp).unwrap();
        assert!(repo.insert(synthetic_artifact(None, now)).await.is_err());
        std::fs::remove_dir(&tmp).unwrap();

        // Another writer changes the file; the first repo must see it.
        let other = JsonFileRepository::new(&path);
        let id = other.insert(synthetic_artifact(None, now)).await.unwrap();
        let pool = repo.query_unpublished(10).await.unwrap();
        assert_eq!(pool.len(), 2);
        assert!(pool.iter().any(|a| a.id == Some(id)));
    }

    #[tokio::test]
    async fn cancelled_write_does_not_leave_a_stale_cache() {
        use futures::FutureExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.json");
        let repo = JsonFileRepository::new(&path);
        let now = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
        repo.insert(synthetic_artifact(None, now)).await.unwrap();

        // Polled once, then dropped while the file write is in flight.
        assert!(repo.insert(synthetic_artifact(None, now)).now_or_never().is_none());

        let other = JsonFileRepository::new(&path);
        let id = other.insert(synthetic_artifact(None, now)).await.unwrap();
        let pool = repo.query_unpublished(10).await.unwrap();
        assert!(pool.iter().any(|a| a.id == Some(id)));
    }

    #[tokio::test]
    async fn corrupt_document_is_a_persistence_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ideas.json");
        std::fs::write(&path, "{not json").unwrap();
        let repo = JsonFileRepository::new(&path);
        assert!(matches!(
            repo.query_unpublished(5).await,
            Err(PipelineError::Persistence(_))
        ));
    }
}
