//! # Trend Pipeline
//! One daily run: collect → store raw signals → aggregate → generate top-K →
//! store artifacts → select & publish.
//!
//! Each step hands a fully built value to the next; nothing half-made crosses
//! a step boundary. Per-item failures (a source, a trend, a write) are logged
//! and counted in the `RunReport`; only selection-time persistence errors
//! abort the run.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use metrics::{describe_gauge, gauge};
use once_cell::sync::OnceCell;
use serde::Serialize;

use crate::aggregate::{AggregatedTrend, TrendAggregator};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::generate::degraded::synthetic_artifact;
use crate::generate::{build_generator, generate_batch, DynGenerator, MinInterval, Pacer};
use crate::ingest::providers::{CommunitySource, SearchSource};
use crate::ingest::types::{CommunityMetrics, RawSignal, SearchMetrics, SignalMetrics, SignalSource, SourceKind};
use crate::ingest::{collect_all, Collection};
use crate::model::{Category, ContentArtifact, StoredSignal};
use crate::repo::Storage;
use crate::select::{select_and_publish, Selection};
use crate::strength::{ScorerSet, StrengthScorer};

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_gauge!("trends_ranked", "Trends surviving the weak-signal filter in the last run.");
        describe_gauge!("pipeline_last_run_ts", "Unix ts when the pipeline last ran.");
    });
}

/// What one `run_daily` did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub signals_by_source: BTreeMap<SourceKind, usize>,
    pub failed_sources: Vec<String>,
    pub signals_stored: usize,
    pub trends_ranked: usize,
    pub generated: usize,
    pub generation_failures: usize,
    pub stored: usize,
    /// `None` when the run stopped before selection (no trends).
    pub selection: Option<Selection>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DemoOutcome {
    pub artifact: ContentArtifact,
    pub generator: String,
    /// Why the synthetic fallback was used, if it was.
    pub fallback_reason: Option<String>,
}

/// Fixed trend used by the quick demo.
pub fn demo_trend(now: DateTime<Utc>) -> AggregatedTrend {
    let ts = now.timestamp();
    let mut signals = BTreeMap::new();
    if let Some(s) = RawSignal::new(
        ["AI productivity"],
        SignalMetrics::Community(CommunityMetrics {
            upvotes: 150,
            comments: 45,
            created_utc: ts,
            title: "Best AI productivity tools".into(),
            community: "SideProject".into(),
            url: None,
        }),
        ts,
    ) {
        signals.insert(SourceKind::Community, vec![s]);
    }
    if let Some(s) = RawSignal::new(
        ["AI productivity"],
        SignalMetrics::Search(SearchMetrics {
            average_interest: 60.0,
            growth_percent: 25.0,
            related_queries: vec![],
            interest: vec![],
        }),
        ts,
    ) {
        signals.insert(SourceKind::Search, vec![s]);
    }
    AggregatedTrend {
        key: "ai productivity".into(),
        keywords: vec!["AI productivity".into(), "automation".into(), "no-code".into()],
        signals,
        strength: 0.75,
        category: Category::Productivity,
        suggested_uses: vec!["AI-powered tool".into(), "Automation service".into()],
    }
}

pub struct TrendPipeline {
    config: PipelineConfig,
    sources: Vec<Box<dyn SignalSource>>,
    generator: DynGenerator,
    pacer: Arc<dyn Pacer>,
    storage: Storage,
}

impl TrendPipeline {
    pub fn new(
        config: PipelineConfig,
        sources: Vec<Box<dyn SignalSource>>,
        generator: DynGenerator,
        storage: Storage,
    ) -> Self {
        let pacer = Arc::new(MinInterval::new(config.generation.min_spacing()));
        Self {
            config,
            sources,
            generator,
            pacer,
            storage,
        }
    }

    /// Wire sources, generator and storage from configuration.
    pub fn from_config(config: PipelineConfig) -> Self {
        let sources = sources_from_config(&config);
        let generator = build_generator(&config.generation);
        let storage = Storage::from_config(&config.storage);
        tracing::info!(
            target: "pipeline",
            sources = sources.len(),
            generator = generator.name(),
            storage = storage.name(),
            "pipeline assembled"
        );
        Self::new(config, sources, generator, storage)
    }

    pub fn with_pacer(mut self, pacer: Arc<dyn Pacer>) -> Self {
        self.pacer = pacer;
        self
    }

    async fn collect_and_rank(&self, scorer: &ScorerSet) -> (Collection, Vec<AggregatedTrend>) {
        let collection = collect_all(&self.sources, self.config.sources.timeout()).await;
        let trends = TrendAggregator::new(scorer)
            .with_threshold(self.config.ranking.weak_signal_threshold)
            .with_max_trends(self.config.ranking.max_trends)
            .aggregate(&collection.by_source);
        (collection, trends)
    }

    /// Collect and aggregate only.
    pub async fn rank(&self, now: DateTime<Utc>) -> Vec<AggregatedTrend> {
        let scorer = ScorerSet::standard(now.timestamp());
        self.collect_and_rank(&scorer).await.1
    }

    pub async fn run_daily(&self, now: DateTime<Utc>) -> PipelineResult<RunReport> {
        ensure_metrics_described();
        tracing::info!(target: "pipeline", %now, "daily run started");
        let scorer = ScorerSet::standard(now.timestamp());
        let (collection, trends) = self.collect_and_rank(&scorer).await;

        let mut report = RunReport {
            signals_by_source: collection.counts(),
            failed_sources: collection
                .failures
                .iter()
                .map(|f| match f {
                    PipelineError::SourceUnavailable { source_name, .. } => source_name.clone(),
                    other => other.to_string(),
                })
                .collect(),
            trends_ranked: trends.len(),
            ..Default::default()
        };
        gauge!("pipeline_last_run_ts").set(now.timestamp() as f64);
        gauge!("trends_ranked").set(trends.len() as f64);

        let mut stored_signals = Vec::with_capacity(collection.total_signals());
        for (kind, signals) in &collection.by_source {
            for s in signals {
                stored_signals.push(StoredSignal {
                    source: *kind,
                    keyword: s.keywords().join(", "),
                    strength: scorer.strength(s),
                    signal: s.clone(),
                });
            }
        }
        match self.storage.store_signals(stored_signals).await {
            Ok(n) => report.signals_stored = n,
            Err(e) => tracing::warn!(target: "storage", error = %e, "raw signals not stored"),
        }

        if trends.is_empty() {
            tracing::info!(target: "pipeline", "no trends found; stopping");
            return Ok(report);
        }

        let batch = generate_batch(
            self.generator.as_ref(),
            &trends,
            self.config.generation.top_k,
            self.pacer.as_ref(),
            self.config.generation.timeout(),
            now,
        )
        .await;
        report.generated = batch.artifacts.len();
        report.generation_failures = batch.failures.len();

        for artifact in batch.artifacts {
            let title = artifact.title().to_string();
            match self.storage.insert(artifact).await {
                Ok(Some(_)) => report.stored += 1,
                Ok(None) => {}
                Err(e) => tracing::warn!(target: "storage", %title, error = %e, "artifact not stored"),
            }
        }

        report.selection = Some(self.select_today(now).await?);
        tracing::info!(
            target: "pipeline",
            trends = report.trends_ranked,
            generated = report.generated,
            stored = report.stored,
            "daily run finished"
        );
        Ok(report)
    }

    /// Publish today's idea unless one already exists.
    async fn select_today(&self, now: DateTime<Utc>) -> PipelineResult<Selection> {
        let today = now.date_naive();
        match self.storage.published_for_date(today).await {
            Ok(Some(existing)) => {
                tracing::info!(target: "select", title = %existing.title(), "today already published");
                return Ok(Selection::AlreadyPublished { date: today });
            }
            Ok(None) | Err(PipelineError::PersistenceUnavailable) => {}
            Err(e) => return Err(e),
        }
        let candidates = self
            .storage
            .query_unpublished(self.config.selection.candidate_limit)
            .await?;
        select_and_publish(candidates, &self.storage, now).await
    }

    /// One artifact from the fixed demo trend. Never fails: generator errors
    /// fall back to the synthetic artifact.
    pub async fn run_quick_demo(&self, now: DateTime<Utc>) -> DemoOutcome {
        let trend = demo_trend(now);
        let timeout = self.config.generation.timeout();
        let result = match tokio::time::timeout(timeout, self.generator.generate(&trend, now)).await {
            Ok(r) => r,
            Err(_) => Err(PipelineError::Timeout {
                operation: "generation",
                secs: timeout.as_secs(),
            }),
        };
        match result {
            Ok(artifact) => DemoOutcome {
                artifact,
                generator: self.generator.name().to_string(),
                fallback_reason: None,
            },
            Err(e) => {
                tracing::warn!(target: "generate", error = %e, "demo generation failed; using fallback");
                DemoOutcome {
                    artifact: synthetic_artifact(Some(trend.snapshot()), now),
                    generator: "fallback".to_string(),
                    fallback_reason: Some(e.to_string()),
                }
            }
        }
    }

    /// Today's published idea. Without storage, a synthetic published idea.
    pub async fn todays_idea(&self, now: DateTime<Utc>) -> PipelineResult<Option<ContentArtifact>> {
        let today = now.date_naive();
        match self.storage.published_for_date(today).await {
            Err(PipelineError::PersistenceUnavailable) => {
                let mut snapshot = demo_trend(now).snapshot();
                snapshot.strength = 1.0;
                let mut artifact = synthetic_artifact(Some(snapshot), now);
                artifact.publish(today)?;
                Ok(Some(artifact))
            }
            other => other,
        }
    }
}

fn sources_from_config(cfg: &PipelineConfig) -> Vec<Box<dyn SignalSource>> {
    let s = &cfg.sources;
    let mut out: Vec<Box<dyn SignalSource>> = Vec::new();
    if let Some(path) = &s.community_path {
        out.push(Box::new(
            CommunitySource::from_path(path.clone())
                .with_communities(s.communities.clone())
                .with_posts_per_community(s.posts_per_community),
        ));
    }
    if let Some(path) = &s.search_path {
        let src = SearchSource::from_path(path.clone());
        out.push(Box::new(if s.search_keywords.is_empty() {
            src.with_default_keywords()
        } else {
            src.with_keywords(s.search_keywords.clone())
        }));
    }
    if out.is_empty() {
        tracing::warn!(target: "pipeline", "no signal sources configured");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generate::{DegradedGenerator, MockProvider, ModelGenerator, Unpaced};
    use crate::repo::MemoryRepository;
    use chrono::TimeZone;
    use std::time::Duration;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
    }

    fn pipeline(generator: DynGenerator, storage: Storage) -> TrendPipeline {
        TrendPipeline::new(PipelineConfig::default(), vec![], generator, storage)
            .with_pacer(Arc::new(Unpaced))
    }

    #[test]
    fn demo_trend_has_both_sources() {
        let t = demo_trend(now());
        assert_eq!(t.sources(), vec![SourceKind::Community, SourceKind::Search]);
        assert_eq!(t.category, Category::Productivity);
    }

    #[tokio::test]
    async fn no_sources_means_early_stop_without_error() {
        let p = pipeline(Arc::new(DegradedGenerator), Storage::new(Arc::new(MemoryRepository::new()), Duration::from_secs(5)));
        let report = p.run_daily(now()).await.unwrap();
        assert_eq!(report.trends_ranked, 0);
        assert!(report.selection.is_none());
    }

    #[tokio::test]
    async fn demo_falls_back_when_generator_fails() {
        let broken = Arc::new(ModelGenerator::new(MockProvider::new("not json")));
        let out = pipeline(broken, Storage::Degraded).run_quick_demo(now()).await;
        assert!(out.fallback_reason.is_some());
        assert_eq!(out.artifact.title(), "Smart Workflow Builder for No-Code Teams");

        let ok = pipeline(Arc::new(ModelGenerator::new(MockProvider::canned())), Storage::Degraded)
            .run_quick_demo(now())
            .await;
        assert!(ok.fallback_reason.is_none());
        assert_eq!(ok.generator, "mock");
        assert!(ok.artifact.tags.contains(&"productivity".to_string()));
    }

    #[tokio::test]
    async fn todays_idea_degraded_returns_synthetic_published() {
        let idea = pipeline(Arc::new(DegradedGenerator), Storage::Degraded)
            .todays_idea(now())
            .await
            .unwrap()
            .unwrap();
        assert!(idea.is_published);
        assert_eq!(idea.published_date, Some(now().date_naive()));
        assert_eq!(idea.trend_strength(), 1.0);
    }

    #[tokio::test]
    async fn todays_idea_is_none_before_publication() {
        let storage = Storage::new(Arc::new(MemoryRepository::new()), Duration::from_secs(5));
        let idea = pipeline(Arc::new(DegradedGenerator), storage).todays_idea(now()).await.unwrap();
        assert!(idea.is_none());
    }
}
