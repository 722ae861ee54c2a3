// tests/pipeline_e2e.rs
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use trend_idea_pipeline::generate::{DegradedGenerator, MockProvider, ModelGenerator, Unpaced};
use trend_idea_pipeline::ingest::providers::{CommunityPost, CommunitySource, InterestSeries, SearchSource};
use trend_idea_pipeline::ingest::types::{RawSignal, SignalSource, SourceKind};
use trend_idea_pipeline::repo::MemoryRepository;
use trend_idea_pipeline::{PipelineConfig, Selection, Storage, TrendPipeline};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 9, 6, 12, 0, 0).unwrap()
}

struct Offline;

#[async_trait::async_trait]
impl SignalSource for Offline {
    async fn collect(&self) -> anyhow::Result<Vec<RawSignal>> {
        anyhow::bail!("dns lookup failed")
    }
    fn kind(&self) -> SourceKind {
        SourceKind::Community
    }
    fn name(&self) -> &str {
        "offline"
    }
}

fn sources() -> Vec<Box<dyn SignalSource>> {
    let post = CommunityPost {
        title: "Claude workflow automation dashboard".into(),
        selftext: String::new(),
        score: 500,
        num_comments: 250,
        created_utc: now().timestamp(),
        url: None,
        subreddit: "SideProject".into(),
    };
    let mut ramp = vec![10.0; 10];
    ramp.extend(vec![30.0; 10]);
    let series = InterestSeries {
        keyword: "AI automation".into(),
        interest: ramp,
        related_queries: vec![],
        observed_at: Some(now().timestamp()),
    };
    vec![
        Box::new(Offline),
        Box::new(CommunitySource::from_records(vec![post])),
        Box::new(SearchSource::from_records(vec![series])),
    ]
}

fn mock_pipeline(repo: Arc<MemoryRepository>) -> TrendPipeline {
    TrendPipeline::new(
        PipelineConfig::default(),
        sources(),
        Arc::new(ModelGenerator::new(MockProvider::canned())),
        Storage::new(repo, Duration::from_secs(5)),
    )
    .with_pacer(Arc::new(Unpaced))
}

#[tokio::test]
async fn daily_run_generates_stores_and_publishes_one_idea() {
    let repo = Arc::new(MemoryRepository::new());
    let pipeline = mock_pipeline(repo.clone());

    let report = pipeline.run_daily(now()).await.unwrap();
    assert_eq!(report.failed_sources, vec!["offline".to_string()]);
    assert_eq!(report.signals_by_source.get(&SourceKind::Community), Some(&1));
    assert_eq!(report.signals_by_source.get(&SourceKind::Search), Some(&1));
    assert_eq!(report.signals_stored, 2);
    assert_eq!(report.trends_ranked, 5);
    assert_eq!(report.generated, 5);
    assert_eq!(report.generation_failures, 0);
    assert_eq!(report.stored, 5);
    assert_eq!(repo.signal_count().await, 2);

    // Ties on score go to the most recent candidate: the last strength-1.0
    // trend generated.
    let Some(Selection::Published { artifact, .. }) = report.selection.clone() else {
        panic!("expected a publication, got {:?}", report.selection);
    };
    assert_eq!(artifact.trend.as_ref().unwrap().keywords, vec!["dashboard"]);
    assert!(artifact.tags.contains(&"community-driven".to_string()));

    let today = pipeline.todays_idea(now()).await.unwrap().unwrap();
    assert_eq!(today.id, artifact.id);
}

#[tokio::test]
async fn second_run_same_day_does_not_publish_again() {
    let repo = Arc::new(MemoryRepository::new());
    let pipeline = mock_pipeline(repo.clone());

    pipeline.run_daily(now()).await.unwrap();
    let again = pipeline.run_daily(now()).await.unwrap();
    assert_eq!(
        again.selection,
        Some(Selection::AlreadyPublished {
            date: now().date_naive()
        })
    );
    assert_eq!(repo.artifact_count().await, 10);

    let tomorrow = now() + chrono::Duration::days(1);
    let next = pipeline.run_daily(tomorrow).await.unwrap();
    assert!(matches!(next.selection, Some(Selection::Published { .. })));
}

#[tokio::test]
async fn malformed_generation_skips_trends_but_run_completes() {
    let repo = Arc::new(MemoryRepository::new());
    let pipeline = TrendPipeline::new(
        PipelineConfig::default(),
        sources(),
        Arc::new(ModelGenerator::new(MockProvider::new("<p>Sorry, rate limited.</p>"))),
        Storage::new(repo.clone(), Duration::from_secs(5)),
    )
    .with_pacer(Arc::new(Unpaced));

    let report = pipeline.run_daily(now()).await.unwrap();
    assert_eq!(report.generated, 0);
    assert_eq!(report.generation_failures, 5);
    assert_eq!(report.selection, Some(Selection::NoneAvailable));
    assert_eq!(repo.artifact_count().await, 0);
}

#[tokio::test]
async fn degraded_storage_runs_without_writes() {
    let pipeline = TrendPipeline::new(
        PipelineConfig::default(),
        sources(),
        Arc::new(DegradedGenerator),
        Storage::Degraded,
    )
    .with_pacer(Arc::new(Unpaced));

    let report = pipeline.run_daily(now()).await.unwrap();
    assert_eq!(report.generated, 5);
    assert_eq!(report.stored, 0);
    assert_eq!(report.signals_stored, 0);
    assert_eq!(report.selection, Some(Selection::NoneAvailable));
}

#[tokio::test]
async fn rank_only_collects_and_aggregates() {
    let repo = Arc::new(MemoryRepository::new());
    let trends = mock_pipeline(repo.clone()).rank(now()).await;
    let keys: Vec<&str> = trends.iter().map(|t| t.key.as_str()).collect();
    assert_eq!(keys, vec!["claude", "workflow", "automation", "dashboard", "ai automation"]);
    assert_eq!(repo.artifact_count().await, 0);
}
