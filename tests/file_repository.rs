// tests/file_repository.rs
use chrono::{TimeZone, Utc};
use trend_idea_pipeline::generate::degraded::synthetic_artifact;
use trend_idea_pipeline::ingest::types::{RawSignal, SearchMetrics, SignalMetrics, SourceKind};
use trend_idea_pipeline::model::StoredSignal;
use trend_idea_pipeline::repo::JsonFileRepository;
use trend_idea_pipeline::{PipelineError, Repository};

#[tokio::test]
async fn contents_survive_reopening() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ideas.json");
    let t0 = Utc.with_ymd_and_hms(2025, 9, 6, 9, 0, 0).unwrap();
    let day = t0.date_naive();

    let first = JsonFileRepository::new(&path);
    let a = first.insert(synthetic_artifact(None, t0)).await.unwrap();
    let b = first
        .insert(synthetic_artifact(None, t0 + chrono::Duration::hours(1)))
        .await
        .unwrap();
    first.mark_published(a, day).await.unwrap();
    assert!(path.exists());
    assert!(!path.with_extension("json.tmp").exists());

    let reopened = JsonFileRepository::new(&path);
    let today = reopened.query_published_for_date(day).await.unwrap().unwrap();
    assert_eq!(today.id, Some(a));
    let pool = reopened.query_unpublished(5).await.unwrap();
    assert_eq!(pool.len(), 1);
    assert_eq!(pool[0].id, Some(b));

    // ids keep increasing after reopen
    let c = reopened.insert(synthetic_artifact(None, t0)).await.unwrap();
    assert!(c > b);

    assert!(matches!(
        reopened.mark_published(b, day).await,
        Err(PipelineError::AlreadyPublished { .. })
    ));
}

#[tokio::test]
async fn raw_signals_are_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ideas.json");
    let repo = JsonFileRepository::new(&path);

    let signal = RawSignal::new(
        ["budget tracker"],
        SignalMetrics::Search(SearchMetrics {
            average_interest: 32.0,
            growth_percent: 8.0,
            related_queries: vec!["budget tracker app".into()],
            interest: vec![30.0, 34.0],
        }),
        1_757_150_000,
    )
    .unwrap();
    let stored = StoredSignal {
        source: SourceKind::Search,
        keyword: signal.keywords().join(", "),
        strength: 0.176,
        signal,
    };
    assert_eq!(repo.store_signals(vec![stored]).await.unwrap(), 1);

    let body = std::fs::read_to_string(&path).unwrap();
    let doc: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(doc["signals"][0]["keyword"], "budget tracker");
    assert_eq!(doc["signals"][0]["source"], "search");
}

#[tokio::test]
async fn missing_file_reads_as_empty_store() {
    let dir = tempfile::tempdir().unwrap();
    let repo = JsonFileRepository::new(dir.path().join("absent.json"));
    assert!(repo.query_unpublished(5).await.unwrap().is_empty());
    assert!(!dir.path().join("absent.json").exists());
}
