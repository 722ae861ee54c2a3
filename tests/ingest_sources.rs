// tests/ingest_sources.rs
use std::time::Duration;

use trend_idea_pipeline::ingest::collect_all;
use trend_idea_pipeline::ingest::providers::{CommunitySource, SearchSource};
use trend_idea_pipeline::ingest::types::{SignalMetrics, SignalSource, SourceKind};
use trend_idea_pipeline::PipelineError;

const POSTS: &str = r#"[
  {"title": "My Supabase dashboard", "score": 10, "num_comments": 2, "created_utc": 1757150000, "subreddit": "SideProject"},
  {"title": "Another SaaS launch", "score": 20, "num_comments": 4, "created_utc": 1757150000, "subreddit": "sideproject"},
  {"title": "Third webhook tool", "score": 30, "num_comments": 6, "created_utc": 1757150000, "subreddit": "SideProject"},
  {"title": "Claude plugin", "score": 40, "num_comments": 8, "created_utc": 1757150000, "subreddit": "ClaudeAI"},
  {"title": "Sourdough results", "score": 900, "num_comments": 80, "created_utc": 1757150000, "subreddit": "Breadit"}
]"#;

#[tokio::test]
async fn file_backed_community_source_filters_and_caps() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("posts.json");
    std::fs::write(&path, POSTS).unwrap();

    let src = CommunitySource::from_path(&path)
        .with_communities(vec!["SideProject".into(), "ClaudeAI".into(), "Breadit".into()])
        .with_posts_per_community(2);
    let signals = src.collect().await.unwrap();

    // 2 of 3 SideProject posts (case-insensitive), the ClaudeAI post; the
    // bread post has no tech keywords.
    let titles: Vec<&str> = signals
        .iter()
        .map(|s| match s.metrics() {
            SignalMetrics::Community(m) => m.title.as_str(),
            _ => unreachable!(),
        })
        .collect();
    assert_eq!(titles, vec!["My Supabase dashboard", "Another SaaS launch", "Claude plugin"]);
    assert_eq!(signals[0].keywords(), ["supabase", "dashboard"]);
    assert_eq!(signals[0].observed_at(), 1_757_150_000);
}

#[tokio::test]
async fn search_source_from_json_orders_by_growth() {
    let src = SearchSource::from_json(
        r#"[
          {"keyword": "budget tracker", "interest": [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 12, 12, 12, 12, 12, 12, 12, 12, 12, 12]},
          {"keyword": "voice AI", "interest": [10, 10, 10, 10, 10, 10, 10, 10, 10, 10, 40, 40, 40, 40, 40, 40, 40, 40, 40, 40]},
          {"keyword": "empty", "interest": []}
        ]"#,
    )
    .unwrap();
    let out = src.collect().await.unwrap();
    let kws: Vec<&str> = out.iter().map(|s| s.keywords()[0].as_str()).collect();
    assert_eq!(kws, vec!["voice AI", "budget tracker"]);
}

#[tokio::test]
async fn missing_file_is_contained_as_source_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let good = SearchSource::from_json(r#"[{"keyword": "SaaS idea", "interest": [5, 50]}]"#).unwrap();
    let sources: Vec<Box<dyn SignalSource>> = vec![
        Box::new(CommunitySource::from_path(dir.path().join("missing.json"))),
        Box::new(good),
    ];

    let got = collect_all(&sources, Duration::from_secs(5)).await;
    assert_eq!(got.total_signals(), 1);
    assert_eq!(got.counts().get(&SourceKind::Search), Some(&1));
    assert!(matches!(
        &got.failures[..],
        [PipelineError::SourceUnavailable { source_name, reason }]
            if source_name == "community" && reason.contains("missing.json")
    ));
}
