// tests/metrics.rs
#![cfg(feature = "strict-metrics")]

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use trend_idea_pipeline::generate::{MockProvider, ModelGenerator, Unpaced};
use trend_idea_pipeline::ingest::providers::{InterestSeries, SearchSource};
use trend_idea_pipeline::ingest::types::SignalSource;
use trend_idea_pipeline::metrics::Metrics;
use trend_idea_pipeline::repo::MemoryRepository;
use trend_idea_pipeline::{PipelineConfig, Storage, TrendPipeline};

#[tokio::test]
async fn run_populates_expected_series() {
    let metrics = Metrics::init().expect("recorder installs once per test binary");

    let mut ramp = vec![10.0; 10];
    ramp.extend(vec![40.0; 10]);
    let sources: Vec<Box<dyn SignalSource>> = vec![Box::new(SearchSource::from_records(vec![InterestSeries {
        keyword: "AI automation".into(),
        interest: ramp,
        related_queries: vec![],
        observed_at: None,
    }]))];
    let pipeline = TrendPipeline::new(
        PipelineConfig::default(),
        sources,
        Arc::new(ModelGenerator::new(MockProvider::canned())),
        Storage::new(Arc::new(MemoryRepository::new()), Duration::from_secs(5)),
    )
    .with_pacer(Arc::new(Unpaced));

    pipeline.run_daily(Utc::now()).await.unwrap();
    let text = metrics.render();

    for needle in [
        "signals_collected_total",
        "trends_ranked",
        "generation_attempts_total",
        "artifacts_stored_total",
        "artifacts_published_total",
        "pipeline_last_run_ts",
    ] {
        assert!(
            text.contains(needle),
            "metrics exposition missing '{needle}'\n{text}"
        );
    }
}
