//! Idea generation: adapter abstraction, artifact derivation, paced batches.
//!
//! The batch loop is sequential. Every call waits on the injected `Pacer` and
//! is bounded by a timeout; a malformed, failed or late response skips that one
//! trend and the batch carries on.

pub mod degraded;
pub mod pacing;
pub mod parse;
pub mod prompt;
pub mod provider;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::aggregate::AggregatedTrend;
use crate::config::GenerationConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::ingest::types::SourceKind;
use crate::model::{Category, ContentArtifact, IdeaContent, RevenuePotential, TrendSnapshot};

pub use degraded::DegradedGenerator;
pub use pacing::{MinInterval, Pacer, Unpaced};
pub use provider::{AnthropicProvider, MockProvider, TextProvider};

/// Env switch that forces the deterministic mock provider.
pub const ENV_GENERATOR_MODE: &str = "PIPELINE_GENERATOR_MODE";

const HIGH_REVENUE_TERMS: &[&str] = &["subscription", "premium", "enterprise", "api", "marketplace"];

fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!("generation_attempts_total", "Generation calls attempted.");
        describe_counter!(
            "generation_failures_total",
            "Generation calls that failed, timed out or returned malformed content."
        );
    });
}

#[async_trait]
pub trait GenerationAdapter: Send + Sync {
    /// One artifact for one trend. `now` becomes the artifact's creation time.
    async fn generate(
        &self,
        trend: &AggregatedTrend,
        now: DateTime<Utc>,
    ) -> PipelineResult<ContentArtifact>;

    fn name(&self) -> &str;
}

pub type DynGenerator = Arc<dyn GenerationAdapter>;

/// "high" on any strong monetization term, else "medium" for several ideas,
/// else "low".
pub fn revenue_potential(monetization: &[String]) -> RevenuePotential {
    let strong = monetization.iter().any(|idea| {
        let idea = idea.to_lowercase();
        HIGH_REVENUE_TERMS.iter().any(|t| idea.contains(t))
    });
    if strong {
        RevenuePotential::High
    } else if monetization.len() > 1 {
        RevenuePotential::Medium
    } else {
        RevenuePotential::Low
    }
}

pub fn build_time_estimate(difficulty: u8) -> &'static str {
    match difficulty {
        1 => "1-2 days",
        2 => "3-5 days",
        4 => "2-4 weeks",
        5 => "1-2 months",
        _ => "1-2 weeks",
    }
}

pub fn derive_tags(trend: Option<&TrendSnapshot>, difficulty: u8) -> Vec<String> {
    let mut tags = Vec::new();
    if let Some(t) = trend {
        if t.category != Category::General {
            tags.push(t.category.tag());
        }
    }
    tags.push("trend-backed".to_string());
    if difficulty <= 2 {
        tags.push("easy-build".to_string());
    } else if difficulty >= 4 {
        tags.push("advanced".to_string());
    }
    tags.push("revenue-ready".to_string());
    if let Some(t) = trend {
        for kind in SourceKind::ALL {
            if t.sources.contains(&kind) {
                tags.push(kind.presence_tag().to_string());
            }
        }
    }
    tags
}

/// Derive every artifact field from parsed content. Unstored, unpublished.
pub fn build_artifact(
    trend: Option<TrendSnapshot>,
    content: IdeaContent,
    now: DateTime<Utc>,
) -> ContentArtifact {
    let difficulty = content.build_difficulty;
    ContentArtifact {
        id: None,
        tags: derive_tags(trend.as_ref(), difficulty),
        revenue_potential: revenue_potential(&content.monetization_ideas),
        build_time_estimate: build_time_estimate(difficulty).to_string(),
        tools_required: content.tools_youd_use.clone(),
        difficulty_score: difficulty,
        trend,
        content,
        created_at: now,
        is_published: false,
        published_date: None,
    }
}

/// Prompt a text provider and parse its reply.
pub struct ModelGenerator<P> {
    provider: P,
}

impl<P: TextProvider> ModelGenerator<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: TextProvider> GenerationAdapter for ModelGenerator<P> {
    async fn generate(
        &self,
        trend: &AggregatedTrend,
        now: DateTime<Utc>,
    ) -> PipelineResult<ContentArtifact> {
        let failure = |reason: String| PipelineError::GenerationFailure {
            trend: trend.key.clone(),
            reason,
        };
        let text = self
            .provider
            .complete(&prompt::build_prompt(trend))
            .await
            .map_err(|e| failure(format!("{e:#}")))?;
        let content = parse::parse_idea(&text).map_err(failure)?;
        Ok(build_artifact(Some(trend.snapshot()), content, now))
    }

    fn name(&self) -> &str {
        self.provider.name()
    }
}

#[derive(Debug, Default)]
pub struct GenerationBatch {
    pub artifacts: Vec<ContentArtifact>,
    pub failures: Vec<PipelineError>,
}

/// Generate for the first `top_k` trends, in order, one call at a time.
pub async fn generate_batch(
    generator: &dyn GenerationAdapter,
    trends: &[AggregatedTrend],
    top_k: usize,
    pacer: &dyn Pacer,
    timeout: Duration,
    now: DateTime<Utc>,
) -> GenerationBatch {
    ensure_metrics_described();
    let mut batch = GenerationBatch::default();

    for trend in trends.iter().take(top_k) {
        pacer.ready().await;
        counter!("generation_attempts_total").increment(1);

        let outcome = match tokio::time::timeout(timeout, generator.generate(trend, now)).await {
            Ok(res) => res,
            Err(_) => Err(PipelineError::Timeout {
                operation: "generation",
                secs: timeout.as_secs(),
            }),
        };
        match outcome {
            Ok(artifact) => {
                tracing::info!(target: "generate", trend = %trend.key, title = %artifact.title(), "idea generated");
                batch.artifacts.push(artifact);
            }
            Err(e) => {
                tracing::warn!(target: "generate", trend = %trend.key, error = %e, "generation failed; trend skipped");
                counter!("generation_failures_total").increment(1);
                batch.failures.push(e);
            }
        }
    }

    tracing::info!(
        target: "generate",
        generator = generator.name(),
        generated = batch.artifacts.len(),
        failed = batch.failures.len(),
        "generation batch done"
    );
    batch
}

/// Build the generator the configuration asks for.
///
/// * `PIPELINE_GENERATOR_MODE=mock` or `provider = "mock"`: canned mock model.
/// * disabled, unknown provider, or no API key: `DegradedGenerator`.
/// * otherwise the Messages API provider.
pub fn build_generator(cfg: &GenerationConfig) -> DynGenerator {
    let forced_mock = std::env::var(ENV_GENERATOR_MODE)
        .map(|v| v.eq_ignore_ascii_case("mock"))
        .unwrap_or(false);
    if forced_mock {
        return Arc::new(ModelGenerator::new(MockProvider::canned()));
    }
    if !cfg.enabled {
        tracing::info!(target: "generate", "generation disabled; using degraded generator");
        return Arc::new(DegradedGenerator);
    }

    match cfg.provider.as_str() {
        "mock" => Arc::new(ModelGenerator::new(MockProvider::canned())),
        "anthropic" => {
            let Some(key) = cfg.resolved_api_key() else {
                tracing::warn!(target: "generate", "no api key; using degraded generator");
                return Arc::new(DegradedGenerator);
            };
            tracing::info!(target: "generate", key_len = key.len(), "anthropic provider configured");
            match AnthropicProvider::new(key, cfg.model.as_deref(), cfg.timeout()) {
                Ok(p) => Arc::new(ModelGenerator::new(p)),
                Err(e) => {
                    tracing::warn!(target: "generate", error = %format!("{e:#}"), "provider init failed; using degraded generator");
                    Arc::new(DegradedGenerator)
                }
            }
        }
        other => {
            tracing::warn!(target: "generate", provider = other, "unknown provider; using degraded generator");
            Arc::new(DegradedGenerator)
        }
    }
}
