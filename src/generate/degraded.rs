//! Fallback generator used when no model is configured.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::aggregate::AggregatedTrend;
use crate::error::PipelineResult;
use crate::generate::{build_artifact, GenerationAdapter};
use crate::model::{ContentArtifact, IdeaContent, TrendSnapshot};

/// Deterministic stand-in content. Same idea for every trend.
pub fn synthetic_content() -> IdeaContent {
    IdeaContent {
        title: "Smart Workflow Builder for No-Code Teams".into(),
        description: "Drag-and-drop automation platform that connects your favorite tools without writing a single line of code.".into(),
        what_it_is: "A visual workflow builder that lets non-technical teams connect apps like Notion, Airtable, Slack and email, with AI-suggested automations.".into(),
        why_it_matters: "Teams lose hours every day on repetitive tasks, and current automation tools are still too complex for most users.".into(),
        tools_youd_use: vec![
            "Claude API".into(),
            "Replit".into(),
            "Supabase".into(),
            "React Flow".into(),
            "Stripe".into(),
        ],
        mvp_feature_set: vec![
            "Visual drag-and-drop workflow designer".into(),
            "Pre-built connectors for popular apps".into(),
            "AI-powered workflow suggestions".into(),
            "One-click template gallery".into(),
            "Real-time testing and debugging".into(),
        ],
        monetization_ideas: vec![
            "Freemium with premium connectors ($9/month)".into(),
            "Team plans with collaboration features ($29/month)".into(),
        ],
        build_difficulty: 3,
        build_difficulty_reason: "Several API integrations and a visual editor, but achievable with modern low-code tooling.".into(),
        variations: vec![
            "Focus on one vertical such as marketing or sales teams".into(),
            "Add AI workflow optimization".into(),
            "White-label for agencies".into(),
        ],
        tweetable_summary: "Most teams need automation that is as easy as drawing on a whiteboard. This builds exactly that.".into(),
    }
}

/// Synthetic artifact for an arbitrary snapshot (no repository id).
pub fn synthetic_artifact(trend: Option<TrendSnapshot>, now: DateTime<Utc>) -> ContentArtifact {
    build_artifact(trend, synthetic_content(), now)
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DegradedGenerator;

#[async_trait]
impl GenerationAdapter for DegradedGenerator {
    async fn generate(
        &self,
        trend: &AggregatedTrend,
        now: DateTime<Utc>,
    ) -> PipelineResult<ContentArtifact> {
        tracing::debug!(target: "generate", trend = %trend.key, "degraded generator: synthetic artifact");
        Ok(synthetic_artifact(Some(trend.snapshot()), now))
    }

    fn name(&self) -> &str {
        "degraded"
    }
}
