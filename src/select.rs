//! # Daily Selection
//! Scores the most recent unpublished artifacts and publishes one per day.
//!
//! Score = strength·0.4 + ease·0.3 + revenue·0.2 + recency·0.1, where
//! ease = (6 − difficulty)/5 and recency decays linearly to 0 over 72 hours.
//! Ties go to the earliest candidate in input order (the input is already
//! most-recent-first and is never reordered).

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::error::{PipelineError, PipelineResult};
use crate::model::ContentArtifact;
use crate::repo::Storage;

const W_STRENGTH: f64 = 0.4;
const W_EASE: f64 = 0.3;
const W_REVENUE: f64 = 0.2;
const W_RECENCY: f64 = 0.1;
const RECENCY_HOURS: f64 = 72.0;

pub fn score_idea(artifact: &ContentArtifact, now: DateTime<Utc>) -> f64 {
    let strength = artifact.trend_strength();
    let strength = if strength.is_finite() { strength.clamp(0.0, 1.0) } else { 0.0 };
    let difficulty = f64::from(artifact.difficulty_score.clamp(1, 5));
    let ease = (6.0 - difficulty) / 5.0;
    let revenue = artifact.revenue_potential.weight();
    let recency = (1.0 - artifact.hours_since_created(now) / RECENCY_HOURS).clamp(0.0, 1.0);

    strength * W_STRENGTH + ease * W_EASE + revenue * W_REVENUE + recency * W_RECENCY
}

/// Index of the first maximal candidate.
pub fn select_best(candidates: &[ContentArtifact], now: DateTime<Utc>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, a) in candidates.iter().enumerate() {
        let s = score_idea(a, now);
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((i, s)),
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Selection {
    Published { artifact: ContentArtifact, score: f64 },
    /// Today already has a publication; nothing was written.
    AlreadyPublished { date: NaiveDate },
    /// No unpublished candidates; nothing was written.
    NoneAvailable,
}

/// Pick the best candidate and publish it for `now`'s date.
pub async fn select_and_publish(
    candidates: Vec<ContentArtifact>,
    storage: &Storage,
    now: DateTime<Utc>,
) -> PipelineResult<Selection> {
    let Some(idx) = select_best(&candidates, now) else {
        tracing::info!(target: "select", "no unpublished ideas available");
        return Ok(Selection::NoneAvailable);
    };
    let winner = &candidates[idx];
    let score = score_idea(winner, now);
    let Some(id) = winner.id else {
        return Err(PipelineError::Persistence(format!(
            "candidate `{}` has no id",
            winner.title()
        )));
    };

    let date = now.date_naive();
    match storage.mark_published(id, date).await {
        Ok(artifact) => {
            tracing::info!(target: "select", %id, title = %artifact.title(), score, "published daily idea");
            Ok(Selection::Published { artifact, score })
        }
        Err(PipelineError::AlreadyPublished { date }) => {
            tracing::info!(target: "select", %date, "an idea is already published today");
            Ok(Selection::AlreadyPublished { date })
        }
        Err(e) => Err(e),
    }
}
