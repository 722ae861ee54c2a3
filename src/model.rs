//! model.rs: generated idea artifacts and the trend snapshot they carry.
//!
//! An artifact is created unpublished by the generation step and flipped to
//! published exactly once by the daily selector. At most one artifact may be
//! published for a given date; repositories enforce that on `mark_published`.

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, PipelineResult};
use crate::ingest::types::{RawSignal, SourceKind};

/// Repository-assigned identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub u64);

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Closed set of trend categories, in categorization priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "AI/ML")]
    AiMl,
    Productivity,
    Business,
    Social,
    Health,
    Finance,
    Development,
    General,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::AiMl => "AI/ML",
            Category::Productivity => "Productivity",
            Category::Business => "Business",
            Category::Social => "Social",
            Category::Health => "Health",
            Category::Finance => "Finance",
            Category::Development => "Development",
            Category::General => "General",
        }
    }

    /// Tag form: lowercased with `/` replaced by `-` (e.g. "ai-ml").
    pub fn tag(self) -> String {
        self.as_str().to_lowercase().replace('/', "-")
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevenuePotential {
    Low,
    Medium,
    High,
}

impl RevenuePotential {
    /// Weight used by the daily selector's revenue term.
    pub fn weight(self) -> f64 {
        match self {
            RevenuePotential::High => 1.0,
            RevenuePotential::Medium => 0.7,
            RevenuePotential::Low => 0.4,
        }
    }
}

/// Frozen view of the trend an artifact was generated from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendSnapshot {
    pub keywords: Vec<String>,
    pub category: Category,
    pub strength: f64,
    pub sources: Vec<SourceKind>,
}

/// Structured content returned by the generation provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaContent {
    pub title: String,
    pub description: String,
    pub what_it_is: String,
    pub why_it_matters: String,
    pub tools_youd_use: Vec<String>,
    pub mvp_feature_set: Vec<String>,
    pub monetization_ideas: Vec<String>,
    pub build_difficulty: u8,
    pub build_difficulty_reason: String,
    pub variations: Vec<String>,
    pub tweetable_summary: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentArtifact {
    /// `None` until a repository stores it (and for synthetic artifacts).
    pub id: Option<ArtifactId>,
    pub trend: Option<TrendSnapshot>,
    pub content: IdeaContent,
    pub difficulty_score: u8,
    pub revenue_potential: RevenuePotential,
    pub build_time_estimate: String,
    pub tools_required: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub is_published: bool,
    pub published_date: Option<NaiveDate>,
}

impl ContentArtifact {
    pub fn title(&self) -> &str {
        &self.content.title
    }

    /// Strength from the stored snapshot, 0 when absent.
    pub fn trend_strength(&self) -> f64 {
        self.trend.as_ref().map(|t| t.strength).unwrap_or(0.0)
    }

    pub fn hours_since_created(&self, now: DateTime<Utc>) -> f64 {
        now.signed_duration_since(self.created_at).num_seconds() as f64 / 3600.0
    }

    /// Unpublished → Published. Published is terminal.
    pub fn publish(&mut self, date: NaiveDate) -> PipelineResult<()> {
        if self.is_published {
            return Err(PipelineError::AlreadyPublished {
                date: self.published_date.unwrap_or(date),
            });
        }
        self.is_published = true;
        self.published_date = Some(date);
        Ok(())
    }
}

/// A raw signal as persisted before aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSignal {
    pub source: SourceKind,
    /// Keywords joined with ", ".
    pub keyword: String,
    pub strength: f64,
    pub signal: RawSignal,
}
