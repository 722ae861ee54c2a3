// src/ingest/types.rs
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Kind of external source a signal came from. Ordering is the fixed
/// aggregation order: community signals are folded in before search signals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Community,
    Search,
}

impl SourceKind {
    pub const ALL: [SourceKind; 2] = [SourceKind::Community, SourceKind::Search];

    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::Community => "community",
            SourceKind::Search => "search",
        }
    }

    /// Tag attached to artifacts whose trend had contributions from this source.
    pub fn presence_tag(self) -> &'static str {
        match self {
            SourceKind::Community => "community-driven",
            SourceKind::Search => "search-trending",
        }
    }
}

/// Engagement data of one community discussion post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityMetrics {
    pub upvotes: i64,
    pub comments: i64,
    /// Unix seconds when the post was created.
    pub created_utc: i64,
    pub title: String,
    pub community: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Search-interest summary for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchMetrics {
    /// Mean interest on the provider's 0–100 scale.
    pub average_interest: f64,
    /// Late-period vs early-period growth, in percent.
    pub growth_percent: f64,
    #[serde(default)]
    pub related_queries: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub interest: Vec<f64>,
}

/// Source-specific payload; the variant decides the source kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "lowercase")]
pub enum SignalMetrics {
    Community(CommunityMetrics),
    Search(SearchMetrics),
}

/// One observation from one source. Immutable once built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawSignal {
    keywords: Vec<String>,
    metrics: SignalMetrics,
    /// Unix seconds.
    observed_at: i64,
}

impl RawSignal {
    /// Blank keywords are dropped; returns `None` when none are left.
    pub fn new<I, S>(keywords: I, metrics: SignalMetrics, observed_at: i64) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(Into::into)
            .filter(|k| !k.trim().is_empty())
            .collect();
        if keywords.is_empty() {
            return None;
        }
        Some(Self {
            keywords,
            metrics,
            observed_at,
        })
    }

    pub fn kind(&self) -> SourceKind {
        match self.metrics {
            SignalMetrics::Community(_) => SourceKind::Community,
            SignalMetrics::Search(_) => SourceKind::Search,
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn metrics(&self) -> &SignalMetrics {
        &self.metrics
    }

    pub fn observed_at(&self) -> i64 {
        self.observed_at
    }

    /// Number of keywords that differ ignoring case.
    pub fn distinct_keyword_count(&self) -> usize {
        let mut seen = std::collections::HashSet::new();
        self.keywords
            .iter()
            .filter(|k| seen.insert(k.to_lowercase()))
            .count()
    }
}

#[async_trait::async_trait]
pub trait SignalSource: Send + Sync {
    async fn collect(&self) -> Result<Vec<RawSignal>>;
    fn kind(&self) -> SourceKind;
    fn name(&self) -> &str;
}
