use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::ingest::types::{RawSignal, SearchMetrics, SignalMetrics, SignalSource, SourceKind};

/// Points compared at each end of the series when computing growth.
const GROWTH_WINDOW: usize = 10;
const MAX_RELATED_QUERIES: usize = 5;

/// Keywords watched for app-idea interest when no watch list is configured.
pub const DEFAULT_WATCH_KEYWORDS: &[&str] = &[
    // AI & tech
    "AI automation",
    "ChatGPT plugin",
    "Claude API",
    "voice AI",
    "AI writing tool",
    "AI image generator",
    // Productivity & business
    "no code app",
    "side hustle 2025",
    "SaaS idea",
    "productivity app",
    "remote work tool",
    "team collaboration",
    // Niches
    "fitness tracker",
    "meal planning app",
    "budget tracker",
    "social media scheduler",
    "invoice generator",
    "password manager",
    // Platforms
    "Replit app",
    "Vercel deployment",
    "Supabase project",
    "Next.js template",
    "React component",
    "TypeScript starter",
];

/// Interest-over-time record for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterestSeries {
    pub keyword: String,
    pub interest: Vec<f64>,
    #[serde(default)]
    pub related_queries: Vec<String>,
    /// Unix seconds of the observation; collection time when absent.
    #[serde(default)]
    pub observed_at: Option<i64>,
}

fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        0.0
    } else {
        xs.iter().sum::<f64>() / xs.len() as f64
    }
}

/// Summarize a series: mean interest, late-vs-early growth in percent, capped
/// related queries. Empty series yield `None`.
pub fn summarize(series: &InterestSeries) -> Option<SearchMetrics> {
    if series.interest.is_empty() {
        return None;
    }
    let values = &series.interest;
    let early = &values[..values.len().min(GROWTH_WINDOW)];
    let late = &values[values.len().saturating_sub(GROWTH_WINDOW)..];
    let early_avg = mean(early);
    let growth = if early_avg > 0.0 {
        (mean(late) - early_avg) / early_avg * 100.0
    } else {
        0.0
    };
    Some(SearchMetrics {
        average_interest: mean(values),
        growth_percent: growth,
        related_queries: series
            .related_queries
            .iter()
            .take(MAX_RELATED_QUERIES)
            .cloned()
            .collect(),
        interest: values.clone(),
    })
}

pub struct SearchSource {
    mode: Mode,
    keywords: Vec<String>,
}

enum Mode {
    Records(Vec<InterestSeries>),
    File(PathBuf),
}

impl SearchSource {
    pub fn from_records(series: Vec<InterestSeries>) -> Self {
        Self {
            mode: Mode::Records(series),
            keywords: Vec::new(),
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let series: Vec<InterestSeries> =
            serde_json::from_str(s).context("parsing search interest json")?;
        Ok(Self::from_records(series))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::File(path.into()),
            keywords: Vec::new(),
        }
    }

    /// Restrict to these keywords (case-insensitive). Empty keeps all.
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords;
        self
    }

    /// Restrict to the built-in app-idea watch list.
    pub fn with_default_keywords(self) -> Self {
        let kws = DEFAULT_WATCH_KEYWORDS.iter().map(|s| s.to_string()).collect();
        self.with_keywords(kws)
    }

    fn to_signals(&self, series: Vec<InterestSeries>, now: i64) -> Vec<RawSignal> {
        let mut scored: Vec<(f64, RawSignal)> = Vec::new();
        for s in series {
            let watched = self.keywords.is_empty()
                || self.keywords.iter().any(|k| k.eq_ignore_ascii_case(&s.keyword));
            if !watched {
                continue;
            }
            let Some(metrics) = summarize(&s) else {
                tracing::debug!(target: "ingest", keyword = %s.keyword, "empty interest series");
                continue;
            };
            let growth = metrics.growth_percent;
            let observed = s.observed_at.unwrap_or(now);
            if let Some(sig) = RawSignal::new([s.keyword], SignalMetrics::Search(metrics), observed) {
                scored.push((growth, sig));
            }
        }
        // Fastest-growing first; stable for equal growth.
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.into_iter().map(|(_, s)| s).collect()
    }
}

#[async_trait]
impl SignalSource for SearchSource {
    async fn collect(&self) -> Result<Vec<RawSignal>> {
        let series = match &self.mode {
            Mode::Records(series) => series.clone(),
            Mode::File(path) => {
                let body = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading search interest from {}", path.display()))?;
                serde_json::from_str(&body).context("parsing search interest json")?
            }
        };
        Ok(self.to_signals(series, chrono::Utc::now().timestamp()))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Search
    }

    fn name(&self) -> &str {
        "search"
    }
}
