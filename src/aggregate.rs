//! # Trend Aggregation
//! Folds raw signals from every source into per-keyword trends, then filters
//! weak ones and ranks the rest.
//!
//! Policy: a trend's strength is the strongest single contributing signal
//! (max, never sum or average). Category and suggested uses are fixed from the
//! first keyword seen for a key and never revisited within the run.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::ingest::normalize_keyword;
use crate::ingest::types::{RawSignal, SourceKind};
use crate::model::{Category, TrendSnapshot};
use crate::strength::StrengthScorer;

/// Trends at or below this strength are dropped.
pub const WEAK_SIGNAL_THRESHOLD: f64 = 0.1;
pub const MAX_TRENDS: usize = 20;

/// Category term lists in priority order; first substring hit wins.
const CATEGORY_TERMS: &[(Category, &[&str])] = &[
    (
        Category::AiMl,
        &["ai", "ml", "gpt", "claude", "chatgpt", "artificial", "machine learning"],
    ),
    (
        Category::Productivity,
        &["productivity", "workflow", "automation", "scheduling", "todo"],
    ),
    (
        Category::Business,
        &["saas", "startup", "revenue", "business", "invoice", "crm"],
    ),
    (
        Category::Social,
        &["social", "community", "networking", "messaging", "collaboration"],
    ),
    (
        Category::Health,
        &["fitness", "health", "wellness", "medical", "mental health"],
    ),
    (
        Category::Finance,
        &["finance", "budget", "crypto", "investment", "banking", "money"],
    ),
    (
        Category::Development,
        &["code", "api", "development", "programming", "web", "mobile"],
    ),
];

/// Suggestion rule groups, checked in order; the first group that fires wins.
const SUGGESTION_RULES: &[(&[&str], [&str; 3])] = &[
    (
        &["ai", "gpt"],
        ["AI-powered tool", "Automation service", "Content generator"],
    ),
    (
        &["productivity", "workflow"],
        ["Productivity app", "Team tool", "Process optimizer"],
    ),
    (
        &["social", "community"],
        ["Social platform", "Community tool", "Networking app"],
    ),
    (
        &["finance", "budget"],
        ["Financial tracker", "Budget app", "Investment tool"],
    ),
    (
        &["health", "fitness"],
        ["Health tracker", "Fitness app", "Wellness platform"],
    ),
];

const DEFAULT_SUGGESTIONS: [&str; 3] = ["Utility app", "SaaS tool", "Mobile app"];

pub fn categorize(keyword: &str) -> Category {
    let word = keyword.to_lowercase();
    CATEGORY_TERMS
        .iter()
        .find(|(_, terms)| terms.iter().any(|t| word.contains(t)))
        .map(|(cat, _)| *cat)
        .unwrap_or(Category::General)
}

pub fn suggest(keyword: &str) -> Vec<String> {
    let word = keyword.to_lowercase();
    let list = SUGGESTION_RULES
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| word.contains(f)))
        .map(|(_, list)| list)
        .unwrap_or(&DEFAULT_SUGGESTIONS);
    list.iter().map(|s| s.to_string()).collect()
}

/// A cluster of signals sharing one normalized keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregatedTrend {
    pub key: String,
    /// Original-case keywords that normalized to `key`, first-seen order.
    pub keywords: Vec<String>,
    pub signals: BTreeMap<SourceKind, Vec<RawSignal>>,
    pub strength: f64,
    pub category: Category,
    pub suggested_uses: Vec<String>,
}

impl AggregatedTrend {
    fn new(key: String, keyword: &str) -> Self {
        Self {
            key,
            keywords: vec![keyword.to_string()],
            signals: BTreeMap::new(),
            strength: 0.0,
            category: categorize(keyword),
            suggested_uses: suggest(keyword),
        }
    }

    /// Source kinds that contributed at least one signal.
    pub fn sources(&self) -> Vec<SourceKind> {
        self.signals
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, _)| *k)
            .collect()
    }

    pub fn has_source(&self, kind: SourceKind) -> bool {
        self.signals.get(&kind).is_some_and(|v| !v.is_empty())
    }

    pub fn signal_count(&self) -> usize {
        self.signals.values().map(Vec::len).sum()
    }

    pub fn snapshot(&self) -> TrendSnapshot {
        TrendSnapshot {
            keywords: self.keywords.clone(),
            category: self.category,
            strength: self.strength,
            sources: self.sources(),
        }
    }
}

/// Run-scoped trend table: insertion-ordered, indexed by key.
#[derive(Default)]
struct TrendTable {
    trends: Vec<AggregatedTrend>,
    index: HashMap<String, usize>,
}

impl TrendTable {
    fn upsert(&mut self, keyword: &str) -> Option<&mut AggregatedTrend> {
        let key = normalize_keyword(keyword);
        if key.is_empty() {
            return None;
        }
        let idx = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                self.trends.push(AggregatedTrend::new(key.clone(), keyword));
                self.index.insert(key, self.trends.len() - 1);
                self.trends.len() - 1
            }
        };
        let trend = &mut self.trends[idx];
        if !trend.keywords.iter().any(|k| k == keyword) {
            trend.keywords.push(keyword.to_string());
        }
        Some(trend)
    }
}

pub struct TrendAggregator<'a> {
    scorer: &'a dyn StrengthScorer,
    threshold: f64,
    max_trends: usize,
}

impl<'a> TrendAggregator<'a> {
    pub fn new(scorer: &'a dyn StrengthScorer) -> Self {
        Self {
            scorer,
            threshold: WEAK_SIGNAL_THRESHOLD,
            max_trends: MAX_TRENDS,
        }
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn with_max_trends(mut self, max: usize) -> Self {
        self.max_trends = max;
        self
    }

    /// Group, score, filter (`strength > threshold`), stable-rank by strength
    /// descending, truncate.
    pub fn aggregate(&self, by_source: &BTreeMap<SourceKind, Vec<RawSignal>>) -> Vec<AggregatedTrend> {
        let mut table = TrendTable::default();

        for (kind, signals) in by_source {
            for signal in signals {
                let strength = self.scorer.strength(signal);
                for keyword in signal.keywords() {
                    let Some(trend) = table.upsert(keyword) else {
                        continue;
                    };
                    trend.signals.entry(*kind).or_default().push(signal.clone());
                    trend.strength = trend.strength.max(strength);
                }
            }
        }

        let seen = table.trends.len();
        let mut ranked: Vec<AggregatedTrend> = table
            .trends
            .into_iter()
            .filter(|t| t.strength > self.threshold)
            .collect();
        // Vec::sort_by is stable: equal strengths keep first-seen order.
        ranked.sort_by(|a, b| {
            b.strength
                .partial_cmp(&a.strength)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(self.max_trends);

        tracing::info!(
            target: "aggregate",
            keys = seen,
            ranked = ranked.len(),
            top = ranked.first().map(|t| t.key.as_str()).unwrap_or("-"),
            "trends aggregated"
        );
        ranked
    }
}
