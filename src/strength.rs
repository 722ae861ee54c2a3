//! # Signal Strength
//!
//! Maps one raw signal to a normalized strength in `[0.0, 1.0]`.
//!
//! - Community posts: engagement × age decay × keyword-richness bonus.
//! - Search interest: weighted interest + positive growth × related-queries bonus.
//!
//! Scorers are pure: the reference instant is fixed when the scorer is built,
//! so the same signal always scores the same within a run. The aggregator only
//! sees the `StrengthScorer` capability; new source kinds plug in through
//! `ScorerSet` without touching it.

use std::collections::HashMap;

use crate::ingest::types::{CommunityMetrics, RawSignal, SearchMetrics, SignalMetrics, SourceKind};

/// Age after which a post's decay hits its floor (one week).
const DECAY_HOURS: f64 = 168.0;
const DECAY_FLOOR: f64 = 0.1;

pub trait StrengthScorer: Send + Sync {
    /// Normalized strength in `[0.0, 1.0]`.
    fn strength(&self, signal: &RawSignal) -> f64;
}

/// Community-discussion scorer.
#[derive(Debug, Clone, Copy)]
pub struct CommunityStrength {
    /// Unix seconds the post age is measured against.
    pub now: i64,
}

impl CommunityStrength {
    pub fn new(now: i64) -> Self {
        Self { now }
    }

    pub fn score(&self, m: &CommunityMetrics, distinct_keywords: usize) -> f64 {
        let hours = self.now.saturating_sub(m.created_utc) as f64 / 3600.0;
        let decay = (1.0 - hours / DECAY_HOURS).max(DECAY_FLOOR);
        let engagement = (m.upvotes as f64 + 2.0 * m.comments as f64) / 100.0;
        let bonus = if distinct_keywords > 3 { 1.2 } else { 1.0 };
        clamp01((engagement * decay * bonus / 10.0).min(1.0))
    }
}

impl StrengthScorer for CommunityStrength {
    fn strength(&self, signal: &RawSignal) -> f64 {
        match signal.metrics() {
            SignalMetrics::Community(m) => self.score(m, signal.distinct_keyword_count()),
            _ => 0.0,
        }
    }
}

/// Search-interest scorer.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchStrength;

impl SearchStrength {
    pub fn score(&self, m: &SearchMetrics) -> f64 {
        if !(m.average_interest.is_finite() && m.growth_percent.is_finite()) {
            return 0.0;
        }
        let interest = (m.average_interest / 100.0).min(1.0);
        let growth = (m.growth_percent / 100.0).min(1.0).max(0.0);
        let bonus = if m.related_queries.len() > 3 { 1.1 } else { 1.0 };
        clamp01((interest * 0.4 + growth * 0.6) * bonus)
    }
}

impl StrengthScorer for SearchStrength {
    fn strength(&self, signal: &RawSignal) -> f64 {
        match signal.metrics() {
            SignalMetrics::Search(m) => self.score(m),
            _ => 0.0,
        }
    }
}

/// Dispatches to the scorer registered for the signal's source kind.
/// Kinds without a scorer score 0.
#[derive(Default)]
pub struct ScorerSet {
    by_kind: HashMap<SourceKind, Box<dyn StrengthScorer>>,
}

impl ScorerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Standard scorers for every built-in source, ages measured against `now`.
    pub fn standard(now: i64) -> Self {
        Self::new()
            .with(SourceKind::Community, CommunityStrength::new(now))
            .with(SourceKind::Search, SearchStrength)
    }

    pub fn with(mut self, kind: SourceKind, scorer: impl StrengthScorer + 'static) -> Self {
        self.by_kind.insert(kind, Box::new(scorer));
        self
    }
}

impl StrengthScorer for ScorerSet {
    fn strength(&self, signal: &RawSignal) -> f64 {
        self.by_kind
            .get(&signal.kind())
            .map(|s| s.strength(signal))
            .unwrap_or(0.0)
    }
}

/// Clamp to `[0, 1]`; non-finite values score 0.
fn clamp01(x: f64) -> f64 {
    if x.is_finite() {
        x.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn community(upvotes: i64, comments: i64, age_hours: i64, kws: &[&str]) -> RawSignal {
        RawSignal::new(
            kws.iter().copied(),
            SignalMetrics::Community(CommunityMetrics {
                upvotes,
                comments,
                created_utc: NOW - age_hours * 3600,
                title: "t".into(),
                community: "SideProject".into(),
                url: None,
            }),
            NOW - age_hours * 3600,
        )
        .unwrap()
    }

    fn search(avg: f64, growth: f64, related: usize) -> RawSignal {
        RawSignal::new(
            ["kw"],
            SignalMetrics::Search(SearchMetrics {
                average_interest: avg,
                growth_percent: growth,
                related_queries: (0..related).map(|i| format!("q{i}")).collect(),
                interest: vec![],
            }),
            NOW,
        )
        .unwrap()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn fresh_post_engagement() {
        // (500 + 2*250)/100 = 10 → 10*1*1/10 = 1.0
        let s = CommunityStrength::new(NOW).strength(&community(500, 250, 0, &["ai"]));
        assert!(approx(s, 1.0));
        // (100 + 2*50)/100 = 2 → 0.2
        let s = CommunityStrength::new(NOW).strength(&community(100, 50, 0, &["ai"]));
        assert!(approx(s, 0.2));
    }

    #[test]
    fn age_decays_linearly_to_floor() {
        let sc = CommunityStrength::new(NOW);
        // half a week → ×0.5
        assert!(approx(sc.strength(&community(100, 50, 84, &["ai"])), 0.1));
        // two weeks → floor 0.1
        assert!(approx(sc.strength(&community(100, 50, 336, &["ai"])), 0.02));
    }

    #[test]
    fn keyword_bonus_needs_more_than_three_distinct() {
        let sc = CommunityStrength::new(NOW);
        let three = sc.strength(&community(100, 50, 0, &["ai", "AI", "api", "saas"]));
        let four = sc.strength(&community(100, 50, 0, &["ai", "web", "api", "saas"]));
        assert!(approx(three, 0.2));
        assert!(approx(four, 0.24));
    }

    #[test]
    fn negative_engagement_clamps_to_zero() {
        let s = CommunityStrength::new(NOW).strength(&community(-400, 0, 0, &["ai"]));
        assert_eq!(s, 0.0);
    }

    #[test]
    fn extreme_timestamps_stay_in_range() {
        let sc = CommunityStrength::new(NOW);
        let post = |created_utc| CommunityMetrics {
            upvotes: 100,
            comments: 50,
            created_utc,
            title: "t".into(),
            community: "SideProject".into(),
            url: None,
        };
        // ancient: decay floor
        assert!(approx(sc.score(&post(i64::MIN), 1), 0.02));
        // far future: no decay at all, capped at 1
        let future = sc.score(&post(i64::MAX), 1);
        assert!((0.0..=1.0).contains(&future));
        assert!(approx(CommunityStrength::new(i64::MAX).score(&post(i64::MIN), 1), 0.02));
    }

    #[test]
    fn search_weights_interest_and_growth() {
        let sc = SearchStrength;
        // 0.5*0.4 + 0.25*0.6 = 0.35
        assert!(approx(sc.strength(&search(50.0, 25.0, 0)), 0.35));
        // negative growth contributes nothing
        assert!(approx(sc.strength(&search(50.0, -80.0, 0)), 0.2));
        // related bonus ×1.1, clamped at 1
        assert!(approx(sc.strength(&search(50.0, 25.0, 4)), 0.385));
        assert!(approx(sc.strength(&search(200.0, 500.0, 5)), 1.0));
    }

    #[test]
    fn non_finite_metrics_score_zero() {
        assert_eq!(SearchStrength.strength(&search(f64::NAN, 10.0, 0)), 0.0);
    }

    #[test]
    fn scorer_set_dispatches_by_kind() {
        let set = ScorerSet::standard(NOW);
        assert!(approx(set.strength(&search(50.0, 25.0, 0)), 0.35));
        assert!(approx(set.strength(&community(100, 50, 0, &["ai"])), 0.2));
        // a scorer for the wrong variant yields 0
        assert_eq!(SearchStrength.strength(&community(100, 50, 0, &["ai"])), 0.0);
        assert_eq!(ScorerSet::new().strength(&search(50.0, 25.0, 0)), 0.0);
    }
}
