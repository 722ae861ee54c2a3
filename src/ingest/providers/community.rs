use std::collections::HashMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::ingest::types::{CommunityMetrics, RawSignal, SignalMetrics, SignalSource, SourceKind};

/// Terms a word has to overlap with (either direction) to count as a keyword.
const TECH_TERMS: &[&str] = &[
    "ai", "ml", "api", "saas", "app", "tool", "platform", "automation", "claude", "gpt",
    "openai", "anthropic", "replit", "vercel", "supabase", "react", "next.js", "typescript",
    "python", "javascript", "node.js", "database", "webhook", "integration", "workflow",
    "dashboard", "analytics", "mobile", "ios", "android", "web", "browser", "extension",
    "plugin", "startup", "business", "revenue", "monetize", "subscription", "freemium",
];

static RE_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b\w+\b").expect("word regex"));

/// Post record as delivered by the discussion-site collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityPost {
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub score: i64,
    pub num_comments: i64,
    pub created_utc: i64,
    #[serde(default)]
    pub url: Option<String>,
    pub subreddit: String,
}

/// Lowercased words of `text` that overlap a tech term, first occurrence kept.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut out: Vec<String> = Vec::new();
    for m in RE_WORD.find_iter(&lowered) {
        let word = m.as_str();
        let hit = TECH_TERMS
            .iter()
            .any(|term| term.contains(word) || word.contains(term));
        if hit && !out.iter().any(|w| w == word) {
            out.push(word.to_string());
        }
    }
    out
}

impl CommunityPost {
    pub fn into_signal(self) -> Option<RawSignal> {
        let keywords = extract_keywords(&format!("{} {}", self.title, self.selftext));
        RawSignal::new(
            keywords,
            SignalMetrics::Community(CommunityMetrics {
                upvotes: self.score,
                comments: self.num_comments,
                created_utc: self.created_utc,
                title: self.title,
                community: self.subreddit,
                url: self.url,
            }),
            self.created_utc,
        )
    }
}

pub struct CommunitySource {
    mode: Mode,
    communities: Vec<String>,
    per_community: usize,
}

enum Mode {
    Records(Vec<CommunityPost>),
    File(PathBuf),
}

impl CommunitySource {
    pub fn from_records(posts: Vec<CommunityPost>) -> Self {
        Self {
            mode: Mode::Records(posts),
            communities: Vec::new(),
            per_community: usize::MAX,
        }
    }

    pub fn from_json(s: &str) -> Result<Self> {
        let posts: Vec<CommunityPost> =
            serde_json::from_str(s).context("parsing community posts json")?;
        Ok(Self::from_records(posts))
    }

    /// Reads the file on every `collect`, so a missing file fails only that run's source.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            mode: Mode::File(path.into()),
            communities: Vec::new(),
            per_community: usize::MAX,
        }
    }

    /// Keep only posts from these communities (case-insensitive). Empty keeps all.
    pub fn with_communities(mut self, communities: Vec<String>) -> Self {
        self.communities = communities;
        self
    }

    pub fn with_posts_per_community(mut self, n: usize) -> Self {
        self.per_community = n.max(1);
        self
    }

    fn select(&self, posts: Vec<CommunityPost>) -> Vec<RawSignal> {
        let mut taken: HashMap<String, usize> = HashMap::new();
        let mut out = Vec::new();
        for post in posts {
            let community = post.subreddit.to_lowercase();
            let watched = self.communities.is_empty()
                || self
                    .communities
                    .iter()
                    .any(|c| c.eq_ignore_ascii_case(&post.subreddit));
            if !watched {
                continue;
            }
            let n = taken.entry(community).or_default();
            if *n >= self.per_community {
                continue;
            }
            *n += 1;
            if let Some(sig) = post.into_signal() {
                out.push(sig);
            }
        }
        out
    }
}

#[async_trait]
impl SignalSource for CommunitySource {
    async fn collect(&self) -> Result<Vec<RawSignal>> {
        let posts = match &self.mode {
            Mode::Records(posts) => posts.clone(),
            Mode::File(path) => {
                let body = tokio::fs::read_to_string(path)
                    .await
                    .with_context(|| format!("reading community posts from {}", path.display()))?;
                serde_json::from_str(&body).context("parsing community posts json")?
            }
        };
        Ok(self.select(posts))
    }

    fn kind(&self) -> SourceKind {
        SourceKind::Community
    }

    fn name(&self) -> &str {
        "community"
    }
}
