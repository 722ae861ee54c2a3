// src/config/mod.rs
//! Pipeline configuration.
//!
//! Load order:
//! 1) $PIPELINE_CONFIG_PATH
//! 2) config/pipeline.toml
//! 3) config/pipeline.json
//! 4) built-in defaults
//!
//! Every section and field is optional. Out-of-range values fall back to their
//! defaults on load.

mod generation;

pub use generation::{GenerationConfig, ENV_API_KEY};

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::aggregate::{MAX_TRENDS, WEAK_SIGNAL_THRESHOLD};

pub const ENV_CONFIG_PATH: &str = "PIPELINE_CONFIG_PATH";
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline.toml";
const FALLBACK_JSON_PATH: &str = "config/pipeline.json";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub ranking: RankingConfig,
    pub generation: GenerationConfig,
    pub selection: SelectionConfig,
    pub storage: StorageConfig,
    pub sources: SourcesConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankingConfig {
    pub weak_signal_threshold: f64,
    pub max_trends: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            weak_signal_threshold: WEAK_SIGNAL_THRESHOLD,
            max_trends: MAX_TRENDS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionConfig {
    /// How many of the most recent unpublished artifacts compete each day.
    pub candidate_limit: usize,
}

impl Default for SelectionConfig {
    fn default() -> Self {
        Self { candidate_limit: 5 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Process-local; gone when the process exits.
    Memory,
    #[default]
    File,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// JSON store location for the `file` backend.
    pub path: PathBuf,
    pub timeout_secs: u64,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data/ideas.json"),
            timeout_secs: 10,
        }
    }
}

impl StorageConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    /// JSON file of community posts; source disabled when absent.
    pub community_path: Option<PathBuf>,
    /// JSON file of search interest series; source disabled when absent.
    pub search_path: Option<PathBuf>,
    /// Watched communities. Empty keeps every community.
    pub communities: Vec<String>,
    pub posts_per_community: usize,
    /// Search watch list. Empty uses the built-in app-idea keywords.
    pub search_keywords: Vec<String>,
    pub timeout_secs: u64,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            community_path: None,
            search_path: None,
            communities: Vec::new(),
            posts_per_community: 10,
            search_keywords: Vec::new(),
            timeout_secs: 30,
        }
    }
}

impl SourcesConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl PipelineConfig {
    /// Load from an explicit path. TOML unless the extension says JSON.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading pipeline config from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let mut cfg: PipelineConfig = if ext == "json" {
            serde_json::from_str(&content).context("parsing pipeline config json")?
        } else {
            toml::from_str(&content).context("parsing pipeline config toml")?
        };
        cfg.sanitize();
        tracing::info!(target: "pipeline", path = %path.display(), "config loaded");
        Ok(cfg)
    }

    /// Load using env var + fallbacks. Missing files mean defaults; a file that
    /// exists but does not parse is an error.
    pub fn load_default() -> Result<Self> {
        if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                bail!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display());
            }
            return Self::load_from(&pb);
        }
        for candidate in [DEFAULT_CONFIG_PATH, FALLBACK_JSON_PATH] {
            let pb = PathBuf::from(candidate);
            if pb.exists() {
                return Self::load_from(&pb);
            }
        }
        tracing::debug!(target: "pipeline", "no config file; using defaults");
        Ok(Self::default())
    }

    /// `--config` wins over the env/fallback chain.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(p) if p.exists() => Self::load_from(p),
            Some(p) => Err(anyhow!("config file {} does not exist", p.display())),
            None => Self::load_default(),
        }
    }

    fn sanitize(&mut self) {
        let r = &mut self.ranking;
        if !r.weak_signal_threshold.is_finite() || !(0.0..1.0).contains(&r.weak_signal_threshold) {
            r.weak_signal_threshold = WEAK_SIGNAL_THRESHOLD;
        }
        if r.max_trends == 0 {
            r.max_trends = MAX_TRENDS;
        }
        self.generation.sanitize();
        if self.selection.candidate_limit == 0 {
            self.selection.candidate_limit = SelectionConfig::default().candidate_limit;
        }
        if self.storage.timeout_secs == 0 {
            self.storage.timeout_secs = StorageConfig::default().timeout_secs;
        }
        let s = &mut self.sources;
        if s.posts_per_community == 0 {
            s.posts_per_community = SourcesConfig::default().posts_per_community;
        }
        if s.timeout_secs == 0 {
            s.timeout_secs = SourcesConfig::default().timeout_secs;
        }
        s.communities = clean_list(std::mem::take(&mut s.communities));
        s.search_keywords = clean_list(std::mem::take(&mut s.search_keywords));
    }
}

/// Trim, drop blanks, dedup case-insensitively keeping first spelling.
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && seen.insert(s.to_lowercase()))
        .collect()
}
