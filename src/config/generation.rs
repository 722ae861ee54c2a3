use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Env var read when `api_key = "ENV"`.
pub const ENV_API_KEY: &str = "ANTHROPIC_API_KEY";

fn default_enabled() -> bool {
    true
}
fn default_provider() -> String {
    "anthropic".to_string()
}
fn default_api_key() -> String {
    "ENV".to_string()
}
fn default_top_k() -> usize {
    5
}
/// Floor for the gap between generation calls.
pub const MIN_SPACING_FLOOR_SECS: u64 = 2;

fn default_min_spacing_secs() -> u64 {
    MIN_SPACING_FLOOR_SECS
}
fn default_timeout_secs() -> u64 {
    60
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// "anthropic" | "mock" (case-insensitive)
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    /// "ENV" means: read from ANTHROPIC_API_KEY
    #[serde(default = "default_api_key")]
    pub api_key: String,
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    #[serde(default = "default_min_spacing_secs")]
    pub min_spacing_secs: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            provider: default_provider(),
            model: None,
            api_key: default_api_key(),
            top_k: default_top_k(),
            min_spacing_secs: default_min_spacing_secs(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl GenerationConfig {
    pub(crate) fn sanitize(&mut self) {
        self.provider = self.provider.trim().to_lowercase();
        if self.top_k == 0 {
            self.top_k = default_top_k();
        }
        if self.timeout_secs == 0 {
            self.timeout_secs = default_timeout_secs();
        }
        self.min_spacing_secs = self.min_spacing_secs.max(MIN_SPACING_FLOOR_SECS);
    }

    /// The usable key, if any. "ENV" resolves through `ANTHROPIC_API_KEY`.
    pub fn resolved_api_key(&self) -> Option<String> {
        let raw = self.api_key.trim();
        let key = if raw.eq_ignore_ascii_case("env") {
            env::var(ENV_API_KEY).ok()?
        } else {
            raw.to_string()
        };
        let key = key.trim().to_string();
        (!key.is_empty()).then_some(key)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Never below two seconds, even for a hand-built config.
    pub fn min_spacing(&self) -> Duration {
        Duration::from_secs(self.min_spacing_secs.max(MIN_SPACING_FLOOR_SECS))
    }
}
