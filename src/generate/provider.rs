//! Text providers: the raw "prompt in, text out" call behind the model generator.

use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4000;
const TEMPERATURE: f32 = 0.8;

#[async_trait]
pub trait TextProvider: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String>;
    fn name(&self) -> &'static str;
}

/// Messages API client.
pub struct AnthropicProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: String, model: Option<&str>, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("trend-idea-pipeline/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(timeout)
            .build()
            .context("building http client")?;
        let model = model
            .filter(|m| !m.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
            .to_string();
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl TextProvider for AnthropicProvider {
    async fn complete(&self, prompt: &str) -> Result<String> {
        if self.api_key.is_empty() {
            bail!("no api key configured");
        }

        #[derive(Serialize)]
        struct Msg<'a> {
            role: &'a str,
            content: &'a str,
        }
        #[derive(Serialize)]
        struct Req<'a> {
            model: &'a str,
            max_tokens: u32,
            temperature: f32,
            messages: Vec<Msg<'a>>,
        }
        #[derive(Deserialize)]
        struct Resp {
            content: Vec<Block>,
        }
        #[derive(Deserialize)]
        struct Block {
            #[serde(rename = "type")]
            kind: String,
            #[serde(default)]
            text: String,
        }

        let req = Req {
            model: &self.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
        };

        let resp = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .json(&req)
            .send()
            .await
            .context("messages request")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("messages api returned {status}");
        }
        let body: Resp = resp.json().await.context("decoding messages response")?;
        body.content
            .into_iter()
            .find(|b| b.kind == "text")
            .map(|b| b.text)
            .ok_or_else(|| anyhow!("response had no text block"))
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

/// Returns a fixed response. Used for tests and offline runs.
#[derive(Debug, Clone)]
pub struct MockProvider {
    response: String,
}

impl MockProvider {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
        }
    }

    /// A well-formed idea response.
    pub fn canned() -> Self {
        Self::new(CANNED_RESPONSE)
    }
}

#[async_trait]
impl TextProvider for MockProvider {
    async fn complete(&self, _prompt: &str) -> Result<String> {
        Ok(self.response.clone())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

const CANNED_RESPONSE: &str = r#"{
  "title": "Trend Radar for Solo Builders",
  "description": "A weekly digest that turns rising keywords into ready-to-build app briefs.",
  "whatItIs": "Watches community threads and search interest, then writes short build briefs for the fastest-rising topics.",
  "whyItMatters": "Solo builders lose days picking ideas; a ranked brief removes the guesswork.",
  "toolsYoudUse": ["Claude API", "Supabase", "Vercel"],
  "mvpFeatureSet": ["Keyword watch list", "Weekly digest email", "One-click brief export"],
  "monetizationIdeas": ["Freemium with a premium tier", "Team seats"],
  "buildDifficulty": 2,
  "buildDifficultyReason": "Mostly scheduled jobs and a simple dashboard.",
  "variations": ["Niche editions per industry", "Slack bot delivery"],
  "tweetableSummary": "Stop guessing what to build. Let the trends pick for you."
}"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn canned_mock_response_parses() {
        let text = MockProvider::canned().complete("anything").await.unwrap();
        let content = crate::generate::parse::parse_idea(&text).unwrap();
        assert_eq!(content.build_difficulty, 2);
    }

    #[tokio::test]
    async fn anthropic_without_key_fails_before_any_request() {
        let p = AnthropicProvider::new(String::new(), None, Duration::from_secs(1)).unwrap();
        assert_eq!(p.model(), DEFAULT_MODEL);
        assert!(p.complete("hi").await.is_err());
    }
}
