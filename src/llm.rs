//! Text generation client for the review model.
//!
//! Defines the [`TextGenerator`] trait and the [`OllamaGenerator`]
//! implementation calling a local Ollama server's `/api/generate` endpoint
//! with `{model, prompt, stream: false}` and reading `{response}` back.
//!
//! There is deliberately no retry here: the per-file time budget is owned
//! by the orchestrator, and a failed generation is recorded against the
//! file rather than re-attempted.

use anyhow::{bail, Result};
use async_trait::async_trait;
use std::time::Duration;

use crate::config::LlmConfig;

/// Trait for text generation backends: prompt in, generated text out.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Returns the model identifier (e.g. `"deepseek-r1:1.5b"`).
    fn model_name(&self) -> &str;
    /// Generate text for the given prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;
}

/// Generation client backed by a local Ollama server.
pub struct OllamaGenerator {
    base_url: String,
    model: String,
    client: reqwest::Client,
}

impl OllamaGenerator {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            client,
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
        });

        let response = self.client.post(&url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            bail!("Ollama API error {}: {}", status, body_text);
        }

        let json: serde_json::Value = response.json().await?;
        parse_generate_response(&json)
    }
}

/// Parse the Ollama generate API response JSON.
fn parse_generate_response(json: &serde_json::Value) -> Result<String> {
    let text = json
        .get("response")
        .and_then(|r| r.as_str())
        .ok_or_else(|| anyhow::anyhow!("Invalid Ollama response: missing response field"))?;

    if text.is_empty() {
        bail!("Ollama returned an empty response");
    }

    Ok(text.to_string())
}
