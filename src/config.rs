use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub review: ReviewConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    /// SQLite database holding the review vector index.
    pub db_path: PathBuf,
    /// Root directory for single-user report trees.
    #[serde(default = "default_data_root")]
    pub data_root: PathBuf,
    /// Root directory for per-user report trees and `users.json`.
    #[serde(default = "default_user_root")]
    pub user_root: PathBuf,
    /// Directory repositories are cloned into.
    #[serde(default = "default_clone_dir")]
    pub clone_dir: PathBuf,
}

fn default_data_root() -> PathBuf {
    PathBuf::from("data/reports")
}
fn default_user_root() -> PathBuf {
    PathBuf::from("user_data")
}
fn default_clone_dir() -> PathBuf {
    PathBuf::from("cloned_projects")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReviewConfig {
    /// File name suffixes eligible for review (case-sensitive match).
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Hard cap on characters of file content sent to the model.
    #[serde(default = "default_max_content_chars")]
    pub max_content_chars: usize,
    /// Wall-clock budget for a single generation call, in seconds.
    #[serde(default = "default_per_call_timeout_secs")]
    pub per_call_timeout_secs: u64,
    /// Prompt template; `{file}` and `{code}` are interpolated per file.
    #[serde(default = "default_prompt_template")]
    pub prompt_template: String,
}

impl Default for ReviewConfig {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            max_content_chars: default_max_content_chars(),
            per_call_timeout_secs: default_per_call_timeout_secs(),
            prompt_template: default_prompt_template(),
        }
    }
}

fn default_extensions() -> Vec<String> {
    vec![
        ".py".to_string(),
        ".java".to_string(),
        ".xml".to_string(),
        ".yml".to_string(),
    ]
}
fn default_max_content_chars() -> usize {
    3000
}
fn default_per_call_timeout_secs() -> u64 {
    120
}
fn default_prompt_template() -> String {
    "Please review the following code and highlight issues based on clean code, \
     best practices, and design principles.\n\nFile: {file}\n\n{code}"
        .to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LlmConfig {
    /// Base URL of the Ollama server, e.g. `http://localhost:11434`.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Model name passed to `/api/generate`.
    pub model: String,
    /// Transport-level timeout for the HTTP call, in seconds. The
    /// per-file budget in `[review]` is enforced separately.
    #[serde(default = "default_llm_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:11434".to_string()
}
fn default_llm_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    /// `"ollama"` or `"disabled"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_embed_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "disabled".to_string(),
            base_url: default_base_url(),
            model: None,
            dims: None,
            max_retries: default_max_retries(),
            timeout_secs: default_embed_timeout_secs(),
        }
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_max_retries() -> u32 {
    5
}
fn default_embed_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub bind: String,
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    // Validate review settings
    if config.review.extensions.is_empty() {
        anyhow::bail!("review.extensions must not be empty");
    }
    if config.review.max_content_chars == 0 {
        anyhow::bail!("review.max_content_chars must be > 0");
    }
    if config.review.per_call_timeout_secs == 0 {
        anyhow::bail!("review.per_call_timeout_secs must be > 0");
    }
    if !config.review.prompt_template.contains("{code}") {
        anyhow::bail!("review.prompt_template must contain a {{code}} placeholder");
    }

    // Validate llm
    if config.llm.model.trim().is_empty() {
        anyhow::bail!("llm.model must be set");
    }

    // Validate embedding
    if config.embedding.is_enabled() {
        if config.embedding.dims.is_none() || config.embedding.dims == Some(0) {
            anyhow::bail!(
                "embedding.dims must be > 0 when provider is '{}'",
                config.embedding.provider
            );
        }
        if config.embedding.model.is_none() {
            anyhow::bail!(
                "embedding.model must be specified when provider is '{}'",
                config.embedding.provider
            );
        }
    }

    match config.embedding.provider.as_str() {
        "disabled" | "ollama" => {}
        other => anyhow::bail!(
            "Unknown embedding provider: '{}'. Must be disabled or ollama.",
            other
        ),
    }

    Ok(config)
}
