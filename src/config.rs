//! TOML configuration.
//!
//! Every section except `[db]` has defaults, so a minimal file is:
//!
//! ```toml
//! [db]
//! path = "./data/navi.sqlite"
//! ```
//!
//! which runs with both external providers disabled: questions are parsed
//! and degraded gracefully, but nothing is embedded or generated.
//!
//! A full example:
//!
//! ```toml
//! [db]
//! path = "./data/navi.sqlite"
//!
//! [retrieval]
//! match_threshold = 0.2
//! match_count = 3
//!
//! [embedding]
//! provider = "gemini"          # gemini | openai | ollama | disabled
//! model = "text-embedding-004"
//! dims = 768
//!
//! [generation]
//! provider = "gemini"
//! model = "gemini-2.5-flash"
//!
//! [prompt]
//! persona = "You are Navi, the AI Campus Navigator."
//!
//! [server]
//! bind = "127.0.0.1:3000"
//! ```

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use navi_core::prompt::{PromptAssembler, DEFAULT_PERSONA};
use navi_core::retrieve::RetrievalParams;

use crate::transport::RetryPolicy;

const PROVIDERS: [&str; 4] = ["disabled", "gemini", "openai", "ollama"];

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
    #[serde(default)]
    pub prompt: PromptConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    /// Minimum cosine similarity for a knowledge entry to count as a match.
    #[serde(default = "default_match_threshold")]
    pub match_threshold: f32,
    /// Maximum number of entries placed in the prompt.
    #[serde(default = "default_match_count")]
    pub match_count: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            match_threshold: default_match_threshold(),
            match_count: default_match_count(),
        }
    }
}

impl RetrievalConfig {
    pub fn params(&self) -> RetrievalParams {
        RetrievalParams {
            threshold: self.match_threshold,
            top_k: self.match_count,
        }
    }
}

fn default_match_threshold() -> f32 {
    0.2
}
fn default_match_count() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub dims: Option<usize>,
    /// Base URL override, mainly for self-hosted or mocked endpoints.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            dims: None,
            url: None,
            timeout_secs: default_embedding_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

impl EmbeddingConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    #[serde(default = "default_provider")]
    pub provider: String,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_generation_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            model: None,
            url: None,
            timeout_secs: default_generation_timeout_secs(),
            max_retries: default_max_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

impl GenerationConfig {
    pub fn is_enabled(&self) -> bool {
        self.provider != "disabled"
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.max_retries,
            Duration::from_millis(self.retry_base_ms),
            Duration::from_secs(self.timeout_secs),
        )
    }
}

fn default_provider() -> String {
    "disabled".to_string()
}
fn default_embedding_timeout_secs() -> u64 {
    30
}
fn default_generation_timeout_secs() -> u64 {
    60
}
fn default_max_retries() -> u32 {
    2
}
fn default_retry_base_ms() -> u64 {
    1000
}

#[derive(Debug, Deserialize, Clone)]
pub struct PromptConfig {
    #[serde(default = "default_persona")]
    pub persona: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            persona: default_persona(),
        }
    }
}

impl PromptConfig {
    pub fn assembler(&self) -> PromptAssembler {
        PromptAssembler::new(self.persona.clone())
    }
}

fn default_persona() -> String {
    DEFAULT_PERSONA.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

impl Config {
    /// Check cross-field rules that serde defaults cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.match_count < 1 {
            bail!("retrieval.match_count must be >= 1");
        }
        if !(-1.0..=1.0).contains(&self.retrieval.match_threshold) {
            bail!("retrieval.match_threshold must be in [-1.0, 1.0]");
        }

        check_provider("embedding", &self.embedding.provider)?;
        check_provider("generation", &self.generation.provider)?;

        if self.embedding.is_enabled() {
            if self.embedding.dims.unwrap_or(0) == 0 {
                bail!(
                    "embedding.dims must be > 0 when provider is '{}'",
                    self.embedding.provider
                );
            }
            if self.embedding.model.is_none() {
                bail!(
                    "embedding.model must be specified when provider is '{}'",
                    self.embedding.provider
                );
            }
        }

        if self.generation.is_enabled() && self.generation.model.is_none() {
            bail!(
                "generation.model must be specified when provider is '{}'",
                self.generation.provider
            );
        }

        if self.embedding.timeout_secs == 0 || self.generation.timeout_secs == 0 {
            bail!("timeout_secs must be > 0");
        }

        Ok(())
    }
}

fn check_provider(section: &str, provider: &str) -> Result<()> {
    if !PROVIDERS.contains(&provider) {
        bail!(
            "Unknown {} provider: '{}'. Must be one of: {}.",
            section,
            provider,
            PROVIDERS.join(", ")
        );
    }
    Ok(())
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &str) -> Result<Config> {
        let content = format!("[db]\npath = \"/tmp/navi.sqlite\"\n{}", extra);
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.retrieval.match_threshold, 0.2);
        assert_eq!(config.retrieval.match_count, 3);
        assert!(!config.embedding.is_enabled());
        assert!(!config.generation.is_enabled());
        assert_eq!(config.prompt.persona, DEFAULT_PERSONA);
        assert_eq!(config.server.bind, "127.0.0.1:3000");
        assert_eq!(config.embedding.timeout_secs, 30);
        assert_eq!(config.generation.timeout_secs, 60);
    }

    #[test]
    fn test_enabled_embedding_requires_dims_and_model() {
        let err = parse("[embedding]\nprovider = \"gemini\"\nmodel = \"text-embedding-004\"\n")
            .unwrap_err();
        assert!(err.to_string().contains("embedding.dims"));

        let err = parse("[embedding]\nprovider = \"openai\"\ndims = 1536\n").unwrap_err();
        assert!(err.to_string().contains("embedding.model"));

        assert!(parse("[embedding]\nprovider = \"ollama\"\nmodel = \"nomic-embed-text\"\ndims = 768\n").is_ok());
    }

    #[test]
    fn test_enabled_generation_requires_model() {
        let err = parse("[generation]\nprovider = \"gemini\"\n").unwrap_err();
        assert!(err.to_string().contains("generation.model"));
    }

    #[test]
    fn test_unknown_provider_rejected() {
        let err = parse("[generation]\nprovider = \"palm\"\nmodel = \"x\"\n").unwrap_err();
        assert!(err.to_string().contains("Unknown generation provider"));
    }

    #[test]
    fn test_retrieval_bounds() {
        assert!(parse("[retrieval]\nmatch_count = 0\n").is_err());
        assert!(parse("[retrieval]\nmatch_threshold = 1.5\n").is_err());
        let config = parse("[retrieval]\nmatch_threshold = -0.5\nmatch_count = 10\n").unwrap();
        assert_eq!(config.retrieval.params().top_k, 10);
        assert_eq!(config.retrieval.params().threshold, -0.5);
    }

    #[test]
    fn test_load_config_reports_missing_file() {
        let err = load_config(Path::new("/nonexistent/navi.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
