//! External model providers shared by the embedding and generation adapters.
//!
//! | Config Value | Default Base URL | API Key |
//! |-------------|------------------|---------|
//! | `"gemini"` | `https://generativelanguage.googleapis.com` | `GEMINI_API_KEY` |
//! | `"openai"` | `https://api.openai.com` | `OPENAI_API_KEY` |
//! | `"ollama"` | `http://localhost:11434` | none |
//!
//! `"disabled"` is not a provider; callers check for it before parsing.

use anyhow::{bail, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Gemini,
    OpenAi,
    Ollama,
}

impl Provider {
    pub fn parse(name: &str) -> Result<Self> {
        match name {
            "gemini" => Ok(Provider::Gemini),
            "openai" => Ok(Provider::OpenAi),
            "ollama" => Ok(Provider::Ollama),
            other => bail!("Unknown provider: {}", other),
        }
    }

    pub fn default_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::OpenAi => "https://api.openai.com",
            Provider::Ollama => "http://localhost:11434",
        }
    }

    /// Environment variable holding the API key, if the provider needs one.
    pub fn api_key_var(&self) -> Option<&'static str> {
        match self {
            Provider::Gemini => Some("GEMINI_API_KEY"),
            Provider::OpenAi => Some("OPENAI_API_KEY"),
            Provider::Ollama => None,
        }
    }

    /// Name used in logs and transport errors.
    pub fn service(&self) -> &'static str {
        match self {
            Provider::Gemini => "Gemini",
            Provider::OpenAi => "OpenAI",
            Provider::Ollama => "Ollama",
        }
    }

    /// Read the API key from the environment.
    ///
    /// Fails at construction time so a missing key is reported once at
    /// startup rather than on every question.
    pub fn api_key_from_env(&self) -> Result<Option<String>> {
        match self.api_key_var() {
            Some(var) => match std::env::var(var) {
                Ok(key) if !key.trim().is_empty() => Ok(Some(key)),
                _ => bail!("{} environment variable not set", var),
            },
            None => Ok(None),
        }
    }

    /// Resolve the base URL, trimming a trailing slash from overrides.
    pub fn base_url(&self, url: Option<&str>) -> String {
        url.unwrap_or(self.default_url())
            .trim_end_matches('/')
            .to_string()
    }

    /// Attach provider-specific authentication to a request.
    pub fn authorize(
        &self,
        request: reqwest::RequestBuilder,
        api_key: Option<&str>,
    ) -> reqwest::RequestBuilder {
        match (self, api_key) {
            (Provider::Gemini, Some(key)) => request.header("x-goog-api-key", key),
            (Provider::OpenAi, Some(key)) => request.bearer_auth(key),
            _ => request,
        }
    }
}
