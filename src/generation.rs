//! HTTP generation adapters.
//!
//! Implements [`navi_core::generation::Generator`] on top of the same
//! providers as [`crate::embedding`]. The prompt's system part travels in
//! each provider's native slot for system instructions; the user part
//! carries the context block and the question.
//!
//! | Provider | Endpoint | Answer Path |
//! |----------|----------|-------------|
//! | Gemini | `POST /v1beta/models/{model}:generateContent` | `candidates[0].content.parts[*].text` |
//! | OpenAI | `POST /v1/chat/completions` | `choices[0].message.content` |
//! | Ollama | `POST /api/chat` (`stream: false`) | `message.content` |

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use navi_core::generation::{non_empty_answer, Generator};
use navi_core::prompt::Prompt;
use navi_core::NaviError;

use crate::config::GenerationConfig;
use crate::provider::Provider;
use crate::transport::{http_client, send_json, RetryPolicy, TransportError};

pub struct HttpGenerator {
    provider: Provider,
    model: String,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpGenerator {
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        url: Option<&str>,
        api_key: Option<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            model: model.into(),
            base_url: provider.base_url(url),
            api_key,
            client: http_client(policy.attempt_timeout)?,
            policy,
        })
    }

    pub fn from_config(config: &GenerationConfig) -> Result<Self> {
        let provider = Provider::parse(&config.provider)?;
        let model = config.model.clone().with_context(|| {
            format!("generation.model required for {} provider", provider.service())
        })?;
        let api_key = provider.api_key_from_env()?;

        Self::new(
            provider,
            model,
            config.url.as_deref(),
            api_key,
            config.retry_policy(),
        )
    }

    fn endpoint(&self) -> String {
        match self.provider {
            Provider::Gemini => format!(
                "{}/v1beta/models/{}:generateContent",
                self.base_url, self.model
            ),
            Provider::OpenAi => format!("{}/v1/chat/completions", self.base_url),
            Provider::Ollama => format!("{}/api/chat", self.base_url),
        }
    }

    fn request_body(&self, prompt: &Prompt) -> Value {
        match self.provider {
            Provider::Gemini => json!({
                "systemInstruction": { "parts": [{ "text": prompt.system }] },
                "contents": [{ "role": "user", "parts": [{ "text": prompt.user }] }],
            }),
            Provider::OpenAi => json!({
                "model": self.model,
                "messages": chat_messages(prompt),
            }),
            Provider::Ollama => json!({
                "model": self.model,
                "messages": chat_messages(prompt),
                "stream": false,
            }),
        }
    }

    async fn request_once(&self, prompt: &Prompt) -> Result<String, TransportError> {
        let service = self.provider.service();
        let request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&self.request_body(prompt));
        let request = self.provider.authorize(request, self.api_key.as_deref());

        let json = send_json(service, request).await?;
        parse_generation_response(self.provider, &json)
    }
}

fn chat_messages(prompt: &Prompt) -> Value {
    json!([
        { "role": "system", "content": prompt.system },
        { "role": "user", "content": prompt.user },
    ])
}

#[async_trait]
impl Generator for HttpGenerator {
    fn model_name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<String, NaviError> {
        let service = self.provider.service();
        debug!(service, model = %self.model, "generating");

        let text = self
            .policy
            .run(service, || self.request_once(prompt))
            .await
            .map_err(|e| NaviError::GenerationUnavailable(e.to_string()))?;

        non_empty_answer(&text)
    }
}

fn parse_generation_response(provider: Provider, json: &Value) -> Result<String, TransportError> {
    let service = provider.service();
    let missing = || TransportError::malformed(service, "missing answer text");

    match provider {
        Provider::Gemini => {
            let parts = json
                .pointer("/candidates/0/content/parts")
                .and_then(|p| p.as_array())
                .ok_or_else(missing)?;
            Ok(parts
                .iter()
                .filter_map(|p| p.get("text").and_then(|t| t.as_str()))
                .collect::<Vec<_>>()
                .join(""))
        }
        Provider::OpenAi => json
            .pointer("/choices/0/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(missing),
        Provider::Ollama => json
            .pointer("/message/content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
            .ok_or_else(missing),
    }
}

/// Always fails; every answerable question degrades to `generation_failed`.
pub struct DisabledGenerator;

#[async_trait]
impl Generator for DisabledGenerator {
    fn model_name(&self) -> &str {
        "disabled"
    }

    async fn generate(&self, _prompt: &Prompt) -> Result<String, NaviError> {
        Err(NaviError::GenerationUnavailable(
            "generation provider is disabled".into(),
        ))
    }
}

/// Create the [`Generator`] named by `generation.provider`.
pub fn create_generator(config: &GenerationConfig) -> Result<Arc<dyn Generator>> {
    if !config.is_enabled() {
        return Ok(Arc::new(DisabledGenerator));
    }
    Ok(Arc::new(HttpGenerator::from_config(config)?))
}
