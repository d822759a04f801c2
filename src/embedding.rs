//! HTTP embedding adapters.
//!
//! Implements [`navi_core::embedding::Embedder`] for hosted and local
//! embedding services:
//! - **[`HttpEmbedder`]** calls Gemini, OpenAI, or Ollama with retry and backoff.
//! - **[`DisabledEmbedder`]** always fails; used when `embedding.provider = "disabled"`.
//!
//! # Provider Endpoints
//!
//! | Provider | Endpoint | Vector Path |
//! |----------|----------|-------------|
//! | Gemini | `POST /v1beta/models/{model}:embedContent` | `embedding.values` |
//! | OpenAI | `POST /v1/embeddings` | `data[0].embedding` |
//! | Ollama | `POST /api/embed` | `embeddings[0]` |
//!
//! Every returned vector is checked against the configured `dims`; a
//! response of any other length is treated as a malformed response.
//!
//! ```rust,no_run
//! # use navi::config::EmbeddingConfig;
//! # use navi::embedding::create_embedder;
//! # use navi_core::embedding::Embedder;
//! let config = EmbeddingConfig::default(); // provider = "disabled"
//! let embedder = create_embedder(&config).unwrap();
//! assert_eq!(embedder.model_name(), "disabled");
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use navi_core::embedding::{check_embedding, Embedder};
use navi_core::NaviError;

use crate::config::EmbeddingConfig;
use crate::provider::Provider;
use crate::transport::{http_client, send_json, RetryPolicy, TransportError};

// ============ HTTP Embedder ============

pub struct HttpEmbedder {
    provider: Provider,
    model: String,
    dims: usize,
    base_url: String,
    api_key: Option<String>,
    client: reqwest::Client,
    policy: RetryPolicy,
}

impl HttpEmbedder {
    /// Build an embedder with an explicit API key.
    ///
    /// `url` overrides the provider's default base URL.
    pub fn new(
        provider: Provider,
        model: impl Into<String>,
        dims: usize,
        url: Option<&str>,
        api_key: Option<String>,
        policy: RetryPolicy,
    ) -> Result<Self> {
        Ok(Self {
            provider,
            model: model.into(),
            dims,
            base_url: provider.base_url(url),
            api_key,
            client: http_client(policy.attempt_timeout)?,
            policy,
        })
    }

    /// Build an embedder from config, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if `model` or `dims` is missing, or if the
    /// provider's API key variable is not set.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let provider = Provider::parse(&config.provider)?;
        let model = config
            .model
            .clone()
            .with_context(|| {
                format!("embedding.model required for {} provider", provider.service())
            })?;
        let dims = config
            .dims
            .with_context(|| {
                format!("embedding.dims required for {} provider", provider.service())
            })?;
        let api_key = provider.api_key_from_env()?;

        Self::new(
            provider,
            model,
            dims,
            config.url.as_deref(),
            api_key,
            config.retry_policy(),
        )
    }

    fn endpoint(&self) -> String {
        match self.provider {
            Provider::Gemini => {
                format!("{}/v1beta/models/{}:embedContent", self.base_url, self.model)
            }
            Provider::OpenAi => format!("{}/v1/embeddings", self.base_url),
            Provider::Ollama => format!("{}/api/embed", self.base_url),
        }
    }

    fn request_body(&self, text: &str) -> Value {
        match self.provider {
            Provider::Gemini => json!({
                "model": format!("models/{}", self.model),
                "content": { "parts": [{ "text": text }] },
            }),
            Provider::OpenAi | Provider::Ollama => json!({
                "model": self.model,
                "input": text,
            }),
        }
    }

    async fn request_once(&self, text: &str) -> Result<Vec<f32>, TransportError> {
        let service = self.provider.service();
        let request = self
            .client
            .post(self.endpoint())
            .header("Content-Type", "application/json")
            .json(&self.request_body(text));
        let request = self.provider.authorize(request, self.api_key.as_deref());

        let json = send_json(service, request).await?;
        parse_embedding_response(self.provider, &json)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    fn model_name(&self) -> &str {
        &self.model
    }

    fn dims(&self) -> usize {
        self.dims
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, NaviError> {
        let service = self.provider.service();
        debug!(service, model = %self.model, chars = text.len(), "embedding");

        let vector = self
            .policy
            .run(service, || self.request_once(text))
            .await
            .map_err(|e| NaviError::EmbeddingUnavailable(e.to_string()))?;

        check_embedding(&vector, self.dims)?;
        Ok(vector)
    }
}

/// Extract the single embedding vector from a provider response.
fn parse_embedding_response(provider: Provider, json: &Value) -> Result<Vec<f32>, TransportError> {
    let service = provider.service();
    let values = match provider {
        Provider::Gemini => json.pointer("/embedding/values"),
        Provider::OpenAi => json.pointer("/data/0/embedding"),
        Provider::Ollama => json.pointer("/embeddings/0"),
    };
    f32_array(service, values)
}

fn f32_array(service: &'static str, value: Option<&Value>) -> Result<Vec<f32>, TransportError> {
    let items = value
        .and_then(|v| v.as_array())
        .ok_or_else(|| TransportError::malformed(service, "missing embedding array"))?;

    items
        .iter()
        .map(|v| {
            v.as_f64()
                .map(|f| f as f32)
                .ok_or_else(|| TransportError::malformed(service, "non-numeric embedding value"))
        })
        .collect()
}

// ============ Disabled Embedder ============

/// Always fails; the pipeline degrades every question to `retrieval_failed`.
pub struct DisabledEmbedder;

#[async_trait]
impl Embedder for DisabledEmbedder {
    fn model_name(&self) -> &str {
        "disabled"
    }

    fn dims(&self) -> usize {
        0
    }

    async fn embed(&self, _text: &str) -> Result<Vec<f32>, NaviError> {
        Err(NaviError::EmbeddingUnavailable(
            "embedding provider is disabled".into(),
        ))
    }
}

/// Create the [`Embedder`] named by `embedding.provider`.
pub fn create_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn Embedder>> {
    if !config.is_enabled() {
        return Ok(Arc::new(DisabledEmbedder));
    }
    Ok(Arc::new(HttpEmbedder::from_config(config)?))
}
