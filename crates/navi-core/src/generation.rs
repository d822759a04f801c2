//! Generator contract.
//!
//! [`Generator`] is the seam to the external text-generation service. Like
//! [`Embedder`](crate::embedding::Embedder), implementations make one
//! logical request; retries and timeouts belong to the transport layer in
//! the app crate.

use async_trait::async_trait;

use crate::error::NaviError;
use crate::prompt::Prompt;

/// Maps a prompt to natural-language answer text.
#[async_trait]
pub trait Generator: Send + Sync {
    /// Model identifier (e.g. `"gemini-2.5-flash"`).
    fn model_name(&self) -> &str;

    /// Generate an answer.
    ///
    /// Fails with [`NaviError::GenerationUnavailable`] on transport error,
    /// timeout, or an empty or malformed response.
    async fn generate(&self, prompt: &Prompt) -> Result<String, NaviError>;
}

/// Normalize provider output, treating blank text as a failed generation.
pub fn non_empty_answer(text: &str) -> Result<String, NaviError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(NaviError::GenerationUnavailable(
            "empty response from generation service".into(),
        ));
    }
    Ok(trimmed.to_string())
}
