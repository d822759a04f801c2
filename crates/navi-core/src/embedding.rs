//! Embedder contract and vector utilities.
//!
//! [`Embedder`] is the seam to the external embedding service. Concrete
//! HTTP providers (Gemini, OpenAI, Ollama) live in the `navi` app crate,
//! wrapped in its transport layer for timeouts and retries. Implementations
//! of this trait make exactly one logical request and never retry.
//!
//! The free functions here are pure helpers shared by every store.

use async_trait::async_trait;

use crate::error::NaviError;

/// Maps text to a fixed-length vector.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model identifier (e.g. `"text-embedding-004"`).
    fn model_name(&self) -> &str;

    /// Output dimensionality `D`.
    fn dims(&self) -> usize;

    /// Embed one text.
    ///
    /// Fails with [`NaviError::EmbeddingUnavailable`] on transport error,
    /// timeout, or a malformed response.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, NaviError>;
}

/// Encode a vector as little-endian `f32` bytes for BLOB storage.
///
/// ```rust
/// use navi_core::embedding::{blob_to_vec, vec_to_blob};
///
/// let v = vec![0.5f32, -1.25];
/// let blob = vec_to_blob(&v);
/// assert_eq!(blob.len(), 8);
/// assert_eq!(blob_to_vec(&blob), v);
/// ```
pub fn vec_to_blob(vec: &[f32]) -> Vec<u8> {
    vec.iter().flat_map(|v| v.to_le_bytes()).collect()
}

/// Decode a BLOB written by [`vec_to_blob`]. Trailing bytes that do not
/// form a whole `f32` are ignored.
pub fn blob_to_vec(blob: &[u8]) -> Vec<f32> {
    blob.chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

/// Cosine similarity in `[-1.0, 1.0]`.
///
/// Callers must pass equal-length vectors; stores check dimensionality
/// before scoring. A zero-magnitude vector scores `0.0` against anything.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (x, y) in a.iter().zip(b.iter()) {
        let (x, y) = (*x as f64, *y as f64);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < f64::EPSILON {
        return 0.0;
    }
    (dot / denom).clamp(-1.0, 1.0) as f32
}

/// Reject a provider response whose length differs from the configured
/// dimensionality or that contains non-finite values.
pub fn check_embedding(vector: &[f32], expected_dims: usize) -> Result<(), NaviError> {
    if vector.len() != expected_dims {
        return Err(NaviError::EmbeddingUnavailable(format!(
            "malformed response: expected {} dimensions, got {}",
            expected_dims,
            vector.len()
        )));
    }
    if vector.iter().any(|v| !v.is_finite()) {
        return Err(NaviError::EmbeddingUnavailable(
            "malformed response: non-finite embedding value".into(),
        ));
    }
    Ok(())
}
