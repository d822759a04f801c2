//! Data types that flow through the answering pipeline.
//!
//! [`KnowledgeEntry`] records are owned by a [`VectorStore`](crate::store::VectorStore)
//! and never mutated by the retrieval path. [`Query`], [`RetrievalResult`],
//! and [`AnswerOutcome`] are per-request values.

use std::fmt;

use serde::Serialize;

use crate::error::NaviError;

/// Category used when a message carries no scope annotation.
pub const GENERAL_CATEGORY: &str = "General";

/// An immutable unit of indexed knowledge.
#[derive(Debug, Clone, PartialEq)]
pub struct KnowledgeEntry {
    pub content: String,
    pub embedding: Vec<f32>,
    pub category: String,
}

impl KnowledgeEntry {
    pub fn new(
        content: impl Into<String>,
        embedding: Vec<f32>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            content: content.into(),
            embedding,
            category: category.into(),
        }
    }

    /// Dimensionality of the stored embedding.
    pub fn dims(&self) -> usize {
        self.embedding.len()
    }

    /// Checks the invariants a store relies on before accepting the entry.
    pub fn validate(&self) -> Result<(), NaviError> {
        if self.content.trim().is_empty() {
            return Err(NaviError::InvalidEntry("content must not be empty".into()));
        }
        if self.embedding.is_empty() {
            return Err(NaviError::InvalidEntry("embedding must not be empty".into()));
        }
        if self.embedding.iter().any(|v| !v.is_finite()) {
            return Err(NaviError::InvalidEntry(
                "embedding contains non-finite values".into(),
            ));
        }
        Ok(())
    }
}

/// A parsed, validated question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Message as received, annotation included.
    pub raw_message: String,
    /// Resolved scope.
    pub category: String,
    /// Message with the annotation removed and surrounding whitespace trimmed.
    pub clean_message: String,
}

impl Query {
    /// Builds a query from a structured category instead of an inline tag.
    ///
    /// A `[Context: …]` tag in `message` is still cut out of the question,
    /// but `category` replaces whatever scope it named.
    ///
    /// Fails with [`NaviError::InvalidQuery`] when `message` is blank once
    /// the tag is removed.
    pub fn scoped(category: impl Into<String>, message: &str) -> Result<Self, NaviError> {
        let parsed = crate::context_tag::parse(message)?;
        Ok(Self {
            category: category.into(),
            ..parsed
        })
    }
}

/// A knowledge entry paired with its cosine similarity to the query.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredEntry {
    pub entry: KnowledgeEntry,
    pub score: f32,
}

/// Ranked matches for one query, best first.
///
/// Empty is a normal result meaning "no grounding available".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalResult {
    matches: Vec<ScoredEntry>,
}

impl RetrievalResult {
    /// Wraps matches that are already filtered, ranked, and truncated.
    pub fn from_ranked(matches: Vec<ScoredEntry>) -> Self {
        Self { matches }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }

    pub fn len(&self) -> usize {
        self.matches.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoredEntry> {
        self.matches.iter()
    }

    /// Entry contents in rank order.
    pub fn contents(&self) -> impl Iterator<Item = &str> {
        self.matches.iter().map(|m| m.entry.content.as_str())
    }
}

impl<'a> IntoIterator for &'a RetrievalResult {
    type Item = &'a ScoredEntry;
    type IntoIter = std::slice::Iter<'a, ScoredEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.matches.iter()
    }
}

/// Machine-checkable class of a degraded answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    InvalidQuery,
    RetrievalFailed,
    GenerationFailed,
}

impl DegradeReason {
    /// Stable wire code.
    pub fn code(self) -> &'static str {
        match self {
            DegradeReason::InvalidQuery => "invalid_query",
            DegradeReason::RetrievalFailed => "retrieval_failed",
            DegradeReason::GenerationFailed => "generation_failed",
        }
    }

    /// User-facing sentence returned in place of a generated answer.
    pub fn fallback_text(self) -> &'static str {
        match self {
            DegradeReason::InvalidQuery => "Please enter a question.",
            DegradeReason::RetrievalFailed => "I can't reach the knowledge base right now.",
            DegradeReason::GenerationFailed => {
                "I can't generate a response right now. Please try again."
            }
        }
    }
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of answering one question. Exactly one variant is populated.
#[derive(Debug, Clone, PartialEq)]
pub enum AnswerOutcome {
    Answered { text: String },
    Degraded { reason: DegradeReason, fallback: String },
}

impl AnswerOutcome {
    pub fn degraded(reason: DegradeReason) -> Self {
        AnswerOutcome::Degraded {
            reason,
            fallback: reason.fallback_text().to_string(),
        }
    }

    /// The text to show the user, whichever variant this is.
    pub fn reply(&self) -> &str {
        match self {
            AnswerOutcome::Answered { text } => text,
            AnswerOutcome::Degraded { fallback, .. } => fallback,
        }
    }

    pub fn reason(&self) -> Option<DegradeReason> {
        match self {
            AnswerOutcome::Answered { .. } => None,
            AnswerOutcome::Degraded { reason, .. } => Some(*reason),
        }
    }

    pub fn is_answered(&self) -> bool {
        matches!(self, AnswerOutcome::Answered { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scoped_query_trims() {
        let q = Query::scoped("Library", "  opening hours?  ").unwrap();
        assert_eq!(q.category, "Library");
        assert_eq!(q.clean_message, "opening hours?");
        assert_eq!(q.raw_message, "  opening hours?  ");
    }

    #[test]
    fn test_scoped_query_rejects_blank() {
        assert_eq!(Query::scoped("Library", " \n\t "), Err(NaviError::InvalidQuery));
    }

    #[test]
    fn test_scoped_query_strips_inline_tag() {
        let q = Query::scoped("General", "[Context: Library] library hours?").unwrap();
        assert_eq!(q.category, "General");
        assert_eq!(q.clean_message, "library hours?");
        assert!(!q.clean_message.contains("[Context:"));
        assert_eq!(q.raw_message, "[Context: Library] library hours?");

        assert_eq!(
            Query::scoped("General", "[Context: Library]  "),
            Err(NaviError::InvalidQuery)
        );
    }

    #[test]
    fn test_entry_validation() {
        assert!(KnowledgeEntry::new("ok", vec![1.0], GENERAL_CATEGORY)
            .validate()
            .is_ok());
        assert!(matches!(
            KnowledgeEntry::new("  ", vec![1.0], GENERAL_CATEGORY).validate(),
            Err(NaviError::InvalidEntry(_))
        ));
        assert!(matches!(
            KnowledgeEntry::new("ok", vec![], GENERAL_CATEGORY).validate(),
            Err(NaviError::InvalidEntry(_))
        ));
        assert!(matches!(
            KnowledgeEntry::new("ok", vec![f32::NAN], GENERAL_CATEGORY).validate(),
            Err(NaviError::InvalidEntry(_))
        ));
    }

    #[test]
    fn test_degraded_outcome_carries_fallback() {
        let outcome = AnswerOutcome::degraded(DegradeReason::RetrievalFailed);
        assert_eq!(outcome.reply(), "I can't reach the knowledge base right now.");
        assert_eq!(outcome.reason(), Some(DegradeReason::RetrievalFailed));
        assert!(!outcome.is_answered());
    }

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(DegradeReason::InvalidQuery.code(), "invalid_query");
        assert_eq!(DegradeReason::RetrievalFailed.code(), "retrieval_failed");
        assert_eq!(DegradeReason::GenerationFailed.code(), "generation_failed");
        assert_eq!(
            serde_json::to_string(&DegradeReason::GenerationFailed).unwrap(),
            "\"generation_failed\""
        );
    }
}
