//! Grounded prompt construction.
//!
//! A [`Prompt`] has two parts. The `system` part carries the persona, the
//! category scoping, the answer-only-from-context rule, and the fallback
//! sentence to use when nothing was retrieved. The `user` part carries the
//! context block and the question:
//!
//! ```text
//! Context:
//! <entry 1>
//!
//! <entry 2>
//!
//! Question: <clean message>
//! ```
//!
//! Assembly is pure: the same query and retrieval result always produce the
//! same prompt.

use crate::models::{Query, RetrievalResult};

pub const DEFAULT_PERSONA: &str = "You are Navi, an AI campus navigator.";

/// Generation input. Providers with a system-instruction slot send the two
/// parts separately; others use [`Prompt::text`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    /// Both parts rendered as one string.
    pub fn text(&self) -> String {
        format!("{}\n\n{}", self.system, self.user)
    }
}

/// Builds prompts under a configurable persona.
#[derive(Debug, Clone)]
pub struct PromptAssembler {
    persona: String,
}

impl PromptAssembler {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
        }
    }

    pub fn assemble(&self, query: &Query, result: &RetrievalResult) -> Prompt {
        let category = &query.category;
        let system = format!(
            "{persona}\n\
             \n\
             CURRENT CONTEXT: You are assisting a member of \"{category}\".\n\
             If they ask about a location, assume they mean within {category} unless the question states otherwise.\n\
             \n\
             Strictly answer based ONLY on the provided Context.\n\
             If the Context is empty, say: \"I don't have information on that specific topic for {category}.\"",
            persona = self.persona,
        );
        let user = format!(
            "Context:\n{}\n\nQuestion: {}",
            context_block(result),
            query.clean_message
        );
        Prompt { system, user }
    }
}

impl Default for PromptAssembler {
    fn default() -> Self {
        Self::new(DEFAULT_PERSONA)
    }
}

/// Retrieved contents in rank order, separated by blank lines. Empty when
/// nothing was retrieved.
pub fn context_block(result: &RetrievalResult) -> String {
    result.contents().collect::<Vec<_>>().join("\n\n")
}
