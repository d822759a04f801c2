//! Inline category annotations.
//!
//! Clients scope a question by embedding a tag in the message text:
//!
//! ```text
//! [Context: College of Engineering] Where is the dean's office?
//! ```
//!
//! The first `[Context: …]` occurrence anywhere in the message wins. The
//! captured category is kept verbatim and the whole tag is cut out of the
//! question. Messages without a tag are scoped to
//! [`GENERAL_CATEGORY`](crate::models::GENERAL_CATEGORY).
//!
//! ```rust
//! use navi_core::context_tag::parse;
//!
//! let q = parse("[Context: Library] When do you close?").unwrap();
//! assert_eq!(q.category, "Library");
//! assert_eq!(q.clean_message, "When do you close?");
//! ```

use regex::Regex;
use std::sync::LazyLock;

use crate::error::NaviError;
use crate::models::{Query, GENERAL_CATEGORY};

static TAG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\[Context: (.*?)\]").unwrap());

/// Split a raw message into its category scope and the question text.
///
/// Fails with [`NaviError::InvalidQuery`] when nothing but whitespace is
/// left once the tag is removed.
pub fn parse(raw_message: &str) -> Result<Query, NaviError> {
    let (category, remainder) = match TAG_RE.captures(raw_message) {
        Some(caps) => {
            let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
            let category = caps.get(1).map(|m| m.as_str()).unwrap_or_default();
            let mut remainder = String::with_capacity(raw_message.len());
            remainder.push_str(&raw_message[..whole.start]);
            remainder.push_str(&raw_message[whole.end..]);
            (category.to_string(), remainder)
        }
        None => (GENERAL_CATEGORY.to_string(), raw_message.to_string()),
    };

    let clean_message = remainder.trim();
    if clean_message.is_empty() {
        return Err(NaviError::InvalidQuery);
    }

    Ok(Query {
        raw_message: raw_message.to_string(),
        category,
        clean_message: clean_message.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_leading_tag() {
        let q = parse("[Context: College of Engineering] Where is the dean's office?").unwrap();
        assert_eq!(q.category, "College of Engineering");
        assert_eq!(q.clean_message, "Where is the dean's office?");
    }

    #[test]
    fn test_tag_in_the_middle() {
        let q = parse("Where is [Context: Library] the archive?").unwrap();
        assert_eq!(q.category, "Library");
        assert_eq!(q.clean_message, "Where is  the archive?");
        assert!(!q.clean_message.contains("[Context:"));
    }

    #[test]
    fn test_trailing_tag() {
        let q = parse("Where is the gym? [Context: Sports]").unwrap();
        assert_eq!(q.category, "Sports");
        assert_eq!(q.clean_message, "Where is the gym?");
    }

    #[test]
    fn test_no_tag_defaults_to_general() {
        let q = parse("  Library hours?  ").unwrap();
        assert_eq!(q.category, GENERAL_CATEGORY);
        assert_eq!(q.clean_message, "Library hours?");
        assert_eq!(q.raw_message, "  Library hours?  ");
    }

    #[test]
    fn test_category_kept_verbatim() {
        let q = parse("[Context:   spaced  out ] hi").unwrap();
        assert_eq!(q.category, "  spaced  out ");
        assert_eq!(q.clean_message, "hi");
    }

    #[test]
    fn test_only_first_tag_is_consumed() {
        let q = parse("[Context: A] question [Context: B]").unwrap();
        assert_eq!(q.category, "A");
        assert_eq!(q.clean_message, "question [Context: B]");
    }

    #[test]
    fn test_malformed_tag_is_plain_text() {
        let q = parse("[Context:NoSpace] hello").unwrap();
        assert_eq!(q.category, GENERAL_CATEGORY);
        assert_eq!(q.clean_message, "[Context:NoSpace] hello");

        let q = parse("[context: lower] hello").unwrap();
        assert_eq!(q.category, GENERAL_CATEGORY);
    }

    #[test]
    fn test_blank_messages_are_invalid() {
        assert_eq!(parse("   "), Err(NaviError::InvalidQuery));
        assert_eq!(parse(""), Err(NaviError::InvalidQuery));
        assert_eq!(parse("[Context: X]   "), Err(NaviError::InvalidQuery));
        assert_eq!(parse("\n[Context: X]\t"), Err(NaviError::InvalidQuery));
    }

    #[test]
    fn test_tag_does_not_span_lines() {
        let q = parse("[Context: A\nB] hi").unwrap();
        assert_eq!(q.category, GENERAL_CATEGORY);
    }
}
