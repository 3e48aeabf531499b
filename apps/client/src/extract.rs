//! Content extraction — normalizes raw model text before display.
//!
//! Two independent pure transforms:
//! - [`strip_reasoning_markup`] removes `<think>...</think>` spans that some
//!   models leak into their output.
//! - [`recover_structured_answer`] recovers a `{final_email, reasoning}`
//!   object when the aggregator wrapped its answer in a fenced JSON block
//!   instead of returning plain text.

use regex::Regex;
use serde::Deserialize;
use std::sync::LazyLock;

/// Matches `<think>...</think>` spans non-greedily, case-insensitively,
/// across newlines.
static THINK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<think>.*?</think>").expect("valid regex"));

/// Removes every reasoning span (tags included) and trims the result.
/// Input with no spans is returned trimmed and otherwise unchanged.
pub fn strip_reasoning_markup(text: &str) -> String {
    THINK_SPAN.replace_all(text, "").trim().to_string()
}

/// Result of attempting to recover a structured answer from model output.
///
/// `was_structured` is an explicit branch, not an error: plain-text answers
/// are the common case and flow through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StructuredAnswer {
    pub email: String,
    pub reasoning: Option<String>,
    pub was_structured: bool,
}

#[derive(Debug, Deserialize)]
struct FencedAnswer {
    final_email: Option<String>,
    reasoning: Option<String>,
}

/// Strips a leading ```` ```json ```` (or bare) fence and a trailing fence,
/// then attempts to decode the remainder as `{final_email, reasoning}`.
/// Decode failure falls back to the fence-stripped text; this never errors.
pub fn recover_structured_answer(text: &str) -> StructuredAnswer {
    let stripped = strip_code_fences(text);

    match serde_json::from_str::<FencedAnswer>(stripped) {
        Ok(parsed) => StructuredAnswer {
            email: parsed
                .final_email
                .unwrap_or_else(|| stripped.to_string()),
            reasoning: parsed.reasoning,
            was_structured: true,
        },
        Err(_) => StructuredAnswer {
            email: stripped.to_string(),
            reasoning: None,
            was_structured: false,
        },
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
