//! Utilities for extracting structured data from LLM responses.
//!
//! LLM responses often contain JSON wrapped in markdown code blocks or
//! mixed with explanatory text. This module provides robust extraction
//! utilities that handle common response patterns.

use tessera_error::{BackendError, BackendErrorKind, TesseraResult};

/// Extract JSON from a response that may contain markdown or extra text.
///
/// This function tries multiple extraction strategies:
/// 1. Markdown code blocks: ```json ... ```
/// 2. Balanced braces: { ... }
/// 3. Balanced brackets: [ ... ]
///
/// # Errors
///
/// Returns an error if no valid JSON is found in the response.
///
/// # Examples
///
/// ```
/// use tessera_narrative::extract_json;
///
/// let response = "Here's the segmentation:\n\
///     \n\
///     ```json\n\
///     {\"blocks\": []}\n\
///     ```\n";
///
/// let json = extract_json(response).unwrap();
/// assert!(json.contains("blocks"));
/// ```
pub fn extract_json(response: &str) -> TesseraResult<String> {
    // Strategy 1: Extract from markdown code blocks
    if let Some(json) = extract_from_code_block(response, "json") {
        return Ok(json);
    }

    // Strategy 2: Try arrays first (prefer complete structures)
    // Find which appears first in the response
    let bracket_pos = response.find('[');
    let brace_pos = response.find('{');

    match (bracket_pos, brace_pos) {
        (Some(b_pos), Some(c_pos)) if b_pos < c_pos => {
            // Array appears first, try extracting it
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
            // Fall back to object
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
        }
        (Some(_), None) => {
            // Only array
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
        _ => {
            // Object appears first or only object exists
            if let Some(json) = extract_balanced(response, '{', '}') {
                return Ok(json);
            }
            // Fall back to array
            if let Some(json) = extract_balanced(response, '[', ']') {
                return Ok(json);
            }
        }
    }

    tracing::error!(
        response_length = response.len(),
        "No JSON found in LLM response"
    );

    Err(BackendError::new(BackendErrorKind::Malformed(format!(
        "No JSON found in response (length: {})",
        response.len()
    )))
    .into())
}

/// Extract content from markdown code blocks.
///
/// Looks for patterns like:
/// - ```language\n...\n```
/// - ``` ... ``` (no language specified)
fn extract_from_code_block(response: &str, language: &str) -> Option<String> {
    // Pattern: ```language\n...\n```
    let pattern = format!("```{}", language);

    if let Some(start) = response.find(&pattern) {
        let content_start = start + pattern.len();
        if let Some(end) = response[content_start..].find("```") {
            let content = &response[content_start..content_start + end];
            return Some(content.trim().to_string());
        }
        // No closing fence found - likely truncated response
        return Some(response[content_start..].trim().to_string());
    }

    // Try without language specifier
    if let Some(start) = response.find("```") {
        let content_start = start + 3;
        // Skip to next newline (in case there's a language specifier)
        let skip_to = response[content_start..]
            .find('\n')
            .map(|n| content_start + n + 1)
            .unwrap_or(content_start);

        if let Some(end) = response[skip_to..].find("```") {
            let content = &response[skip_to..skip_to + end];
            return Some(content.trim().to_string());
        }
        // No closing fence found - likely truncated response
        return Some(response[skip_to..].trim().to_string());
    }

    None
}

/// Extract content between balanced delimiters.
///
/// Finds the first occurrence of `open` and extracts content up to
/// the matching `close`, handling nesting correctly.
fn extract_balanced(response: &str, open: char, close: char) -> Option<String> {
    let start = response.find(open)?;
    let mut depth = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for (i, ch) in response[start..].char_indices() {
        if escape_next {
            escape_next = false;
            continue;
        }

        match ch {
            '\\' => escape_next = true,
            '"' => in_string = !in_string,
            c if c == open && !in_string => depth += 1,
            c if c == close && !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(response[start..start + i + 1].to_string());
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse and validate JSON, returning a specific type.
///
/// # Errors
///
/// Returns an error if the JSON string cannot be parsed into type `T`.
///
/// # Examples
///
/// ```
/// use tessera_narrative::parse_json;
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct Draft {
///     story: String,
/// }
///
/// let json = r#"{"story": "Once upon a tide"}"#;
/// let draft: Draft = parse_json(json).unwrap();
/// assert_eq!(draft.story, "Once upon a tide");
/// ```
pub fn parse_json<T>(json_str: &str) -> TesseraResult<T>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_str(json_str).map_err(|e| {
        let preview = json_str.chars().take(100).collect::<String>();

        tracing::error!(
            error = %e,
            json_preview = %preview,
            "JSON parsing failed"
        );

        BackendError::new(BackendErrorKind::Malformed(format!(
            "Failed to parse JSON: {} (JSON: {}...)",
            e, preview
        )))
        .into()
    })
}
