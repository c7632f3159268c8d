//! Long-form narrative generation.
//!
//! Wraps the backend calls that produce the epic draft and its
//! continuations. Generation is best-effort: backend failures degrade to
//! static placeholder text rather than surfacing as pipeline failures,
//! so callers always receive something to segment and persist.

use crate::extraction::{extract_json, parse_json};
use crate::prompts;
use serde::Deserialize;
use std::sync::Arc;
use tessera_core::{GenerateRequest, Message, ResponseFormat, Role};
use tessera_error::{BackendError, BackendErrorKind, TesseraError, TesseraErrorKind, TesseraResult};
use tessera_interface::{extract_text, TextGeneration};
use tracing::{instrument, warn};

const UNCONFIGURED_STORY: &str =
    "Story generation is not configured (missing GROQ_API_KEY).";
const FAILED_STORY: &str = "Story generation failed. Please try again.";

/// A generated epic draft.
#[derive(Debug, Clone, PartialEq)]
pub struct EpicStoryDraft {
    /// The narrative text
    pub story: String,
    /// Title suggested by the backend, if any
    pub title_suggestion: Option<String>,
    /// Themes reported by the backend
    pub themes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StoryPayload {
    story: String,
    #[serde(default)]
    title_suggestion: Option<String>,
    #[serde(default)]
    themes: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ContinuationPayload {
    continuation: String,
}

/// Generates epic narratives and continuations.
pub struct Storyteller<D: TextGeneration> {
    driver: Arc<D>,
}

impl<D: TextGeneration> Storyteller<D> {
    /// Create a storyteller over the given driver.
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Generate a long-form epic story from aggregated post text.
    ///
    /// Never fails: backend errors degrade to placeholder text, and a
    /// response that isn't the requested JSON shape is salvaged as the
    /// story verbatim.
    #[instrument(skip_all, fields(context_len = aggregated_text.len()))]
    pub async fn generate_epic_story(
        &self,
        aggregated_text: &str,
        generation_prompt: &str,
        user_commentary: &str,
        source_tags: &[String],
    ) -> EpicStoryDraft {
        let prompt = prompts::epic_story(
            aggregated_text,
            generation_prompt,
            user_commentary,
            source_tags,
        );

        let raw = match self.generate_json(&prompt, Some(0.8)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Epic story generation failed");
                return EpicStoryDraft {
                    story: degraded_text(&e).to_string(),
                    title_suggestion: None,
                    themes: Vec::new(),
                };
            }
        };

        match extract_json(&raw).and_then(|json| parse_json::<StoryPayload>(&json)) {
            Ok(payload) => EpicStoryDraft {
                story: payload.story,
                title_suggestion: payload
                    .title_suggestion
                    .filter(|t| !t.trim().is_empty()),
                themes: payload.themes,
            },
            Err(e) => {
                // Salvage the raw response as the story body
                warn!(error = %e, "Story payload was not valid JSON, using raw text");
                EpicStoryDraft {
                    story: raw,
                    title_suggestion: None,
                    themes: Vec::new(),
                }
            }
        }
    }

    /// Generate a continuation of an existing story.
    ///
    /// Same degradation policy as [`Self::generate_epic_story`].
    #[instrument(skip_all, fields(existing_len = existing_story.len()))]
    pub async fn complete_epic_story(
        &self,
        existing_story: &str,
        continuation_prompt: &str,
        user_commentary: &str,
    ) -> String {
        let prompt =
            prompts::story_continuation(existing_story, continuation_prompt, user_commentary);

        let raw = match self.generate_json(&prompt, Some(0.8)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Story continuation failed");
                return degraded_text(&e).to_string();
            }
        };

        match extract_json(&raw).and_then(|json| parse_json::<ContinuationPayload>(&json)) {
            Ok(payload) => payload.continuation,
            Err(e) => {
                warn!(error = %e, "Continuation payload was not valid JSON, using raw text");
                raw
            }
        }
    }

    async fn generate_json(&self, prompt: &str, temperature: Option<f32>) -> TesseraResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::text(Role::System, prompts::STORYTELLER_SYSTEM),
                Message::text(Role::User, prompt),
            ])
            .temperature(temperature)
            .response_format(ResponseFormat::JsonObject)
            .build()
            .map_err(|e| {
                BackendError::new(BackendErrorKind::Malformed(format!(
                    "Failed to build request: {}",
                    e
                )))
            })?;

        let response = self.driver.generate(&request).await?;
        extract_text(&response)
    }
}

fn degraded_text(error: &TesseraError) -> &'static str {
    match error.kind() {
        TesseraErrorKind::Backend(BackendError {
            kind: BackendErrorKind::Unavailable,
            ..
        }) => UNCONFIGURED_STORY,
        _ => FAILED_STORY,
    }
}
