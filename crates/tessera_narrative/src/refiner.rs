//! Two-stage vision-grounded text refinement.
//!
//! Stage 1 grounds a response in the image and surrounding text context.
//! Stage 2 conditionally rewrites that raw response into literary prose,
//! triggered by a length/keyword heuristic. Stage 1 failures degrade to
//! a text-only call, then to a static apology; Stage 2 failures are
//! never fatal.

use crate::extraction::{extract_json, parse_json};
use crate::prompts;
use serde::Deserialize;
use std::sync::Arc;
use tessera_core::{GenerateRequest, Input, MediaSource, Message, ResponseFormat, Role};
use tessera_error::{BackendError, BackendErrorKind, TesseraResult};
use tessera_interface::{extract_text, VisionAnalysis};
use tracing::{debug, instrument, warn};

/// Static response when both refinement stages are unreachable.
pub const APOLOGY: &str = "Sorry, I encountered an error. Please try again.";

/// Stage 1 responses longer than this get the literary pass.
const LITERARY_LENGTH_THRESHOLD: usize = 150;

/// Requests containing any of these words get the literary pass
/// regardless of response length.
const NARRATIVE_KEYWORDS: &[&str] = &["story", "describe", "narrative", "elaborate"];

/// How many trailing conversation messages are included as context.
const HISTORY_WINDOW: usize = 10;

/// Kind of prose suggestion to generate from existing text blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProseKind {
    /// A short, elegant piece (2-3 paragraphs)
    ShortProse,
    /// A longer story (4-6 paragraphs)
    Story,
}

impl ProseKind {
    fn task_instruction(self) -> &'static str {
        match self {
            Self::ShortProse => {
                "Write a short, elegant prose piece (2-3 paragraphs) that expands or refines \
                 the existing content. Focus on vivid imagery and concise storytelling."
            }
            Self::Story => {
                "Write a longer, engaging story (4-6 paragraphs) that builds upon the existing \
                 content. Include character development, narrative arc, and compelling details."
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct Rewritten {
    rewritten: String,
}

#[derive(Debug, Deserialize)]
struct Suggestion {
    suggestion: String,
}

/// Refines raw vision/text answers into polished responses.
pub struct Refiner<D: VisionAnalysis> {
    driver: Arc<D>,
}

impl<D: VisionAnalysis> Refiner<D> {
    /// Create a refiner over the given driver.
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Answer a user message about an image, grounded in existing text.
    ///
    /// Never fails: backend errors degrade through the text-only
    /// fallback to [`APOLOGY`].
    #[instrument(skip_all, fields(message_len = user_message.len(), history_len = history.len()))]
    pub async fn respond(
        &self,
        image_url: &str,
        text_blocks: &[tessera_store::TextBlock],
        user_message: &str,
        history: &[Message],
    ) -> String {
        let blocks_context = blocks_context(text_blocks);
        let conversation = conversation_context(history);

        let raw = match self
            .stage_one(image_url, &blocks_context, &conversation, user_message)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Vision grounding failed, falling back to text-only");
                match self
                    .text_fallback(&blocks_context, &conversation, user_message)
                    .await
                {
                    Ok(raw) => raw,
                    Err(e) => {
                        warn!(error = %e, "Text-only fallback failed");
                        return APOLOGY.to_string();
                    }
                }
            }
        };

        if !needs_literary_pass(&raw, user_message) {
            return raw;
        }

        match self.literary_pass(&raw).await {
            Ok(refined) => refined,
            Err(e) => {
                // Refinement is best-effort; the grounded answer stands.
                warn!(error = %e, "Literary pass failed, returning raw response");
                raw
            }
        }
    }

    /// Stage 1: vision-grounded response.
    async fn stage_one(
        &self,
        image_url: &str,
        blocks_context: &str,
        conversation: &str,
        user_message: &str,
    ) -> TesseraResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::text(Role::System, prompts::VISION_CHAT_SYSTEM),
                Message {
                    role: Role::User,
                    content: vec![
                        Input::Image {
                            mime: None,
                            source: MediaSource::Url(image_url.to_string()),
                        },
                        Input::Text(prompts::vision_chat(
                            blocks_context,
                            conversation,
                            user_message,
                        )),
                    ],
                },
            ])
            .model(Some(self.driver.vision_model_name().to_string()))
            .temperature(Some(0.7))
            .max_tokens(Some(2000))
            .build()
            .map_err(build_error)?;

        let response = self.driver.generate(&request).await?;
        extract_text(&response)
    }

    /// Stage 1 fallback: same context, no visual grounding.
    async fn text_fallback(
        &self,
        blocks_context: &str,
        conversation: &str,
        user_message: &str,
    ) -> TesseraResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::text(
                    Role::System,
                    "You are a creative writing assistant helping with prose and storytelling.",
                ),
                Message::text(
                    Role::User,
                    prompts::text_chat(blocks_context, conversation, user_message),
                ),
            ])
            .max_tokens(Some(2000))
            .build()
            .map_err(build_error)?;

        let response = self.driver.generate(&request).await?;
        extract_text(&response)
    }

    /// Stage 2: rewrite into sensorily rich prose.
    async fn literary_pass(&self, raw: &str) -> TesseraResult<String> {
        debug!(raw_len = raw.len(), "Running literary pass");

        let request = GenerateRequest::builder()
            .messages(vec![Message::text(
                Role::User,
                prompts::literary_rewrite(raw),
            )])
            .temperature(Some(0.8))
            .max_tokens(Some(2000))
            .build()
            .map_err(build_error)?;

        let response = self.driver.generate(&request).await?;
        extract_text(&response)
    }

    /// Rewrite a text block with awareness of its image.
    ///
    /// Returns the original content unchanged on any failure.
    #[instrument(skip_all, fields(block_len = block_content.len()))]
    pub async fn rewrite_block(
        &self,
        image_url: &str,
        block_content: &str,
        instruction: Option<&str>,
    ) -> String {
        let instruction = instruction.filter(|i| !i.trim().is_empty()).unwrap_or(
            "Enhance and improve this text while keeping it synchronized with what's visible \
             in the image.",
        );

        let result: TesseraResult<String> = async {
            let raw = self
                .driver
                .analyze_image(image_url, &prompts::rewrite_block(block_content, instruction))
                .await?;
            let parsed: Rewritten = parse_json(&extract_json(&raw)?)?;
            Ok(parsed.rewritten)
        }
        .await;

        match result {
            Ok(rewritten) if !rewritten.trim().is_empty() => rewritten,
            Ok(_) => block_content.to_string(),
            Err(e) => {
                warn!(error = %e, "Vision rewrite failed, keeping original text");
                block_content.to_string()
            }
        }
    }

    /// Generate a prose suggestion from existing text blocks.
    ///
    /// Degrades to [`APOLOGY`] on backend failure rather than surfacing
    /// an empty error.
    #[instrument(skip_all, fields(block_count = text_blocks.len()))]
    pub async fn suggest_prose(
        &self,
        text_blocks: &[tessera_store::TextBlock],
        kind: ProseKind,
        user_commentary: &str,
    ) -> String {
        let content_text = text_blocks
            .iter()
            .filter(|b| !b.content.trim().is_empty())
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        if content_text.trim().is_empty() {
            return "No text content available to generate suggestions.".to_string();
        }

        let result: TesseraResult<String> = async {
            let request = GenerateRequest::builder()
                .messages(vec![
                    Message::text(Role::System, "You are a helpful assistant that outputs JSON."),
                    Message::text(
                        Role::User,
                        prompts::prose_suggestion(
                            &content_text,
                            kind.task_instruction(),
                            user_commentary,
                        ),
                    ),
                ])
                .response_format(ResponseFormat::JsonObject)
                .build()
                .map_err(build_error)?;

            let response = self.driver.generate(&request).await?;
            let raw = extract_text(&response)?;
            let parsed: Suggestion = parse_json(&extract_json(&raw)?)?;
            Ok(parsed.suggestion)
        }
        .await;

        match result {
            Ok(suggestion) => suggestion,
            Err(e) => {
                warn!(error = %e, "Prose suggestion failed");
                APOLOGY.to_string()
            }
        }
    }
}

fn build_error(e: impl std::fmt::Display) -> BackendError {
    BackendError::new(BackendErrorKind::Malformed(format!(
        "Failed to build request: {}",
        e
    )))
}

fn blocks_context(text_blocks: &[tessera_store::TextBlock]) -> String {
    text_blocks
        .iter()
        .filter(|b| !b.content.trim().is_empty())
        .map(|b| format!("[{}]: {}", b.kind, b.content))
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn conversation_context(history: &[Message]) -> String {
    let start = history.len().saturating_sub(HISTORY_WINDOW);
    history[start..]
        .iter()
        .map(|m| {
            let speaker = match m.role {
                Role::Assistant => "Assistant",
                _ => "User",
            };
            let text = m
                .content
                .iter()
                .filter_map(|input| match input {
                    Input::Text(t) => Some(t.as_str()),
                    Input::Image { .. } => None,
                })
                .collect::<Vec<_>>()
                .join(" ");
            format!("{}: {}", speaker, text)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Whether Stage 2 should run for this response/request pair.
fn needs_literary_pass(raw: &str, user_message: &str) -> bool {
    if raw.chars().count() > LITERARY_LENGTH_THRESHOLD {
        return true;
    }
    let lowered = user_message.to_lowercase();
    NARRATIVE_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn long_responses_trigger_literary_pass() {
        let long = "x".repeat(151);
        assert!(needs_literary_pass(&long, "what color is the sky?"));
    }

    #[test]
    fn short_factual_answers_skip_literary_pass() {
        assert!(!needs_literary_pass("Blue.", "what color is the sky?"));
    }

    #[test]
    fn narrative_keywords_trigger_literary_pass() {
        assert!(needs_literary_pass("Blue.", "Tell me a STORY about the sky"));
        assert!(needs_literary_pass("Blue.", "describe the scene"));
        assert!(needs_literary_pass("Blue.", "please elaborate"));
        assert!(needs_literary_pass("Blue.", "give me a narrative"));
    }

    #[test]
    fn conversation_context_keeps_trailing_window() {
        let history: Vec<Message> = (0..15)
            .map(|i| Message::text(Role::User, format!("msg {}", i)))
            .collect();
        let context = conversation_context(&history);
        assert!(!context.contains("msg 4"));
        assert!(context.contains("msg 5"));
        assert!(context.contains("msg 14"));
    }
}
