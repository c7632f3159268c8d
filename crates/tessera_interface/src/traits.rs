//! Trait definitions for generation backends and their capabilities.

use crate::extract_text;
use async_trait::async_trait;
use tessera_core::{GenerateRequest, GenerateResponse, Input, MediaSource, Message, Role};
use tessera_error::TesseraResult;

/// Core trait that all generation backends must implement.
///
/// This provides the minimal interface for text generation. Additional
/// capabilities are exposed through optional traits.
#[async_trait]
pub trait TextGeneration: Send + Sync {
    /// Generate model output given a multimodal request.
    async fn generate(&self, req: &GenerateRequest) -> TesseraResult<GenerateResponse>;

    /// Provider name (e.g., "groq").
    fn provider_name(&self) -> &'static str;

    /// Model identifier (e.g., "llama-3.3-70b-versatile").
    fn model_name(&self) -> &str;
}

/// Trait for backends that support image inputs (multimodal vision).
#[async_trait]
pub trait VisionAnalysis: TextGeneration {
    /// Model identifier used for vision requests.
    ///
    /// Defaults to the text model; providers with a dedicated vision
    /// model override this.
    fn vision_model_name(&self) -> &str {
        self.model_name()
    }

    /// Analyze an image and answer a prompt about it.
    ///
    /// The default implementation assembles a single user message with the
    /// prompt text and the image URL and extracts the text output.
    ///
    /// # Errors
    ///
    /// Propagates any backend failure from the underlying `generate` call.
    async fn analyze_image(&self, image_url: &str, prompt: &str) -> TesseraResult<String> {
        let request = GenerateRequest::builder()
            .messages(vec![Message {
                role: Role::User,
                content: vec![
                    Input::Text(prompt.to_string()),
                    Input::Image {
                        mime: None,
                        source: MediaSource::Url(image_url.to_string()),
                    },
                ],
            }])
            .model(Some(self.vision_model_name().to_string()))
            .temperature(Some(0.7))
            .max_tokens(Some(1024))
            .build()
            .map_err(|e| {
                tessera_error::BackendError::new(tessera_error::BackendErrorKind::Malformed(
                    format!("Failed to build vision request: {}", e),
                ))
            })?;

        let response = self.generate(&request).await?;
        extract_text(&response)
    }
}
