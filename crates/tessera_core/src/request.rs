//! Request and response types for generation.

use crate::{Message, Output};
use serde::{Deserialize, Serialize};

/// Desired response format for a generation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseFormat {
    /// Free-form text
    #[default]
    Text,
    /// A single JSON object (providers enforce valid JSON output)
    JsonObject,
}

/// Generic generation request (multimodal-safe).
///
/// # Examples
///
/// ```
/// use tessera_core::{GenerateRequest, Message, Role, ResponseFormat};
///
/// let request = GenerateRequest::builder()
///     .messages(vec![Message::text(Role::User, "Hello!")])
///     .max_tokens(Some(100))
///     .temperature(Some(0.7))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.messages.len(), 1);
/// assert_eq!(request.response_format, ResponseFormat::Text);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default, derive_builder::Builder)]
#[builder(default)]
pub struct GenerateRequest {
    /// The conversation messages to send
    pub messages: Vec<Message>,
    /// Maximum number of tokens to generate
    pub max_tokens: Option<u32>,
    /// Sampling temperature (0.0 to 1.0)
    pub temperature: Option<f32>,
    /// Model identifier to use (falls back to the driver default)
    pub model: Option<String>,
    /// Desired response format
    pub response_format: ResponseFormat,
}

impl GenerateRequest {
    /// Start building a request.
    pub fn builder() -> GenerateRequestBuilder {
        GenerateRequestBuilder::default()
    }
}

/// The unified response object.
///
/// # Examples
///
/// ```
/// use tessera_core::{GenerateResponse, Output};
///
/// let response = GenerateResponse {
///     outputs: vec![Output::Text("Hello! How can I help?".to_string())],
/// };
///
/// assert_eq!(response.outputs.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    /// The generated outputs from the model
    pub outputs: Vec<Output>,
}
