//! Groq chat-completions client.

use super::conversion::to_chat_request;
use super::dto::{ChatRequest, ChatResponse};
use crate::GroqConfig;
use async_trait::async_trait;
use tessera_core::{GenerateRequest, GenerateResponse, Output};
use tessera_error::{BackendError, BackendErrorKind, ConfigError, TesseraResult};
use tessera_interface::{TextGeneration, VisionAnalysis};
use tokio_retry2::strategy::{ExponentialBackoff, jitter};
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

/// Groq LPU inference client speaking the OpenAI-compatible protocol.
///
/// Transient failures (429, 5xx, transport errors, timeouts) are retried
/// a bounded number of times with jittered exponential backoff; every
/// request is bounded by the configured timeout.
#[derive(Debug, Clone)]
pub struct GroqClient {
    client: reqwest::Client,
    config: GroqConfig,
}

impl GroqClient {
    /// Create a client from an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    #[instrument(skip_all, fields(model = %config.text_model))]
    pub fn new(config: GroqConfig) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ConfigError::new(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a client configured from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized. A
    /// missing API key is not an error here; unconfigured clients fail
    /// each call with `BackendErrorKind::Unavailable` instead.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::new(GroqConfig::from_env())
    }

    /// Whether the client has credentials to make requests.
    pub fn is_configured(&self) -> bool {
        self.config.api_key.is_some()
    }

    async fn send_once(&self, api_key: &str, body: &ChatRequest) -> Result<String, BackendError> {
        let response = self
            .client
            .post(&self.config.base_url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    BackendError::new(BackendErrorKind::Timeout)
                } else {
                    BackendError::new(BackendErrorKind::Http(e.to_string()))
                }
            })?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(BackendError::new(BackendErrorKind::Api { status, message }));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            BackendError::new(BackendErrorKind::Malformed(format!(
                "Failed to parse response: {}",
                e
            )))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| {
                BackendError::new(BackendErrorKind::Malformed(
                    "Response contained no choices".to_string(),
                ))
            })
    }
}

#[async_trait]
impl TextGeneration for GroqClient {
    #[instrument(skip(self, req), fields(provider = "groq", model = %self.config.text_model))]
    async fn generate(&self, req: &GenerateRequest) -> TesseraResult<GenerateResponse> {
        let api_key = self
            .config
            .api_key
            .clone()
            .ok_or_else(|| BackendError::new(BackendErrorKind::Unavailable))?;

        let body = to_chat_request(req, &self.config.text_model);
        debug!(
            message_count = body.messages.len(),
            model = %body.model,
            "Sending Groq chat-completions request"
        );

        let strategy = ExponentialBackoff::from_millis(200)
            .map(jitter)
            .take(self.config.max_retries);

        let content = Retry::spawn(strategy, || async {
            self.send_once(&api_key, &body).await.map_err(|e| {
                if e.is_transient() {
                    warn!(error = %e, "Transient Groq failure, retrying");
                    RetryError::transient(e)
                } else {
                    RetryError::permanent(e)
                }
            })
        })
        .await?;

        debug!(response_length = content.len(), "Received Groq response");

        Ok(GenerateResponse {
            outputs: vec![Output::Text(content)],
        })
    }

    fn provider_name(&self) -> &'static str {
        "groq"
    }

    fn model_name(&self) -> &str {
        &self.config.text_model
    }
}

#[async_trait]
impl VisionAnalysis for GroqClient {
    fn vision_model_name(&self) -> &str {
        &self.config.vision_model
    }
}
