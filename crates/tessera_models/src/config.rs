//! Configuration for the Groq driver.

use std::time::Duration;

/// Default text model, matching the production deployment.
pub const DEFAULT_TEXT_MODEL: &str = "llama-3.3-70b-versatile";
/// Default vision model.
pub const DEFAULT_VISION_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";
/// Default chat-completions endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Configuration for the Groq chat-completions driver.
///
/// A missing API key does not fail construction; it degrades every
/// generation call to a `BackendErrorKind::Unavailable` so the pipeline's
/// fallback paths can take over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroqConfig {
    /// API key; `None` leaves the driver unconfigured
    pub api_key: Option<String>,
    /// Model identifier for text generation
    pub text_model: String,
    /// Model identifier for vision requests
    pub vision_model: String,
    /// Chat-completions endpoint URL
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for transient failures
    pub max_retries: usize,
}

impl Default for GroqConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            text_model: DEFAULT_TEXT_MODEL.to_string(),
            vision_model: DEFAULT_VISION_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(60),
            max_retries: 2,
        }
    }
}

impl GroqConfig {
    /// Create a configuration with an explicit API key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            ..Self::default()
        }
    }

    /// Create config from environment variables.
    ///
    /// Reads (all optional):
    /// - `GROQ_API_KEY`
    /// - `GROQ_TEXT_MODEL`
    /// - `GROQ_VISION_MODEL`
    /// - `GROQ_BASE_URL`
    /// - `GROQ_TIMEOUT_SECS`
    ///
    /// A `.env` file in the working directory is honored.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let timeout = std::env::var("GROQ_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        Self {
            api_key: std::env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
            text_model: std::env::var("GROQ_TEXT_MODEL").unwrap_or(defaults.text_model),
            vision_model: std::env::var("GROQ_VISION_MODEL").unwrap_or(defaults.vision_model),
            base_url: std::env::var("GROQ_BASE_URL").unwrap_or(defaults.base_url),
            timeout,
            max_retries: defaults.max_retries,
        }
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
