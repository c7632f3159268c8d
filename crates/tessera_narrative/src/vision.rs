//! Vision-driven text helpers: recommendations, subtitles, and
//! image/story coherence analysis.

use crate::extraction::{extract_json, parse_json};
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_error::TesseraResult;
use tessera_interface::VisionAnalysis;
use tracing::{instrument, warn};

/// How well an image fits a story block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryConnection {
    /// Match quality in [0, 1]
    pub coherence_score: f32,
    /// Brief explanation of the match
    pub explanation: String,
    /// Key visual elements observed
    #[serde(default)]
    pub visual_elements: Vec<String>,
    /// Thematic links between image and text
    #[serde(default)]
    pub thematic_connections: Vec<String>,
}

impl StoryConnection {
    fn neutral(explanation: impl Into<String>) -> Self {
        Self {
            coherence_score: 0.5,
            explanation: explanation.into(),
            visual_elements: Vec::new(),
            thematic_connections: Vec::new(),
        }
    }
}

/// Vision-analysis helpers over a [`VisionAnalysis`] driver.
pub struct VisionKit<D: VisionAnalysis> {
    driver: Arc<D>,
}

impl<D: VisionAnalysis> VisionKit<D> {
    /// Create a kit over the given driver.
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Generate narrative text that complements an image and any
    /// existing text context.
    ///
    /// # Errors
    ///
    /// Propagates backend failures; callers decide whether to degrade.
    #[instrument(skip_all)]
    pub async fn auto_recommend_text(
        &self,
        image_url: &str,
        existing_text: Option<&str>,
    ) -> TesseraResult<String> {
        self.driver
            .analyze_image(image_url, &prompts::auto_recommend(existing_text))
            .await
    }

    /// Generate text about an image following a user's direction.
    ///
    /// # Errors
    ///
    /// Propagates backend failures.
    #[instrument(skip_all)]
    pub async fn prompt_enhanced_text(
        &self,
        image_url: &str,
        user_prompt: &str,
    ) -> TesseraResult<String> {
        self.driver
            .analyze_image(image_url, &prompts::prompt_enhance(user_prompt))
            .await
    }

    /// Generate a short, evocative subtitle for an image.
    ///
    /// Best-effort: failures yield an empty string so a whole suggestion
    /// set is never aborted by one bad candidate.
    #[instrument(skip_all)]
    pub async fn generate_image_subtitle(&self, image_url: &str) -> String {
        match self.driver.analyze_image(image_url, prompts::SUBTITLE).await {
            Ok(subtitle) => subtitle
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string(),
            Err(e) => {
                warn!(error = %e, "Subtitle generation failed");
                String::new()
            }
        }
    }

    /// Analyze how well an image fits a story block.
    ///
    /// Degrades to a neutral 0.5 score when the backend fails or the
    /// payload can't be parsed.
    #[instrument(skip_all, fields(block_len = block_content.len()))]
    pub async fn suggest_story_connection(
        &self,
        image_url: &str,
        block_content: &str,
    ) -> StoryConnection {
        let raw = match self
            .driver
            .analyze_image(image_url, &prompts::story_connection(block_content))
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Story connection analysis failed");
                return StoryConnection::neutral(format!("Analysis error: {}", e));
            }
        };

        match extract_json(&raw).and_then(|json| parse_json::<StoryConnection>(&json)) {
            Ok(mut connection) => {
                connection.coherence_score = connection.coherence_score.clamp(0.0, 1.0);
                connection
            }
            Err(_) => {
                // Keep a readable slice of whatever the model said
                let preview: String = raw.chars().take(200).collect();
                StoryConnection::neutral(preview)
            }
        }
    }
}
