//! The Epic aggregate and its owned story blocks.

use crate::{EpicId, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of an epic.
///
/// Created as `Draft`; all further transitions are explicit client
/// updates. The pipeline never auto-transitions status.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum EpicStatus {
    /// Work in progress
    #[default]
    Draft,
    /// Finished narrative
    Completed,
    /// Retired from active listings
    Archived,
}

/// How the epic's narrative was produced.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum GenerationMode {
    /// Generated from scratch out of aggregated post text
    #[default]
    FullStory,
    /// Continuation of an existing narrative
    StoryCompletion,
}

/// One coherent narrative segment within an epic, optionally linked to
/// one image post.
///
/// Blocks are created only by segmentation and mutated only to attach or
/// detach an image association. They are never deleted individually;
/// re-segmentation replaces the whole sequence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoryBlock {
    /// Globally unique block identifier (`story_block_<uuid>`)
    pub block_id: String,
    /// Position in narrative order, 1-based
    pub sequence_order: u32,
    /// Narrative text; non-empty once persisted
    pub content: String,
    /// Post providing the associated image, if any
    pub associated_image_id: Option<PostId>,
    /// Cached denormalization of the post's photo URL
    pub image_url: Option<String>,
    /// Internal narrative unity estimate in [0, 1]
    pub coherence_score: f32,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl StoryBlock {
    /// Create a block with a fresh identifier and no image association.
    pub fn new(sequence_order: u32, content: impl Into<String>, coherence_score: f32) -> Self {
        Self {
            block_id: format!("story_block_{}", Uuid::new_v4()),
            sequence_order,
            content: content.into(),
            associated_image_id: None,
            image_url: None,
            coherence_score,
            created_at: Utc::now(),
        }
    }
}

/// Metadata about the epic generation process.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpicMetadata {
    /// Number of story blocks; kept equal to `story_blocks.len()`
    pub total_blocks: u32,
    /// Number of blocks with an associated image
    pub total_images: u32,
    /// The prompt that drove generation, if any
    pub generation_prompt: Option<String>,
    /// Additional user direction, if any
    pub user_commentary: Option<String>,
    /// Themes reported by the generation backend
    #[serde(default)]
    pub themes: Vec<String>,
}

/// An aggregate representing a multi-block generated narrative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Epic {
    /// Document identifier
    pub id: EpicId,
    /// Title
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Lifecycle status
    pub status: EpicStatus,
    /// How the narrative was produced
    pub generation_mode: GenerationMode,
    /// Tags used to source the grounding text
    pub source_tags: Vec<String>,
    /// Ordered narrative segments, owned by this epic
    pub story_blocks: Vec<StoryBlock>,
    /// Generation metadata
    pub metadata: EpicMetadata,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Epic {
    /// Create an empty draft epic.
    pub fn new(
        title: impl Into<String>,
        description: Option<String>,
        generation_mode: GenerationMode,
        source_tags: Vec<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: EpicId::generate(),
            title: title.into(),
            description,
            status: EpicStatus::Draft,
            generation_mode,
            source_tags,
            story_blocks: Vec::new(),
            metadata: EpicMetadata::default(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Find a block by its identifier.
    pub fn find_block(&self, block_id: &str) -> Option<&StoryBlock> {
        self.story_blocks.iter().find(|b| b.block_id == block_id)
    }

    /// Highest `sequence_order` among current blocks, 0 when empty.
    pub fn max_sequence_order(&self) -> u32 {
        self.story_blocks
            .iter()
            .map(|b| b.sequence_order)
            .max()
            .unwrap_or(0)
    }

    /// Number of blocks with an associated image.
    pub fn count_images(&self) -> u32 {
        self.story_blocks
            .iter()
            .filter(|b| b.associated_image_id.is_some())
            .count() as u32
    }

    /// Recompute the counted metadata fields from the block sequence.
    ///
    /// Upholds the invariant `total_blocks == story_blocks.len()` and
    /// `total_images == count_images()`.
    pub fn refresh_metadata(&mut self) {
        self.metadata.total_blocks = self.story_blocks.len() as u32;
        self.metadata.total_images = self.count_images();
    }
}
