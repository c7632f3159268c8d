//! Epic orchestration: generation, continuation, image association, and
//! the epic ↔ post sync step.

use crate::segmenter::{SegmentedBlock, Segmenter};
use crate::storyteller::Storyteller;
use crate::vision::VisionKit;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_error::{EpicError, EpicErrorKind, TesseraResult};
use tessera_interface::VisionAnalysis;
use tessera_store::{
    Epic, EpicFilter, EpicId, EpicMetadata, EpicPatch, EpicRef, EpicStatus, EpicStore,
    GenerationMode, Post, PostFilter, PostId, PostPatch, PostStore, StoryBlock, TextBlock,
};
use tracing::{debug, error, info, instrument};

/// Cap on the number of posts scanned when aggregating grounding text.
///
/// Bounds prompt size; a deliberate precision/cost tradeoff.
const AGGREGATION_POST_LIMIT: usize = 50;

/// Request to generate a full epic story from posts.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenerateFullStoryRequest {
    /// Epic title; the backend's suggestion is used when empty
    pub title: String,
    /// Optional description
    pub description: Option<String>,
    /// Tags used to select grounding posts
    #[serde(default)]
    pub source_tags: Vec<String>,
    /// When true, aggregate from all posts with text instead of tagged ones
    #[serde(default)]
    pub use_all_text: bool,
    /// Main story direction
    pub generation_prompt: String,
    /// Additional user input
    pub user_commentary: Option<String>,
}

/// Request to continue an existing epic story.
#[derive(Debug, Clone, Deserialize)]
pub struct CompleteStoryRequest {
    /// Epic to continue
    pub epic_id: EpicId,
    /// Direction for the continuation
    pub continuation_prompt: String,
    /// Additional user input
    pub user_commentary: Option<String>,
}

/// Paginated epic listing.
#[derive(Debug, Clone, Serialize)]
pub struct PaginatedEpics {
    /// Epics on this page, most recently updated first
    pub epics: Vec<Epic>,
    /// Total number of pages
    pub total_pages: u64,
    /// The requested page, 1-based
    pub current_page: u64,
    /// Total number of matching epics
    pub total_count: u64,
}

/// Outcome of the post-side sync after an image association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Block content and back-reference propagated to the post
    Synced,
    /// The epic update succeeded but the post sync did not; the
    /// inconsistency is recoverable, not rolled back
    Partial {
        /// What went wrong on the post side
        message: String,
    },
}

/// Result of associating an image with a story block.
#[derive(Debug, Clone, Serialize)]
pub struct AssociationResult {
    /// The updated epic
    pub epic: Epic,
    /// Whether the post-side sync completed
    pub sync: SyncOutcome,
}

/// An image suggestion for a story block.
#[derive(Debug, Clone, Serialize)]
pub struct ImageSuggestion {
    /// The candidate post (has a photo, no text blocks yet)
    pub post: Post,
    /// Vision-generated subtitle; empty when generation failed
    pub suggested_subtitle: String,
}

/// Statistics about an epic.
#[derive(Debug, Clone, Serialize)]
pub struct EpicStats {
    /// Epic identifier
    pub epic_id: EpicId,
    /// Epic title
    pub title: String,
    /// Number of story blocks
    pub total_blocks: u32,
    /// Total word count across blocks
    pub total_words: u64,
    /// Blocks with an associated image
    pub blocks_with_images: u32,
    /// Blocks without an associated image
    pub blocks_without_images: u32,
    /// Mean coherence score rounded to 2 decimals; 0 for empty epics
    pub average_coherence_score: f32,
    /// Lifecycle status
    pub status: EpicStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

/// Orchestrates the narrative pipeline over injected capabilities.
///
/// Owns no global state: the generation driver and both stores are
/// constructor-injected, so tests substitute scripted fakes.
pub struct EpicService<D, E, P>
where
    D: VisionAnalysis,
    E: EpicStore,
    P: PostStore,
{
    epics: Arc<E>,
    posts: Arc<P>,
    segmenter: Segmenter<D>,
    storyteller: Storyteller<D>,
    vision: VisionKit<D>,
}

impl<D, E, P> EpicService<D, E, P>
where
    D: VisionAnalysis,
    E: EpicStore,
    P: PostStore,
{
    /// Create a service over the given driver and stores.
    pub fn new(driver: Arc<D>, epics: Arc<E>, posts: Arc<P>) -> Self {
        Self {
            epics,
            posts,
            segmenter: Segmenter::new(driver.clone()),
            storyteller: Storyteller::new(driver.clone()),
            vision: VisionKit::new(driver),
        }
    }

    // ---- CRUD -----------------------------------------------------------

    /// Create a new empty draft epic.
    #[instrument(skip(self))]
    pub async fn create_epic(
        &self,
        title: &str,
        description: Option<String>,
        generation_mode: GenerationMode,
        source_tags: Vec<String>,
    ) -> TesseraResult<Epic> {
        let epic = Epic::new(title, description, generation_mode, source_tags);
        self.epics.insert(&epic).await?;
        info!(epic_id = %epic.id, "Created epic");
        Ok(epic)
    }

    /// Fetch an epic by id.
    ///
    /// # Errors
    ///
    /// `EpicErrorKind::EpicNotFound` when the epic does not exist.
    #[instrument(skip(self), fields(epic_id = %epic_id))]
    pub async fn get_epic(&self, epic_id: &EpicId) -> TesseraResult<Epic> {
        self.epics.find_one(epic_id).await?.ok_or_else(|| {
            EpicError::new(EpicErrorKind::EpicNotFound(epic_id.to_string())).into()
        })
    }

    /// Apply a partial update to an epic.
    ///
    /// If the patch replaces the block sequence without supplying
    /// metadata, the counted metadata fields are recomputed so the
    /// count invariants hold after the write.
    ///
    /// # Errors
    ///
    /// `Validation` for an empty patch; `EpicNotFound` when absent.
    #[instrument(skip(self, patch), fields(epic_id = %epic_id))]
    pub async fn update_epic(&self, epic_id: &EpicId, mut patch: EpicPatch) -> TesseraResult<Epic> {
        if patch.is_empty() {
            return Err(
                EpicError::new(EpicErrorKind::Validation("No update data provided".into())).into(),
            );
        }

        if let Some(blocks) = &patch.story_blocks
            && patch.metadata.is_none()
        {
            let existing = self.get_epic(epic_id).await?;
            let mut metadata = existing.metadata;
            metadata.total_blocks = blocks.len() as u32;
            metadata.total_images =
                blocks.iter().filter(|b| b.associated_image_id.is_some()).count() as u32;
            patch.metadata = Some(metadata);
        }

        if !self.epics.update_one(epic_id, patch).await? {
            return Err(EpicError::new(EpicErrorKind::EpicNotFound(epic_id.to_string())).into());
        }
        self.get_epic(epic_id).await
    }

    /// Delete an epic.
    ///
    /// Stale `EpicRef` entries left on posts are tolerated.
    ///
    /// # Errors
    ///
    /// `EpicNotFound` when the epic does not exist.
    #[instrument(skip(self), fields(epic_id = %epic_id))]
    pub async fn delete_epic(&self, epic_id: &EpicId) -> TesseraResult<()> {
        if !self.epics.delete_one(epic_id).await? {
            return Err(EpicError::new(EpicErrorKind::EpicNotFound(epic_id.to_string())).into());
        }
        info!(epic_id = %epic_id, "Deleted epic");
        Ok(())
    }

    /// List epics with pagination, most recently updated first.
    #[instrument(skip(self))]
    pub async fn list_epics(
        &self,
        page: u64,
        limit: u64,
        status: Option<EpicStatus>,
    ) -> TesseraResult<PaginatedEpics> {
        let page = page.max(1);
        let limit = limit.max(1);
        let filter = EpicFilter { status };

        let total_count = self.epics.count(&filter).await?;
        if total_count == 0 {
            return Ok(PaginatedEpics {
                epics: Vec::new(),
                total_pages: 0,
                current_page: 1,
                total_count: 0,
            });
        }

        let skip = (page - 1) * limit;
        let epics = self
            .epics
            .find(&filter, skip as usize, limit as usize)
            .await?;

        Ok(PaginatedEpics {
            epics,
            total_pages: total_count.div_ceil(limit),
            current_page: page,
            total_count,
        })
    }

    // ---- Generation -----------------------------------------------------

    /// Generate a full epic story from posts.
    ///
    /// Aggregates grounding text, generates the narrative, segments it,
    /// and persists a new draft epic. The epic is only inserted once its
    /// blocks are fully computed; readers never observe a partial epic.
    #[instrument(skip(self, request), fields(title = %request.title))]
    pub async fn generate_full_story(
        &self,
        request: GenerateFullStoryRequest,
    ) -> TesseraResult<Epic> {
        let aggregated = self
            .aggregate_text(&request.source_tags, request.use_all_text)
            .await?;
        debug!(aggregated_len = aggregated.len(), "Aggregated grounding text");

        let commentary = request.user_commentary.clone().unwrap_or_default();
        let draft = self
            .storyteller
            .generate_epic_story(
                &aggregated,
                &request.generation_prompt,
                &commentary,
                &request.source_tags,
            )
            .await;

        let blocks = self.segmenter.segment(&draft.story).await;
        let story_blocks = materialize_blocks(&blocks, 0);

        let title = if request.title.trim().is_empty() {
            draft
                .title_suggestion
                .unwrap_or_else(|| "Untitled Epic".to_string())
        } else {
            request.title
        };

        let mut epic = Epic::new(
            title,
            request.description,
            GenerationMode::FullStory,
            request.source_tags,
        );
        epic.story_blocks = story_blocks;
        epic.metadata = EpicMetadata {
            total_blocks: 0,
            total_images: 0,
            generation_prompt: Some(request.generation_prompt),
            user_commentary: request.user_commentary,
            themes: draft.themes,
        };
        epic.refresh_metadata();

        self.epics.insert(&epic).await?;
        info!(
            epic_id = %epic.id,
            block_count = epic.story_blocks.len(),
            "Generated full story"
        );
        Ok(epic)
    }

    /// Continue an existing epic story.
    ///
    /// New blocks are appended with `sequence_order` offset by the
    /// current maximum; existing blocks are never renumbered, so
    /// already-associated images keep their identity.
    ///
    /// # Errors
    ///
    /// `EpicNotFound` when the epic does not exist.
    #[instrument(skip(self, request), fields(epic_id = %request.epic_id))]
    pub async fn complete_story(&self, request: CompleteStoryRequest) -> TesseraResult<Epic> {
        let epic = self.get_epic(&request.epic_id).await?;

        let existing_story = epic
            .story_blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let commentary = request.user_commentary.clone().unwrap_or_default();
        let continuation = self
            .storyteller
            .complete_epic_story(&existing_story, &request.continuation_prompt, &commentary)
            .await;

        let new_blocks = self.segmenter.segment(&continuation).await;
        let offset = epic.max_sequence_order();

        let mut all_blocks = epic.story_blocks;
        all_blocks.extend(materialize_blocks(&new_blocks, offset));

        let mut metadata = epic.metadata;
        metadata.total_blocks = all_blocks.len() as u32;

        let patch = EpicPatch {
            story_blocks: Some(all_blocks),
            metadata: Some(metadata),
            ..Default::default()
        };
        self.update_epic(&request.epic_id, patch).await
    }

    /// Discard all story blocks and replace them with a fresh
    /// segmentation of the concatenated content.
    ///
    /// Destructive by design: prior image associations are severed and
    /// `total_images` resets to 0.
    ///
    /// # Errors
    ///
    /// `EpicNotFound` when the epic does not exist.
    #[instrument(skip(self), fields(epic_id = %epic_id))]
    pub async fn re_segment_blocks(&self, epic_id: &EpicId) -> TesseraResult<Epic> {
        let epic = self.get_epic(epic_id).await?;

        let full_story = epic
            .story_blocks
            .iter()
            .map(|b| b.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let blocks = self.segmenter.segment(&full_story).await;
        let story_blocks = materialize_blocks(&blocks, 0);

        let mut metadata = epic.metadata;
        metadata.total_blocks = story_blocks.len() as u32;
        metadata.total_images = 0;

        let patch = EpicPatch {
            story_blocks: Some(story_blocks),
            metadata: Some(metadata),
            ..Default::default()
        };
        self.update_epic(epic_id, patch).await
    }

    // ---- Image association ----------------------------------------------

    /// Associate an image post with a story block, then sync the block's
    /// content onto the post.
    ///
    /// The sync appends the content as a new text block every time;
    /// only the epic back-reference is idempotent. A failed sync after
    /// a successful epic update is reported as a partial outcome, never
    /// rolled back.
    ///
    /// # Errors
    ///
    /// `EpicNotFound` / `PostNotFound` / `BlockNotFound` when a
    /// referenced document is absent.
    #[instrument(skip(self), fields(epic_id = %epic_id, block_id, post_id = %image_post_id))]
    pub async fn associate_image_with_block(
        &self,
        epic_id: &EpicId,
        block_id: &str,
        image_post_id: &PostId,
    ) -> TesseraResult<AssociationResult> {
        let mut epic = self.get_epic(epic_id).await?;

        let post = self.posts.find_one(image_post_id).await?.ok_or_else(|| {
            EpicError::new(EpicErrorKind::PostNotFound(image_post_id.to_string()))
        })?;

        let block = epic
            .story_blocks
            .iter_mut()
            .find(|b| b.block_id == block_id)
            .ok_or_else(|| {
                EpicError::new(EpicErrorKind::BlockNotFound {
                    epic_id: epic_id.to_string(),
                    block_id: block_id.to_string(),
                })
            })?;

        block.associated_image_id = Some(image_post_id.clone());
        block.image_url = post.photo_url.clone();
        let block_content = block.content.clone();

        epic.refresh_metadata();
        let patch = EpicPatch {
            story_blocks: Some(epic.story_blocks.clone()),
            metadata: Some(epic.metadata.clone()),
            ..Default::default()
        };
        if !self.epics.update_one(epic_id, patch).await? {
            return Err(EpicError::new(EpicErrorKind::EpicNotFound(epic_id.to_string())).into());
        }

        let sync = self
            .sync_block_to_post(&post, &block_content, epic_id, &epic.title)
            .await;

        let epic = self.get_epic(epic_id).await?;
        Ok(AssociationResult { epic, sync })
    }

    /// Propagate block content and an epic back-reference onto a post.
    async fn sync_block_to_post(
        &self,
        post: &Post,
        block_content: &str,
        epic_id: &EpicId,
        epic_title: &str,
    ) -> SyncOutcome {
        if block_content.trim().is_empty() {
            return SyncOutcome::Synced;
        }

        let mut patch = PostPatch {
            push_text_blocks: vec![TextBlock::paragraph(block_content)],
            ..Default::default()
        };
        // The back-reference is deduplicated by epic id; content is not.
        if !post.references_epic(epic_id) {
            patch.push_epic_refs.push(EpicRef {
                epic_id: epic_id.clone(),
                title: epic_title.to_string(),
            });
        }

        match self.posts.update_one(&post.id, patch).await {
            Ok(true) => SyncOutcome::Synced,
            Ok(false) => self.report_partial_sync(epic_id, &post.id, "post disappeared mid-sync"),
            Err(e) => self.report_partial_sync(epic_id, &post.id, &e.to_string()),
        }
    }

    fn report_partial_sync(&self, epic_id: &EpicId, post_id: &PostId, message: &str) -> SyncOutcome {
        let partial = EpicError::new(EpicErrorKind::PartialSync {
            epic_id: epic_id.to_string(),
            post_id: post_id.to_string(),
            message: message.to_string(),
        });
        error!(error = %partial, "Epic updated but post sync failed");
        SyncOutcome::Partial {
            message: partial.to_string(),
        }
    }

    /// Suggest candidate images for a story block.
    ///
    /// Picks up to `count` posts that have a photo but no text blocks
    /// yet, uniformly at random without replacement, and generates a
    /// subtitle for each (best-effort; a failed subtitle is an empty
    /// string, never an aborted set).
    ///
    /// # Errors
    ///
    /// `EpicNotFound` / `BlockNotFound` when the target is absent.
    #[instrument(skip(self), fields(epic_id = %epic_id, block_id, count))]
    pub async fn suggest_images_for_block(
        &self,
        epic_id: &EpicId,
        block_id: &str,
        count: usize,
    ) -> TesseraResult<Vec<ImageSuggestion>> {
        let epic = self.get_epic(epic_id).await?;
        if epic.find_block(block_id).is_none() {
            return Err(EpicError::new(EpicErrorKind::BlockNotFound {
                epic_id: epic_id.to_string(),
                block_id: block_id.to_string(),
            })
            .into());
        }

        let candidates = self
            .posts
            .find(
                &PostFilter {
                    has_photo: Some(true),
                    has_text: Some(false),
                    ..Default::default()
                },
                None,
            )
            .await?;

        let selected: Vec<Post> = {
            let mut rng = rand::thread_rng();
            candidates
                .choose_multiple(&mut rng, count)
                .cloned()
                .collect()
        };

        let mut suggestions = Vec::with_capacity(selected.len());
        for post in selected {
            let suggested_subtitle = match &post.photo_url {
                Some(url) => self.vision.generate_image_subtitle(url).await,
                None => String::new(),
            };
            suggestions.push(ImageSuggestion {
                post,
                suggested_subtitle,
            });
        }

        Ok(suggestions)
    }

    // ---- Posts ----------------------------------------------------------

    /// Append a generated text block to a post.
    ///
    /// # Errors
    ///
    /// `Validation` for empty content; `PostNotFound` when absent.
    #[instrument(skip(self, content), fields(post_id = %post_id))]
    pub async fn add_text_to_post(
        &self,
        post_id: &PostId,
        content: &str,
        kind: &str,
    ) -> TesseraResult<Post> {
        if content.trim().is_empty() {
            return Err(
                EpicError::new(EpicErrorKind::Validation("Text content is empty".into())).into(),
            );
        }

        let patch = PostPatch {
            push_text_blocks: vec![TextBlock::new(kind, content)],
            ..Default::default()
        };
        if !self.posts.update_one(post_id, patch).await? {
            return Err(EpicError::new(EpicErrorKind::PostNotFound(post_id.to_string())).into());
        }

        self.posts.find_one(post_id).await?.ok_or_else(|| {
            EpicError::new(EpicErrorKind::PostNotFound(post_id.to_string())).into()
        })
    }

    // ---- Stats ----------------------------------------------------------

    /// Compute statistics for an epic.
    ///
    /// # Errors
    ///
    /// `EpicNotFound` when the epic does not exist.
    #[instrument(skip(self), fields(epic_id = %epic_id))]
    pub async fn get_epic_stats(&self, epic_id: &EpicId) -> TesseraResult<EpicStats> {
        let epic = self.get_epic(epic_id).await?;

        let total_words: u64 = epic
            .story_blocks
            .iter()
            .map(|b| b.content.split_whitespace().count() as u64)
            .sum();
        let blocks_with_images = epic.count_images();
        let total_blocks = epic.story_blocks.len() as u32;

        let average_coherence_score = if epic.story_blocks.is_empty() {
            0.0
        } else {
            let sum: f32 = epic.story_blocks.iter().map(|b| b.coherence_score).sum();
            (sum / total_blocks as f32 * 100.0).round() / 100.0
        };

        Ok(EpicStats {
            epic_id: epic.id,
            title: epic.title,
            total_blocks,
            total_words,
            blocks_with_images,
            blocks_without_images: total_blocks - blocks_with_images,
            average_coherence_score,
            status: epic.status,
            created_at: epic.created_at,
            updated_at: epic.updated_at,
        })
    }

    // ---- Helpers --------------------------------------------------------

    /// Aggregate text content from posts, bounded by the scan cap.
    async fn aggregate_text(&self, tags: &[String], use_all: bool) -> TesseraResult<String> {
        let filter = PostFilter {
            tags_any: (!use_all && !tags.is_empty()).then(|| tags.to_vec()),
            has_text: Some(true),
            ..Default::default()
        };

        let posts = self.posts.find(&filter, Some(AGGREGATION_POST_LIMIT)).await?;

        let texts: Vec<&str> = posts
            .iter()
            .flat_map(|p| p.text_blocks.iter())
            .map(|b| b.content.trim())
            .filter(|c| !c.is_empty())
            .collect();

        Ok(texts.join("\n\n"))
    }
}

/// Turn segmented blocks into owned story blocks, offsetting the
/// sequence numbers for appends.
fn materialize_blocks(blocks: &[SegmentedBlock], offset: u32) -> Vec<StoryBlock> {
    blocks
        .iter()
        .map(|b| StoryBlock::new(offset + b.sequence_order, b.content.as_str(), b.coherence_score))
        .collect()
}
