//! Story segmentation: AI-driven with a deterministic fallback.
//!
//! The primary strategy asks the backend to partition the narrative into
//! coherent blocks in one structured call. Any failure on that path —
//! backend unavailable, transport error, malformed payload, insufficient
//! coverage — falls open to the deterministic paragraph-grouping
//! strategy. The pipeline never stalls on segmentation.

use crate::extraction::{extract_json, parse_json};
use crate::prompts;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tessera_core::{GenerateRequest, Message, Role};
use tessera_error::{BackendError, BackendErrorKind, TesseraResult};
use tessera_interface::{extract_text, TextGeneration};
use tracing::{debug, instrument, warn};

/// Coherence score assigned to every fallback block.
pub const FALLBACK_COHERENCE: f32 = 0.7;

/// Word-count target that closes a fallback block.
const TARGET_WORDS_PER_BLOCK: usize = 250;

/// Minimum ratio of AI-block words to input words before the AI
/// segmentation is rejected for dropping content.
const COVERAGE_THRESHOLD: f64 = 0.6;

/// One segmented narrative unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentedBlock {
    /// Position in narrative order, 1-based and contiguous
    pub sequence_order: u32,
    /// Block text, non-empty
    pub content: String,
    /// Internal narrative unity estimate in [0, 1]
    pub coherence_score: f32,
    /// One-sentence block summary
    pub summary: String,
}

/// Structured payload requested from the backend.
#[derive(Debug, Deserialize)]
struct SegmentationPayload {
    blocks: Vec<RawBlock>,
}

#[derive(Debug, Deserialize)]
struct RawBlock {
    sequence_order: Option<u32>,
    content: String,
    coherence_score: Option<f32>,
    summary: Option<String>,
}

/// Segments narrative text into coherent story blocks.
pub struct Segmenter<D: TextGeneration> {
    driver: Arc<D>,
}

impl<D: TextGeneration> Segmenter<D> {
    /// Create a segmenter over the given driver.
    pub fn new(driver: Arc<D>) -> Self {
        Self { driver }
    }

    /// Segment a story into ordered blocks.
    ///
    /// Tries the backend strategy first; falls open to
    /// [`fallback_segmentation`] on any failure or on insufficient text
    /// coverage. Never fails.
    #[instrument(skip(self, story_text), fields(input_len = story_text.len()))]
    pub async fn segment(&self, story_text: &str) -> Vec<SegmentedBlock> {
        match self.segment_with_backend(story_text).await {
            Ok(blocks) => {
                if covers_input(story_text, &blocks) {
                    debug!(block_count = blocks.len(), "AI segmentation accepted");
                    blocks
                } else {
                    warn!(
                        block_count = blocks.len(),
                        "AI segmentation dropped content, using fallback"
                    );
                    fallback_segmentation(story_text)
                }
            }
            Err(e) => {
                warn!(error = %e, "AI segmentation unavailable, using fallback");
                fallback_segmentation(story_text)
            }
        }
    }

    /// One structured backend call; parse and normalize the result.
    async fn segment_with_backend(&self, story_text: &str) -> TesseraResult<Vec<SegmentedBlock>> {
        let request = GenerateRequest::builder()
            .messages(vec![
                Message::text(Role::System, prompts::SEGMENTATION_SYSTEM),
                Message::text(Role::User, prompts::segmentation(story_text)),
            ])
            .temperature(Some(0.3))
            .max_tokens(Some(4096))
            .build()
            .map_err(|e| {
                BackendError::new(BackendErrorKind::Malformed(format!(
                    "Failed to build segmentation request: {}",
                    e
                )))
            })?;

        let response = self.driver.generate(&request).await?;
        let text = extract_text(&response)?;
        let payload: SegmentationPayload = parse_json(&extract_json(&text)?)?;

        normalize_blocks(payload.blocks)
    }
}

/// Validate and normalize raw backend blocks.
///
/// Blocks keep their reported order (stable sort on the reported
/// `sequence_order`, payload order breaking ties) and are renumbered to
/// a contiguous `1..=N`. Missing scores default to the fallback score;
/// out-of-range scores are clamped.
fn normalize_blocks(raw: Vec<RawBlock>) -> TesseraResult<Vec<SegmentedBlock>> {
    if raw.is_empty() {
        return Err(BackendError::new(BackendErrorKind::Malformed(
            "Segmentation returned no blocks".to_string(),
        ))
        .into());
    }

    let mut ordered: Vec<(u32, RawBlock)> = raw
        .into_iter()
        .enumerate()
        .map(|(i, block)| (block.sequence_order.unwrap_or(i as u32 + 1), block))
        .collect();
    ordered.sort_by_key(|(order, _)| *order);

    let mut blocks = Vec::with_capacity(ordered.len());
    for (i, (_, block)) in ordered.into_iter().enumerate() {
        let content = block.content.trim().to_string();
        if content.is_empty() {
            return Err(BackendError::new(BackendErrorKind::Malformed(format!(
                "Segmentation block {} has empty content",
                i + 1
            )))
            .into());
        }

        let sequence_order = i as u32 + 1;
        blocks.push(SegmentedBlock {
            sequence_order,
            content,
            coherence_score: block
                .coherence_score
                .unwrap_or(FALLBACK_COHERENCE)
                .clamp(0.0, 1.0),
            summary: block
                .summary
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| format!("Block {}", sequence_order)),
        });
    }

    Ok(blocks)
}

fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

fn covers_input(input: &str, blocks: &[SegmentedBlock]) -> bool {
    let input_words = word_count(input);
    if input_words == 0 {
        return true;
    }
    let block_words: usize = blocks.iter().map(|b| word_count(&b.content)).sum();
    block_words as f64 / input_words as f64 >= COVERAGE_THRESHOLD
}

/// Deterministic paragraph-grouping segmentation.
///
/// Splits on blank-line paragraph boundaries (single newlines when the
/// text has no blank lines), then greedily accumulates paragraphs until
/// each block reaches roughly 250 words. Pure and reproducible: the same
/// input always yields the same blocks, covering the full text.
///
/// # Examples
///
/// ```
/// use tessera_narrative::{fallback_segmentation, FALLBACK_COHERENCE};
///
/// let blocks = fallback_segmentation("First paragraph.\n\nSecond paragraph.");
/// assert_eq!(blocks[0].sequence_order, 1);
/// assert_eq!(blocks[0].coherence_score, FALLBACK_COHERENCE);
/// ```
pub fn fallback_segmentation(story_text: &str) -> Vec<SegmentedBlock> {
    let mut paragraphs: Vec<&str> = story_text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    // No blank-line boundaries: treat each line as a paragraph
    if paragraphs.len() <= 1 && story_text.contains('\n') {
        paragraphs = story_text
            .lines()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
    }

    let mut blocks = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut current_words = 0;

    for paragraph in &paragraphs {
        current.push(paragraph);
        current_words += word_count(paragraph);

        if current_words >= TARGET_WORDS_PER_BLOCK {
            push_block(&mut blocks, &mut current);
            current_words = 0;
        }
    }
    if !current.is_empty() {
        push_block(&mut blocks, &mut current);
    }

    blocks
}

fn push_block(blocks: &mut Vec<SegmentedBlock>, current: &mut Vec<&str>) {
    let sequence_order = blocks.len() as u32 + 1;
    blocks.push(SegmentedBlock {
        sequence_order,
        content: current.join("\n\n"),
        coherence_score: FALLBACK_COHERENCE,
        summary: format!("Block {}", sequence_order),
    });
    current.clear();
}
