//! Narrative generation and sync pipeline for Tessera.
//!
//! This crate turns aggregated post text into structured multi-block
//! narratives ("epics"), drives the multi-stage generation pipeline, and
//! keeps epics and posts bidirectionally consistent when story blocks
//! are paired with images.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera_models::GroqClient;
//! use tessera_narrative::{EpicService, GenerateFullStoryRequest};
//! use tessera_store::{MemoryEpicStore, MemoryPostStore};
//!
//! # async fn example() -> tessera_error::TesseraResult<()> {
//! let driver = Arc::new(GroqClient::from_env()?);
//! let service = EpicService::new(
//!     driver,
//!     Arc::new(MemoryEpicStore::new()),
//!     Arc::new(MemoryPostStore::new()),
//! );
//!
//! let epic = service
//!     .generate_full_story(GenerateFullStoryRequest {
//!         title: "Tidewater".to_string(),
//!         generation_prompt: "a story about the sea".to_string(),
//!         use_all_text: true,
//!         ..Default::default()
//!     })
//!     .await?;
//! println!("{} blocks", epic.story_blocks.len());
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod epic;
mod extraction;
mod prompts;
mod refiner;
mod segmenter;
mod storyteller;
mod vision;

pub use epic::{
    AssociationResult, CompleteStoryRequest, EpicService, EpicStats, GenerateFullStoryRequest,
    ImageSuggestion, PaginatedEpics, SyncOutcome,
};
pub use extraction::{extract_json, parse_json};
pub use refiner::{APOLOGY, ProseKind, Refiner};
pub use segmenter::{FALLBACK_COHERENCE, SegmentedBlock, Segmenter, fallback_segmentation};
pub use storyteller::{EpicStoryDraft, Storyteller};
pub use vision::{StoryConnection, VisionKit};
