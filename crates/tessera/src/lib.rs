//! Facade crate re-exporting the Tessera public API.
//!
//! Depend on this crate to get the whole pipeline behind one import:
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tessera::{EpicService, GroqClient, MemoryEpicStore, MemoryPostStore};
//!
//! # async fn example() -> tessera::TesseraResult<()> {
//! tessera::init_telemetry();
//!
//! let driver = Arc::new(GroqClient::from_env()?);
//! let service = EpicService::new(
//!     driver,
//!     Arc::new(MemoryEpicStore::new()),
//!     Arc::new(MemoryPostStore::new()),
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]

pub use tessera_core::{
    init_telemetry, GenerateRequest, GenerateResponse, Input, MediaSource, Message, Output,
    ResponseFormat, Role,
};
pub use tessera_error::{
    BackendError, BackendErrorKind, ConfigError, EpicError, EpicErrorKind, JsonError, StoreError,
    StoreErrorKind, TesseraError, TesseraErrorKind, TesseraResult,
};
pub use tessera_interface::{extract_text, TextGeneration, VisionAnalysis};
pub use tessera_models::{GroqClient, GroqConfig};
pub use tessera_narrative::{
    fallback_segmentation, AssociationResult, CompleteStoryRequest, EpicService, EpicStats,
    EpicStoryDraft, GenerateFullStoryRequest, ImageSuggestion, PaginatedEpics, ProseKind, Refiner,
    SegmentedBlock, Segmenter, StoryConnection, Storyteller, SyncOutcome, VisionKit,
};
pub use tessera_store::{
    Epic, EpicFilter, EpicId, EpicMetadata, EpicPatch, EpicRef, EpicStatus, EpicStore,
    GenerationMode, MemoryEpicStore, MemoryPostStore, Post, PostFilter, PostId, PostPatch,
    PostStore, StoryBlock, TextBlock,
};
