//! Document model and store contracts for Tessera.
//!
//! The pipeline owns the [`Epic`] aggregate and references the external
//! [`Post`] aggregate. Store access goes through the [`EpicStore`] and
//! [`PostStore`] traits; the in-memory implementations back tests and
//! embedders that don't bring their own document store.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod epic;
mod id;
mod memory;
mod patch;
mod post;
mod store;

pub use epic::{Epic, EpicMetadata, EpicStatus, GenerationMode, StoryBlock};
pub use id::{EpicId, PostId};
pub use memory::{MemoryEpicStore, MemoryPostStore};
pub use patch::{EpicFilter, EpicPatch, PostFilter, PostPatch};
pub use post::{EpicRef, Post, TextBlock};
pub use store::{EpicStore, PostStore};
