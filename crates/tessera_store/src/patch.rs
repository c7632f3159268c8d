//! Patch and filter types for store updates.
//!
//! Patches distinguish `$set`-style field replacement from `$push`-style
//! array appends; appends never rewrite existing elements.

use crate::{EpicMetadata, EpicRef, EpicStatus, StoryBlock, TextBlock};
use serde::{Deserialize, Serialize};

/// `$set`-style partial update for an epic document.
///
/// Applying any patch refreshes the document's `updated_at`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EpicPatch {
    /// Replace the title
    pub title: Option<String>,
    /// Replace the description
    pub description: Option<Option<String>>,
    /// Replace the status
    pub status: Option<EpicStatus>,
    /// Replace the whole block sequence
    pub story_blocks: Option<Vec<StoryBlock>>,
    /// Replace the metadata
    pub metadata: Option<EpicMetadata>,
}

impl EpicPatch {
    /// Whether the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.story_blocks.is_none()
            && self.metadata.is_none()
    }
}

/// Partial update for a post document.
///
/// `push_*` fields are append-only array operations.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostPatch {
    /// Replace the description
    pub description: Option<Option<String>>,
    /// Replace the tag list
    pub general_tags: Option<Vec<String>>,
    /// Append text blocks
    #[serde(default)]
    pub push_text_blocks: Vec<TextBlock>,
    /// Append epic back-references
    #[serde(default)]
    pub push_epic_refs: Vec<EpicRef>,
}

impl PostPatch {
    /// Whether the patch carries no changes.
    pub fn is_empty(&self) -> bool {
        self.description.is_none()
            && self.general_tags.is_none()
            && self.push_text_blocks.is_empty()
            && self.push_epic_refs.is_empty()
    }
}

/// Query filter for epic listings.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EpicFilter {
    /// Match only epics with this status
    pub status: Option<EpicStatus>,
}

/// Query filter for post lookups.
///
/// All set conditions are conjunctive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PostFilter {
    /// Match posts carrying at least one of these tags
    pub tags_any: Option<Vec<String>>,
    /// `Some(true)`: non-empty text blocks; `Some(false)`: none
    pub has_text: Option<bool>,
    /// `Some(true)`: photo present; `Some(false)`: absent
    pub has_photo: Option<bool>,
}
