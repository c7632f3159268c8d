//! The external Post aggregate, referenced by epics.

use crate::{EpicId, PostId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A free-form text block stored on a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBlock {
    /// Block identifier (`block_<uuid>`)
    pub id: String,
    /// Block kind; "paragraph" for synced story content
    #[serde(rename = "type")]
    pub kind: String,
    /// Text content
    pub content: String,
    /// Optional display color
    pub color: Option<String>,
}

impl TextBlock {
    /// Create a block of the given kind with a fresh identifier.
    pub fn new(kind: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: format!("block_{}", Uuid::new_v4()),
            kind: kind.into(),
            content: content.into(),
            color: None,
        }
    }

    /// Create a paragraph block with a fresh identifier.
    pub fn paragraph(content: impl Into<String>) -> Self {
        Self::new("paragraph", content)
    }
}

/// Lightweight back-reference from a post to an epic.
///
/// This is a cache, not a foreign-key guarantee: refs to deleted epics
/// are tolerated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpicRef {
    /// Referenced epic identifier
    pub epic_id: EpicId,
    /// Epic title at association time
    pub title: String,
}

/// An image-centric aggregate with tags and free-form text blocks.
///
/// External to the pipeline; the sync step is the only core behavior
/// that mutates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Document identifier
    pub id: PostId,
    /// URL of the stored image, if any
    pub photo_url: Option<String>,
    /// Free-form description
    pub description: Option<String>,
    /// User-assigned tags
    #[serde(default)]
    pub general_tags: Vec<String>,
    /// Ordered free-form text blocks
    #[serde(default)]
    pub text_blocks: Vec<TextBlock>,
    /// Back-references to epics, deduplicated by epic id
    #[serde(default)]
    pub associated_epics: Vec<EpicRef>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a post with an image and no text.
    pub fn with_photo(photo_url: impl Into<String>, general_tags: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: PostId::generate(),
            photo_url: Some(photo_url.into()),
            description: None,
            general_tags,
            text_blocks: Vec::new(),
            associated_epics: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Whether the post already references the given epic.
    pub fn references_epic(&self, epic_id: &EpicId) -> bool {
        self.associated_epics.iter().any(|r| &r.epic_id == epic_id)
    }
}
