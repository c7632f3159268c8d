//! In-memory store implementations.
//!
//! Back tests and embedders that don't bring their own document store.
//! Each patch applies under a single write-lock acquisition, so
//! documents are never observed torn; concurrent read-modify-write
//! cycles at the service layer remain last-writer-wins.

use crate::{
    Epic, EpicFilter, EpicId, EpicPatch, EpicStore, Post, PostFilter, PostId, PostPatch, PostStore,
};
use chrono::Utc;
use std::collections::HashMap;
use tessera_error::TesseraResult;
use tokio::sync::RwLock;

/// In-memory [`EpicStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryEpicStore {
    epics: RwLock<HashMap<EpicId, Epic>>,
}

impl MemoryEpicStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_epic(epic: &Epic, filter: &EpicFilter) -> bool {
    filter.status.is_none_or(|status| epic.status == status)
}

#[async_trait::async_trait]
impl EpicStore for MemoryEpicStore {
    async fn insert(&self, epic: &Epic) -> TesseraResult<()> {
        self.epics
            .write()
            .await
            .insert(epic.id.clone(), epic.clone());
        Ok(())
    }

    async fn find_one(&self, id: &EpicId) -> TesseraResult<Option<Epic>> {
        Ok(self.epics.read().await.get(id).cloned())
    }

    async fn update_one(&self, id: &EpicId, patch: EpicPatch) -> TesseraResult<bool> {
        let mut epics = self.epics.write().await;
        let Some(epic) = epics.get_mut(id) else {
            return Ok(false);
        };

        if let Some(title) = patch.title {
            epic.title = title;
        }
        if let Some(description) = patch.description {
            epic.description = description;
        }
        if let Some(status) = patch.status {
            epic.status = status;
        }
        if let Some(story_blocks) = patch.story_blocks {
            epic.story_blocks = story_blocks;
        }
        if let Some(metadata) = patch.metadata {
            epic.metadata = metadata;
        }
        epic.updated_at = Utc::now();

        Ok(true)
    }

    async fn delete_one(&self, id: &EpicId) -> TesseraResult<bool> {
        Ok(self.epics.write().await.remove(id).is_some())
    }

    async fn find(
        &self,
        filter: &EpicFilter,
        skip: usize,
        limit: usize,
    ) -> TesseraResult<Vec<Epic>> {
        let epics = self.epics.read().await;
        let mut matched: Vec<Epic> = epics
            .values()
            .filter(|e| matches_epic(e, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        Ok(matched.into_iter().skip(skip).take(limit).collect())
    }

    async fn count(&self, filter: &EpicFilter) -> TesseraResult<u64> {
        let epics = self.epics.read().await;
        Ok(epics.values().filter(|e| matches_epic(e, filter)).count() as u64)
    }
}

/// In-memory [`PostStore`] backed by a `HashMap`.
#[derive(Debug, Default)]
pub struct MemoryPostStore {
    posts: RwLock<HashMap<PostId, Post>>,
}

impl MemoryPostStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a post document.
    ///
    /// Post creation belongs to the upload surface; this exists so tests
    /// and embedders can populate the store.
    pub async fn insert(&self, post: Post) {
        self.posts.write().await.insert(post.id.clone(), post);
    }
}

fn matches_post(post: &Post, filter: &PostFilter) -> bool {
    if let Some(tags) = &filter.tags_any
        && !tags.iter().any(|t| post.general_tags.contains(t))
    {
        return false;
    }
    if let Some(has_text) = filter.has_text
        && post.text_blocks.is_empty() == has_text
    {
        return false;
    }
    if let Some(has_photo) = filter.has_photo
        && post.photo_url.is_some() != has_photo
    {
        return false;
    }
    true
}

#[async_trait::async_trait]
impl PostStore for MemoryPostStore {
    async fn find(&self, filter: &PostFilter, limit: Option<usize>) -> TesseraResult<Vec<Post>> {
        let posts = self.posts.read().await;
        let mut matched: Vec<Post> = posts
            .values()
            .filter(|p| matches_post(p, filter))
            .cloned()
            .collect();
        matched.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));

        if let Some(limit) = limit {
            matched.truncate(limit);
        }
        Ok(matched)
    }

    async fn find_one(&self, id: &PostId) -> TesseraResult<Option<Post>> {
        Ok(self.posts.read().await.get(id).cloned())
    }

    async fn update_one(&self, id: &PostId, patch: PostPatch) -> TesseraResult<bool> {
        let mut posts = self.posts.write().await;
        let Some(post) = posts.get_mut(id) else {
            return Ok(false);
        };

        if let Some(description) = patch.description {
            post.description = description;
        }
        if let Some(general_tags) = patch.general_tags {
            post.general_tags = general_tags;
        }
        post.text_blocks.extend(patch.push_text_blocks);
        post.associated_epics.extend(patch.push_epic_refs);
        post.updated_at = Utc::now();

        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EpicStatus, GenerationMode, TextBlock};

    #[tokio::test]
    async fn epic_patch_updates_fields_and_timestamp() {
        let store = MemoryEpicStore::new();
        let epic = Epic::new("before", None, GenerationMode::FullStory, vec![]);
        let id = epic.id.clone();
        let created = epic.updated_at;
        store.insert(&epic).await.unwrap();

        let patch = EpicPatch {
            title: Some("after".to_string()),
            status: Some(EpicStatus::Completed),
            ..Default::default()
        };
        assert!(store.update_one(&id, patch).await.unwrap());

        let updated = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(updated.title, "after");
        assert_eq!(updated.status, EpicStatus::Completed);
        assert!(updated.updated_at >= created);
    }

    #[tokio::test]
    async fn epic_update_on_missing_id_reports_no_match() {
        let store = MemoryEpicStore::new();
        let missing = EpicId::from("nope");
        assert!(
            !store
                .update_one(&missing, EpicPatch::default())
                .await
                .unwrap()
        );
        assert!(!store.delete_one(&missing).await.unwrap());
    }

    #[tokio::test]
    async fn epic_find_filters_by_status_and_sorts_descending() {
        let store = MemoryEpicStore::new();
        let mut a = Epic::new("a", None, GenerationMode::FullStory, vec![]);
        a.status = EpicStatus::Archived;
        let b = Epic::new("b", None, GenerationMode::FullStory, vec![]);
        store.insert(&a).await.unwrap();
        store.insert(&b).await.unwrap();

        let drafts = store
            .find(
                &EpicFilter {
                    status: Some(EpicStatus::Draft),
                },
                0,
                10,
            )
            .await
            .unwrap();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].title, "b");

        let all = store.find(&EpicFilter::default(), 0, 10).await.unwrap();
        assert_eq!(all.len(), 2);
        assert!(all[0].updated_at >= all[1].updated_at);
    }

    #[tokio::test]
    async fn post_filter_selects_unused_images() {
        let store = MemoryPostStore::new();
        let bare = Post::with_photo("https://img/1.png", vec!["sea".into()]);
        let mut written = Post::with_photo("https://img/2.png", vec!["sea".into()]);
        written.text_blocks.push(TextBlock::paragraph("text"));
        let bare_id = bare.id.clone();
        store.insert(bare).await;
        store.insert(written).await;

        let unused = store
            .find(
                &PostFilter {
                    has_photo: Some(true),
                    has_text: Some(false),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(unused.len(), 1);
        assert_eq!(unused[0].id, bare_id);
    }

    #[tokio::test]
    async fn post_patch_appends_without_rewriting() {
        let store = MemoryPostStore::new();
        let mut post = Post::with_photo("https://img/1.png", vec![]);
        post.text_blocks.push(TextBlock::paragraph("first"));
        let id = post.id.clone();
        store.insert(post).await;

        let patch = PostPatch {
            push_text_blocks: vec![TextBlock::paragraph("second")],
            ..Default::default()
        };
        assert!(store.update_one(&id, patch).await.unwrap());

        let updated = store.find_one(&id).await.unwrap().unwrap();
        assert_eq!(updated.text_blocks.len(), 2);
        assert_eq!(updated.text_blocks[0].content, "first");
        assert_eq!(updated.text_blocks[1].content, "second");
    }
}
