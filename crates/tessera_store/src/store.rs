//! Store trait definitions.

use crate::{Epic, EpicFilter, EpicId, EpicPatch, Post, PostFilter, PostId, PostPatch};
use tessera_error::TesseraResult;

/// Trait for pluggable epic document stores.
///
/// Listing order is always `updated_at` descending. Implementations are
/// expected to apply each patch atomically per call; cross-call
/// atomicity (and cross-store transactions) is not provided.
#[async_trait::async_trait]
pub trait EpicStore: Send + Sync {
    /// Insert a new epic document.
    async fn insert(&self, epic: &Epic) -> TesseraResult<()>;

    /// Fetch an epic by id.
    async fn find_one(&self, id: &EpicId) -> TesseraResult<Option<Epic>>;

    /// Apply a patch to an epic.
    ///
    /// Returns `false` when no document matched the id.
    async fn update_one(&self, id: &EpicId, patch: EpicPatch) -> TesseraResult<bool>;

    /// Delete an epic.
    ///
    /// Returns `false` when no document matched the id.
    async fn delete_one(&self, id: &EpicId) -> TesseraResult<bool>;

    /// List epics matching the filter, sorted by `updated_at` descending.
    async fn find(
        &self,
        filter: &EpicFilter,
        skip: usize,
        limit: usize,
    ) -> TesseraResult<Vec<Epic>>;

    /// Count epics matching the filter.
    async fn count(&self, filter: &EpicFilter) -> TesseraResult<u64>;
}

/// Trait for the external post document store.
///
/// The pipeline only reads posts and appends to them; post creation and
/// deletion belong to the upload surface, which is outside the core.
#[async_trait::async_trait]
pub trait PostStore: Send + Sync {
    /// List posts matching the filter, bounded by `limit` when set.
    async fn find(&self, filter: &PostFilter, limit: Option<usize>) -> TesseraResult<Vec<Post>>;

    /// Fetch a post by id.
    async fn find_one(&self, id: &PostId) -> TesseraResult<Option<Post>>;

    /// Apply a patch to a post.
    ///
    /// Returns `false` when no document matched the id.
    async fn update_one(&self, id: &PostId, patch: PostPatch) -> TesseraResult<bool>;
}
