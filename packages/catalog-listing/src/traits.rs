use std::sync::Arc;

use async_trait::async_trait;
use catalog_core::{AccessTier, CursorToken, FilterPredicate, Item};

use crate::error::StoreError;

/// Where a page fetch starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAnchor {
    /// Fresh query start (page 1).
    Start,
    /// Strictly after the item a forward cursor points at.
    After(CursorToken),
    /// At (inclusive) the item a first-item marker points at.
    From(CursorToken),
}

/// A single windowed fetch against the store.
#[derive(Debug, Clone)]
pub struct PageRequest {
    pub filter: FilterPredicate,
    pub anchor: PageAnchor,
    pub page_size: usize,
}

/// Result of a windowed fetch.
#[derive(Debug, Clone, Default)]
pub struct FetchedPage {
    /// Items in ascending keyset order, at most `page_size` of them.
    pub items: Vec<Item>,
    /// Resumes after the last returned item. `None` for an empty page.
    pub last_item_cursor: Option<CursorToken>,
    /// Inclusive anchor at the first returned item. `None` for an empty page.
    pub first_item_marker: Option<CursorToken>,
}

/// Remote document store exposing forward-only keyset pagination.
///
/// Results for a fixed filter come back in stable ascending `order`. A
/// token is only valid for the filter it was issued under; stores report
/// anything else as [`StoreError::InvalidCursor`].
/// Implementations: in-memory (tests, CLI), remote document stores.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Fetch up to `request.page_size` items starting at `request.anchor`.
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError>;

    /// Count the items matching `filter`. May be approximate.
    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError>;
}

#[async_trait]
impl<S: CatalogStore + ?Sized> CatalogStore for Arc<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError> {
        (**self).fetch_page(request).await
    }

    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError> {
        (**self).estimate_count(filter).await
    }
}

/// Source of the caller's access tier, resolved once per listing session.
#[async_trait]
pub trait AuthProfile: Send + Sync {
    async fn access_tier(&self) -> anyhow::Result<AccessTier>;
}

/// Profile that always reports the same tier.
#[derive(Debug, Clone, Copy)]
pub struct StaticProfile(pub AccessTier);

#[async_trait]
impl AuthProfile for StaticProfile {
    async fn access_tier(&self) -> anyhow::Result<AccessTier> {
        Ok(self.0)
    }
}
