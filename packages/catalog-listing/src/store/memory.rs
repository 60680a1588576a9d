//! In-memory [`CatalogStore`] implementation backed by [`DashMap`].
//!
//! Emulates a document store with forward-only keyset pagination: every
//! fetch takes a snapshot, filters it, sorts by `order`, and seeks past the
//! anchor. Cursor tokens are [`KeysetToken`]s tagged with the filter's
//! fingerprint, so a token replayed under another filter is rejected.

use std::path::Path;

use anyhow::Context as _;
use async_trait::async_trait;
use catalog_core::{CursorToken, FilterPredicate, Item, KeysetToken};
use dashmap::DashMap;

use crate::error::StoreError;
use crate::traits::{CatalogStore, FetchedPage, PageAnchor, PageRequest};

/// In-memory catalog keyed by item id.
pub struct MemoryCatalogStore {
    entries: DashMap<String, Item>,
}

impl MemoryCatalogStore {
    /// Creates a new, empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Creates a store pre-populated with `items`. Later duplicates of an id
    /// replace earlier ones.
    #[must_use]
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        for item in items {
            store.insert(item);
        }
        store
    }

    /// Loads a JSON array of items from `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a JSON array of
    /// items.
    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading catalog file {}", path.display()))?;
        let items: Vec<Item> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing catalog file {}", path.display()))?;
        Ok(Self::from_items(items))
    }

    /// Insert or replace an item by id. Returns the previous item if any.
    pub fn insert(&self, item: Item) -> Option<Item> {
        self.entries.insert(item.id.clone(), item)
    }

    pub fn remove(&self, id: &str) -> Option<Item> {
        self.entries.remove(id).map(|(_, item)| item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Matching items in ascending keyset order.
    fn sorted_matches(&self, filter: &FilterPredicate) -> Vec<Item> {
        let mut items: Vec<Item> = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        items.sort_by_key(|item| item.order);
        items
    }

    fn decode_anchor(filter: &FilterPredicate, token: &CursorToken) -> Result<i64, StoreError> {
        let decoded = KeysetToken::decode(token)
            .map_err(|err| StoreError::InvalidCursor(err.to_string()))?;
        if decoded.fingerprint != filter.fingerprint() {
            return Err(StoreError::InvalidCursor(
                "cursor was issued under a different filter".to_string(),
            ));
        }
        Ok(decoded.order)
    }
}

impl Default for MemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CatalogStore for MemoryCatalogStore {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError> {
        let matches = self.sorted_matches(&request.filter);

        let start = match &request.anchor {
            PageAnchor::Start => 0,
            PageAnchor::After(token) => {
                let order = Self::decode_anchor(&request.filter, token)?;
                matches.partition_point(|item| item.order <= order)
            }
            PageAnchor::From(token) => {
                let order = Self::decode_anchor(&request.filter, token)?;
                matches.partition_point(|item| item.order < order)
            }
        };

        let items: Vec<Item> = matches
            .into_iter()
            .skip(start)
            .take(request.page_size)
            .collect();

        let fingerprint = request.filter.fingerprint();
        let token_for = |item: &Item| {
            KeysetToken {
                fingerprint,
                order: item.order,
            }
            .encode()
        };

        Ok(FetchedPage {
            last_item_cursor: items.last().map(token_for),
            first_item_marker: items.first().map(token_for),
            items,
        })
    }

    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError> {
        let count = self
            .entries
            .iter()
            .filter(|entry| filter.matches(entry.value()))
            .count();
        Ok(count as u64)
    }
}
