//! Total count estimation, independent of the page walk.

use std::sync::Arc;

use catalog_core::FilterPredicate;
use serde::Serialize;

use crate::error::StoreError;
use crate::traits::CatalogStore;

/// Estimated size of a filtered collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Estimate {
    pub total_items: u64,
    pub total_pages: u32,
}

impl Estimate {
    /// Derives the page count for `total_items` at `page_size` items per page.
    #[must_use]
    pub fn from_count(total_items: u64, page_size: usize) -> Self {
        let page_size = page_size.max(1) as u64;
        let total_pages = total_items.div_ceil(page_size);
        Self {
            total_items,
            total_pages: u32::try_from(total_pages).unwrap_or(u32::MAX),
        }
    }
}

/// Queries the store's count endpoint and converts it to page totals.
///
/// Advisory only: whether a next page exists is decided by the walker from
/// the size of the last fetched page.
pub struct CountEstimator {
    store: Arc<dyn CatalogStore>,
    page_size: usize,
}

impl CountEstimator {
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, page_size: usize) -> Self {
        Self { store, page_size }
    }

    /// # Errors
    ///
    /// Returns the store's error unchanged.
    pub async fn estimate(&self, filter: &FilterPredicate) -> Result<Estimate, StoreError> {
        let total_items = self.store.estimate_count(filter).await?;
        Ok(Estimate::from_count(total_items, self.page_size))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedStore;

    #[test]
    fn page_count_rounds_up() {
        assert_eq!(Estimate::from_count(0, 20).total_pages, 0);
        assert_eq!(Estimate::from_count(1, 20).total_pages, 1);
        assert_eq!(Estimate::from_count(40, 20).total_pages, 2);
        assert_eq!(Estimate::from_count(41, 20).total_pages, 3);
    }

    #[tokio::test]
    async fn estimates_filtered_totals() {
        let store = Arc::new(ScriptedStore::with_items(45));
        let estimator = CountEstimator::new(store.clone(), 10);

        let all = estimator.estimate(&FilterPredicate::all()).await.unwrap();
        assert_eq!(
            all,
            Estimate {
                total_items: 45,
                total_pages: 5
            }
        );

        let easy = estimator
            .estimate(&FilterPredicate::all().with_level("easy"))
            .await
            .unwrap();
        assert_eq!(easy.total_items, 22);
        assert_eq!(easy.total_pages, 3);
        assert_eq!(store.estimate_count_calls(), 2);
    }

    #[tokio::test]
    async fn store_failure_is_returned() {
        let store = Arc::new(ScriptedStore::with_items(5));
        store.fail_next_estimate(StoreError::Unauthorized);
        let estimator = CountEstimator::new(store, 10);

        assert_eq!(
            estimator.estimate(&FilterPredicate::all()).await,
            Err(StoreError::Unauthorized)
        );
    }
}
