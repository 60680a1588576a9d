//! Composes the store middleware into a single wrapped store.

use std::sync::Arc;

use tower::ServiceBuilder;

use super::{StoreTimeoutLayer, StoreTracingLayer};
use crate::config::ListingConfig;
use crate::traits::CatalogStore;

/// Wraps `store` with the configured middleware.
///
/// Layer order (outermost first):
/// 1. Tracing: one span per call, covering the timeout as well
/// 2. Timeout: only when `config.store_timeout` is set
pub fn build_store_pipeline<S>(store: S, config: &ListingConfig) -> Arc<dyn CatalogStore>
where
    S: CatalogStore + 'static,
{
    match config.store_timeout {
        Some(timeout) => Arc::new(
            ServiceBuilder::new()
                .layer(StoreTracingLayer)
                .layer(StoreTimeoutLayer::new(timeout))
                .service(store),
        ),
        None => Arc::new(ServiceBuilder::new().layer(StoreTracingLayer).service(store)),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use catalog_core::FilterPredicate;

    use super::*;
    use crate::error::StoreError;
    use crate::traits::{FetchedPage, PageAnchor, PageRequest};

    struct StalledStore;

    #[async_trait]
    impl CatalogStore for StalledStore {
        async fn fetch_page(&self, _request: &PageRequest) -> Result<FetchedPage, StoreError> {
            std::future::pending().await
        }

        async fn estimate_count(&self, _filter: &FilterPredicate) -> Result<u64, StoreError> {
            Ok(0)
        }
    }

    fn request() -> PageRequest {
        PageRequest {
            filter: FilterPredicate::all(),
            anchor: PageAnchor::Start,
            page_size: 5,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn pipeline_applies_configured_timeout() {
        let config = ListingConfig {
            store_timeout: Some(Duration::from_millis(100)),
            ..ListingConfig::default()
        };
        let store = build_store_pipeline(StalledStore, &config);
        let err = store.fetch_page(&request()).await.unwrap_err();
        assert_eq!(err, StoreError::Timeout { timeout_ms: 100 });
    }

    #[tokio::test]
    async fn pipeline_without_timeout_still_serves() {
        let config = ListingConfig {
            store_timeout: None,
            ..ListingConfig::default()
        };
        let store = build_store_pipeline(StalledStore, &config);
        assert_eq!(store.estimate_count(&FilterPredicate::all()).await, Ok(0));
    }
}
