//! Timeout middleware for store calls.
//!
//! Converts a store call that exceeds its deadline into
//! `StoreError::Timeout`, so a hung fetch surfaces as a regular store error
//! instead of a listing stuck in `Loading`.

use std::time::Duration;

use async_trait::async_trait;
use catalog_core::FilterPredicate;
use tower::Layer;

use crate::error::StoreError;
use crate::traits::{CatalogStore, FetchedPage, PageRequest};

// ---------------------------------------------------------------------------
// StoreTimeoutLayer
// ---------------------------------------------------------------------------

/// Tower layer that wraps stores with a fixed per-call timeout.
#[derive(Debug, Clone, Copy)]
pub struct StoreTimeoutLayer {
    timeout: Duration,
}

impl StoreTimeoutLayer {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl<S> Layer<S> for StoreTimeoutLayer {
    type Service = TimeoutStore<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutStore {
            inner,
            timeout: self.timeout,
        }
    }
}

// ---------------------------------------------------------------------------
// TimeoutStore
// ---------------------------------------------------------------------------

/// Store wrapper that enforces the layer's timeout on every call.
#[derive(Debug, Clone)]
pub struct TimeoutStore<S> {
    inner: S,
    timeout: Duration,
}

impl<S> TimeoutStore<S> {
    fn timeout_error(&self) -> StoreError {
        StoreError::Timeout {
            timeout_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
        }
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogStore for TimeoutStore<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError> {
        match tokio::time::timeout(self.timeout, self.inner.fetch_page(request)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(self.timeout_error()),
        }
    }

    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError> {
        match tokio::time::timeout(self.timeout, self.inner.estimate_count(filter)).await {
            Ok(result) => result,
            Err(_elapsed) => Err(self.timeout_error()),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
