//! Tracing middleware for store calls.
//!
//! Records call duration and outcome on an `info_span!` per call. Counting
//! and histograms are left to whatever subscriber is installed.

use std::time::Instant;

use async_trait::async_trait;
use catalog_core::FilterPredicate;
use tower::Layer;
use tracing::{info_span, Instrument};

use crate::error::StoreError;
use crate::traits::{CatalogStore, FetchedPage, PageAnchor, PageRequest};

// ---------------------------------------------------------------------------
// StoreTracingLayer
// ---------------------------------------------------------------------------

/// Tower layer that instruments store calls with timing spans.
#[derive(Debug, Clone, Copy, Default)]
pub struct StoreTracingLayer;

impl<S> Layer<S> for StoreTracingLayer {
    type Service = TracingStore<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingStore { inner }
    }
}

// ---------------------------------------------------------------------------
// TracingStore
// ---------------------------------------------------------------------------

/// Store wrapper that records call duration and outcome in tracing spans.
#[derive(Debug, Clone)]
pub struct TracingStore<S> {
    inner: S,
}

fn anchor_kind(anchor: &PageAnchor) -> &'static str {
    match anchor {
        PageAnchor::Start => "start",
        PageAnchor::After(_) => "after",
        PageAnchor::From(_) => "from",
    }
}

fn record_outcome<T>(call: &'static str, start: Instant, result: &Result<T, StoreError>) {
    #[allow(clippy::cast_possible_truncation)]
    let duration_ms = start.elapsed().as_millis() as u64;
    let outcome = match result {
        Ok(_) => "ok",
        Err(_) => "error",
    };

    tracing::Span::current().record("duration_ms", duration_ms);
    tracing::Span::current().record("outcome", outcome);

    match result {
        Ok(_) => tracing::debug!(call, duration_ms, outcome, "store call complete"),
        Err(err) => tracing::warn!(call, duration_ms, outcome, error = %err, "store call failed"),
    }
}

#[async_trait]
impl<S: CatalogStore> CatalogStore for TracingStore<S> {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError> {
        let span = info_span!(
            "store.fetch_page",
            anchor = anchor_kind(&request.anchor),
            page_size = request.page_size,
            items = tracing::field::Empty,
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.inner.fetch_page(request).await;
            if let Ok(page) = &result {
                tracing::Span::current().record("items", page.items.len());
            }
            record_outcome("fetch_page", start, &result);
            result
        }
        .instrument(span)
        .await
    }

    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError> {
        let span = info_span!(
            "store.estimate_count",
            duration_ms = tracing::field::Empty,
            outcome = tracing::field::Empty,
        );

        async move {
            let start = Instant::now();
            let result = self.inner.estimate_count(filter).await;
            record_outcome("estimate_count", start, &result);
            result
        }
        .instrument(span)
        .await
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
