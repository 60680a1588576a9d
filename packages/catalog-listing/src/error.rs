//! Error types crossing the store and controller boundaries.
//!
//! Access-policy verdicts and stale responses are not errors; they are
//! reported through [`Navigation`](crate::controller::Navigation). The only
//! failure the UI ever sees is a [`StoreError`], wrapped in [`ListingError`].

use serde::Serialize;

/// Failures reported by a [`CatalogStore`](crate::traits::CatalogStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "kind", content = "detail", rename_all = "camelCase")]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("query failed: {0}")]
    Query(String),
    #[error("store rejected credentials")]
    Unauthorized,
    #[error("store call timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
    /// The cursor was malformed or issued under another filter.
    #[error("cursor rejected by store: {0}")]
    InvalidCursor(String),
}

impl StoreError {
    /// Whether the walker can recover by discarding cached cursors.
    #[must_use]
    pub fn is_cursor_miss(&self) -> bool {
        matches!(self, StoreError::InvalidCursor(_))
    }
}

/// Errors returned from the listing controller's public surface.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ListingError {
    /// The store failed. The previously shown window is retained.
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid page number {0}: pages start at 1")]
    InvalidPage(u32),
    #[error("nothing to retry")]
    NothingToRetry,
}

/// Errors from listing configuration validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("page_size must be greater than zero")]
    ZeroPageSize,
    #[error("window_cache_pages must be greater than zero")]
    ZeroWindowCache,
}
