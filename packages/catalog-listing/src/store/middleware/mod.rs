//! Tower layers wrapping a [`CatalogStore`](crate::traits::CatalogStore).
//!
//! - [`timeout`]: Per-call timeout, surfaced as `StoreError::Timeout`
//! - [`trace`]: Call timing and outcome via `tracing` spans
//! - [`pipeline`]: Composes the layers around a store

pub mod pipeline;
pub mod timeout;
pub mod trace;

pub use pipeline::build_store_pipeline;
pub use timeout::{StoreTimeoutLayer, TimeoutStore};
pub use trace::{StoreTracingLayer, TracingStore};
