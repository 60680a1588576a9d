//! Store backends and middleware.
//!
//! - [`memory`]: In-memory keyset store backed by `DashMap`
//! - [`middleware`]: Timeout and tracing layers composed with `tower`

pub mod memory;
pub mod middleware;

pub use memory::MemoryCatalogStore;
pub use middleware::build_store_pipeline;
