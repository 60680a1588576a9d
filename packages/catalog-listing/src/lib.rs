//! Catalog Listing: cursor page walker, count estimator, and the listing controller.

pub mod cache;
pub mod config;
pub mod controller;
pub mod error;
pub mod estimator;
pub mod observer;
pub mod store;
pub mod token;
pub mod traits;
pub mod walker;

#[cfg(test)]
mod testing;

pub use cache::NavigationCache;
pub use config::ListingConfig;
pub use controller::{ListingController, ListingSnapshot, ListingStatus, Navigation};
pub use error::{ConfigError, ListingError, StoreError};
pub use estimator::{CountEstimator, Estimate};
pub use observer::{CompositeListingObserver, ListingObserver};
pub use store::{build_store_pipeline, MemoryCatalogStore};
pub use token::{RequestClock, RequestToken};
pub use traits::{AuthProfile, CatalogStore, FetchedPage, PageAnchor, PageRequest, StaticProfile};
pub use walker::{PageWalker, WalkOutcome, WalkRequest};
