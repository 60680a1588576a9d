//! Listing observer trait and composite implementation.
//!
//! Defines [`ListingObserver`], the renderer-facing hook notified after every
//! applied controller transition, and [`CompositeListingObserver`] which fans
//! out notifications to multiple observers.

use std::sync::Arc;

use catalog_core::{FilterVersion, LockReason};

use crate::controller::ListingSnapshot;
use crate::error::StoreError;
use crate::estimator::Estimate;

/// Observer for listing state transitions.
///
/// Called synchronously from the controller after its state lock has been
/// released. Stale responses never reach observers.
///
/// Used as `Arc<dyn ListingObserver>`.
pub trait ListingObserver: Send + Sync {
    /// Called after every applied transition with the resulting snapshot.
    fn on_snapshot(&self, snapshot: &ListingSnapshot);

    /// Called when a page change was vetoed by the access gate.
    fn on_upgrade_required(&self, _reason: &LockReason) {}

    /// Called when a store failure was surfaced.
    fn on_error(&self, _error: &StoreError) {}

    /// Called when a count estimate for the current filter arrives.
    fn on_estimate(&self, _estimate: &Estimate) {}

    /// Called when a filter change discarded all navigation state.
    fn on_filter_reset(&self, _version: FilterVersion) {}
}

/// Composite observer that fans out to multiple observers.
#[derive(Default)]
pub struct CompositeListingObserver {
    observers: Vec<Arc<dyn ListingObserver>>,
}

impl CompositeListingObserver {
    #[must_use]
    pub fn new(observers: Vec<Arc<dyn ListingObserver>>) -> Self {
        Self { observers }
    }

    /// Adds an observer after construction.
    pub fn add(&mut self, observer: Arc<dyn ListingObserver>) {
        self.observers.push(observer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.observers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.observers.is_empty()
    }
}

impl ListingObserver for CompositeListingObserver {
    fn on_snapshot(&self, snapshot: &ListingSnapshot) {
        for observer in &self.observers {
            observer.on_snapshot(snapshot);
        }
    }

    fn on_upgrade_required(&self, reason: &LockReason) {
        for observer in &self.observers {
            observer.on_upgrade_required(reason);
        }
    }

    fn on_error(&self, error: &StoreError) {
        for observer in &self.observers {
            observer.on_error(error);
        }
    }

    fn on_estimate(&self, estimate: &Estimate) {
        for observer in &self.observers {
            observer.on_estimate(estimate);
        }
    }

    fn on_filter_reset(&self, version: FilterVersion) {
        for observer in &self.observers {
            observer.on_filter_reset(version);
        }
    }
}
