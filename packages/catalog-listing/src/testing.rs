//! Test doubles shared by the walker and controller tests.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use catalog_core::{FilterPredicate, Item};
use parking_lot::Mutex;

use crate::error::StoreError;
use crate::store::MemoryCatalogStore;
use crate::traits::{CatalogStore, FetchedPage, PageAnchor, PageRequest};

/// `n` items with orders 10, 20, ... and alternating levels.
pub(crate) fn catalog_items(n: i64) -> Vec<Item> {
    (1..=n)
        .map(|i| {
            let level = if i % 2 == 0 { "easy" } else { "hard" };
            Item::new(format!("p{i}"), i * 10, format!("Problem {i}"))
                .with_level(level)
                .with_category("arrays")
        })
        .collect()
}

/// Memory store wrapper that counts calls and injects failures and delays.
pub(crate) struct ScriptedStore {
    inner: MemoryCatalogStore,
    fetches: AtomicUsize,
    estimates: AtomicUsize,
    anchors: Mutex<Vec<PageAnchor>>,
    fetch_failures: Mutex<VecDeque<StoreError>>,
    fetch_delays: Mutex<VecDeque<Duration>>,
    estimate_failures: Mutex<VecDeque<StoreError>>,
    estimate_delays: Mutex<VecDeque<Duration>>,
    reject_cursors: AtomicUsize,
}

impl ScriptedStore {
    pub(crate) fn with_items(n: i64) -> Self {
        Self {
            inner: MemoryCatalogStore::from_items(catalog_items(n)),
            fetches: AtomicUsize::new(0),
            estimates: AtomicUsize::new(0),
            anchors: Mutex::new(Vec::new()),
            fetch_failures: Mutex::new(VecDeque::new()),
            fetch_delays: Mutex::new(VecDeque::new()),
            estimate_failures: Mutex::new(VecDeque::new()),
            estimate_delays: Mutex::new(VecDeque::new()),
            reject_cursors: AtomicUsize::new(0),
        }
    }

    pub(crate) fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    pub(crate) fn estimate_count_calls(&self) -> usize {
        self.estimates.load(Ordering::SeqCst)
    }

    pub(crate) fn anchors(&self) -> Vec<PageAnchor> {
        self.anchors.lock().clone()
    }

    pub(crate) fn fail_next_fetch(&self, err: StoreError) {
        self.fetch_failures.lock().push_back(err);
    }

    pub(crate) fn delay_next_fetch(&self, delay: Duration) {
        self.fetch_delays.lock().push_back(delay);
    }

    pub(crate) fn fail_next_estimate(&self, err: StoreError) {
        self.estimate_failures.lock().push_back(err);
    }

    pub(crate) fn delay_next_estimate(&self, delay: Duration) {
        self.estimate_delays.lock().push_back(delay);
    }

    /// The next `n` fetches anchored on a token are rejected as invalid.
    pub(crate) fn reject_next_cursors(&self, n: usize) {
        self.reject_cursors.store(n, Ordering::SeqCst);
    }

    pub(crate) fn store(&self) -> &MemoryCatalogStore {
        &self.inner
    }
}

#[async_trait]
impl CatalogStore for ScriptedStore {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, StoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);
        self.anchors.lock().push(request.anchor.clone());

        let delay = self.fetch_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.fetch_failures.lock().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        if !matches!(request.anchor, PageAnchor::Start)
            && self
                .reject_cursors
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        {
            return Err(StoreError::InvalidCursor("expired".to_string()));
        }

        self.inner.fetch_page(request).await
    }

    async fn estimate_count(&self, filter: &FilterPredicate) -> Result<u64, StoreError> {
        self.estimates.fetch_add(1, Ordering::SeqCst);

        let delay = self.estimate_delays.lock().pop_front();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.estimate_failures.lock().pop_front();
        if let Some(err) = failure {
            return Err(err);
        }

        self.inner.estimate_count(filter).await
    }
}
