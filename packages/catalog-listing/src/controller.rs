//! Listing controller: the state machine a catalog view drives.
//!
//! ```text
//! Idle -> Loading -> Ready | Locked | Error
//! Ready | Locked | Error -> Loading   (any page or filter change)
//! ```
//!
//! Every request takes a [`RequestToken`]; a response is applied only if its
//! token is still the latest when it arrives, so rapid filter edits never
//! render stale data. A page locked by the access gate never reaches the
//! store: the controller moves to `Locked`, keeps the previous window on
//! screen, and raises an upgrade prompt. A store failure moves to `Error`
//! and also keeps the previous window.
//!
//! State sits behind a `parking_lot::Mutex` that is never held across an
//! `.await`; observers are notified after the lock is released.

use std::sync::Arc;

use catalog_core::{
    AccessGate, AccessTier, AccessVerdict, FilterPredicate, FilterState, FilterVersion,
    LockReason, PageWindow,
};
use parking_lot::Mutex;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cache::NavigationCache;
use crate::config::ListingConfig;
use crate::error::{ConfigError, ListingError, StoreError};
use crate::estimator::{CountEstimator, Estimate};
use crate::observer::{CompositeListingObserver, ListingObserver};
use crate::store::build_store_pipeline;
use crate::token::{RequestClock, RequestToken};
use crate::traits::{AuthProfile, CatalogStore};
use crate::walker::{PageWalker, WalkOutcome, WalkRequest};

/// Lifecycle status of a listing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    #[default]
    Idle,
    Loading,
    Ready,
    Locked,
    Error,
}

/// Everything a renderer needs to draw the listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingSnapshot {
    pub status: ListingStatus,
    /// Page the window belongs to; 0 before the first page is shown.
    pub page: u32,
    pub window: Option<PageWindow>,
    pub total_pages_estimate: Option<u32>,
    pub total_items_estimate: Option<u64>,
    pub has_next: bool,
    pub has_previous: bool,
    /// Set while the last page request was vetoed by the access gate.
    pub upgrade_prompt: Option<LockReason>,
    pub last_error: Option<StoreError>,
    pub filter: FilterPredicate,
    pub version: FilterVersion,
    pub tier: AccessTier,
}

/// Result of a navigation request that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "camelCase")]
pub enum Navigation {
    /// The window for `page` is now shown. `fetches` store calls were made.
    Ready { page: u32, fetches: usize },
    /// The access gate vetoed the page; nothing was fetched.
    UpgradeRequired { reason: LockReason },
    /// Already on the last page.
    NoNextPage,
    /// Already on the first page.
    NoPreviousPage,
    /// A newer request took over; this result was discarded.
    Stale,
}

/// Request kept for [`ListingController::retry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Intent {
    /// Page 1 plus a count estimate for the current filter.
    FirstPage,
    GoTo(u32),
    Previous { from: u32 },
}

#[derive(Debug, Default)]
struct ListingState {
    status: ListingStatus,
    page: u32,
    window: Option<PageWindow>,
    estimate: Option<Estimate>,
    upgrade_prompt: Option<LockReason>,
    last_error: Option<StoreError>,
    filter: FilterState,
    failed: Option<Intent>,
}

/// Paginated, access-gated view over a [`CatalogStore`].
pub struct ListingController {
    tier: AccessTier,
    gate: AccessGate,
    walker: PageWalker,
    estimator: CountEstimator,
    clock: Arc<RequestClock>,
    state: Mutex<ListingState>,
    observers: CompositeListingObserver,
}

impl ListingController {
    /// Creates an idle controller over `store` for a caller of `tier`.
    ///
    /// The store is wrapped in the middleware pipeline configured by
    /// `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub fn new<S>(config: ListingConfig, store: S, tier: AccessTier) -> Result<Self, ConfigError>
    where
        S: CatalogStore + 'static,
    {
        config.validate()?;

        let store = build_store_pipeline(store, &config);
        let gate = AccessGate::new(config.access, tier, config.page_size);
        let clock = Arc::new(RequestClock::new());
        let filter = FilterState::default();
        let cache = Arc::new(Mutex::new(NavigationCache::new(
            filter.version(),
            config.window_cache_pages,
        )));

        Ok(Self {
            tier,
            gate,
            walker: PageWalker::new(store.clone(), gate, config.page_size, cache, clock.clone()),
            estimator: CountEstimator::new(store, config.page_size),
            clock,
            state: Mutex::new(ListingState {
                filter,
                ..ListingState::default()
            }),
            observers: CompositeListingObserver::default(),
        })
    }

    /// Creates a controller whose tier is resolved once from `auth`.
    ///
    /// A failed lookup falls back to [`AccessTier::Free`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when `config` fails validation.
    pub async fn from_profile<S>(
        config: ListingConfig,
        store: S,
        auth: &dyn AuthProfile,
    ) -> Result<Self, ConfigError>
    where
        S: CatalogStore + 'static,
    {
        let tier = match auth.access_tier().await {
            Ok(tier) => tier,
            Err(err) => {
                warn!(error = %err, "access tier lookup failed, using free tier");
                AccessTier::Free
            }
        };
        Self::new(config, store, tier)
    }

    /// Registers an observer notified after every applied transition.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ListingObserver>) -> Self {
        self.observers.add(observer);
        self
    }

    #[must_use]
    pub fn tier(&self) -> AccessTier {
        self.tier
    }

    /// Current snapshot of the listing.
    #[must_use]
    pub fn state(&self) -> ListingSnapshot {
        let state = self.state.lock();
        self.snapshot(&state)
    }

    /// Loads page 1 and the count estimate for the current filter.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Store`] when the page fetch fails. A failed
    /// estimate is logged and leaves the totals unknown.
    pub async fn mount(&self) -> Result<Navigation, ListingError> {
        info!(tier = ?self.tier, "mounting listing");
        self.run(Intent::FirstPage).await
    }

    /// Navigates to `page` (1-based).
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::InvalidPage`] for page 0 and
    /// [`ListingError::Store`] when a fetch fails.
    pub async fn go_to_page(&self, page: u32) -> Result<Navigation, ListingError> {
        if page == 0 {
            return Err(ListingError::InvalidPage(page));
        }
        self.run(Intent::GoTo(page)).await
    }

    /// Navigates one page forward, if a next page exists.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Store`] when the fetch fails.
    pub async fn go_next(&self) -> Result<Navigation, ListingError> {
        let page = {
            let state = self.state.lock();
            if !self.has_next(&state) {
                return Ok(Navigation::NoNextPage);
            }
            state.page
        };
        self.run(Intent::GoTo(page + 1)).await
    }

    /// Navigates one page back along the back stack.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Store`] when a re-fetch is needed and fails.
    pub async fn go_previous(&self) -> Result<Navigation, ListingError> {
        let page = self.state.lock().page;
        if page <= 1 {
            return Ok(Navigation::NoPreviousPage);
        }
        self.run(Intent::Previous { from: page }).await
    }

    /// Replaces the filter and starts over from page 1.
    ///
    /// Every call bumps the filter version and discards all cursors, markers
    /// and cached windows, even when `predicate` equals the current one.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::Store`] when the page 1 fetch fails.
    pub async fn set_filter(&self, predicate: FilterPredicate) -> Result<Navigation, ListingError> {
        let version = {
            let mut state = self.state.lock();
            info!(filter = ?predicate, "filter changed");
            let version = state.filter.set(predicate);
            self.walker.cache().lock().reset(version);

            state.status = ListingStatus::Loading;
            state.page = 1;
            state.window = None;
            state.estimate = None;
            state.upgrade_prompt = None;
            state.last_error = None;
            state.failed = None;
            version
        };
        self.observers.on_filter_reset(version);

        self.run(Intent::FirstPage).await
    }

    /// Re-issues the last request that failed with a store error.
    ///
    /// # Errors
    ///
    /// Returns [`ListingError::NothingToRetry`] when the last request did not
    /// fail, or the new store error.
    pub async fn retry(&self) -> Result<Navigation, ListingError> {
        let intent = {
            let state = self.state.lock();
            match (state.status, state.failed) {
                (ListingStatus::Error, Some(intent)) => intent,
                _ => return Err(ListingError::NothingToRetry),
            }
        };
        debug!(?intent, "retrying failed request");
        self.run(intent).await
    }

    async fn run(&self, intent: Intent) -> Result<Navigation, ListingError> {
        let target = match intent {
            Intent::FirstPage => 1,
            Intent::GoTo(page) => page,
            Intent::Previous { from } => from - 1,
        };

        // A vetoed page still supersedes anything in flight.
        let token = self.clock.issue();
        if let AccessVerdict::Locked { reason } = self.gate.can_access_page(target) {
            let navigation = self.apply_locked(reason);
            if intent == Intent::FirstPage {
                // Totals are still shown behind the upgrade prompt.
                let (filter, version) = {
                    let state = self.state.lock();
                    (state.filter.predicate().clone(), state.filter.version())
                };
                let estimate = self.estimator.estimate(&filter).await;
                self.apply_estimate(version, estimate);
            }
            return Ok(navigation);
        }

        let (request, snapshot) = {
            let mut state = self.state.lock();
            state.status = ListingStatus::Loading;
            state.upgrade_prompt = None;
            let request = WalkRequest {
                filter: state.filter.predicate().clone(),
                version: state.filter.version(),
                token,
            };
            (request, self.snapshot(&state))
        };
        self.observers.on_snapshot(&snapshot);
        debug!(page = target, token = %token, version = %request.version, "navigation started");

        let outcome = match intent {
            Intent::FirstPage => {
                let (outcome, estimate) = tokio::join!(
                    self.walker.go_to(&request, 1),
                    self.estimator.estimate(&request.filter)
                );
                self.apply_estimate(request.version, estimate);
                outcome
            }
            Intent::GoTo(page) => self.walker.go_to(&request, page).await,
            Intent::Previous { from } => self.walker.go_back(&request, from).await,
        };

        self.apply_outcome(intent, token, outcome)
    }

    fn apply_outcome(
        &self,
        intent: Intent,
        token: RequestToken,
        outcome: Result<WalkOutcome, StoreError>,
    ) -> Result<Navigation, ListingError> {
        let mut state = self.state.lock();
        if !self.clock.is_latest(token) {
            debug!(token = %token, "discarding stale response");
            return Ok(Navigation::Stale);
        }

        let navigation = match outcome {
            Ok(WalkOutcome::Window { window, fetches }) => {
                let page = window.page_number;
                state.page = page;
                state.window = Some(window);
                state.status = ListingStatus::Ready;
                state.last_error = None;
                state.failed = None;
                debug!(page, fetches, "page ready");
                Navigation::Ready { page, fetches }
            }
            Ok(WalkOutcome::Locked(reason)) => {
                drop(state);
                return Ok(self.apply_locked(reason));
            }
            Ok(WalkOutcome::Superseded) => return Ok(Navigation::Stale),
            Ok(WalkOutcome::AtStart) => {
                state.status = if state.window.is_some() {
                    ListingStatus::Ready
                } else {
                    ListingStatus::Idle
                };
                Navigation::NoPreviousPage
            }
            Err(err) => {
                warn!(error = %err, ?intent, "store request failed, keeping previous window");
                state.status = ListingStatus::Error;
                state.last_error = Some(err.clone());
                state.failed = Some(intent);
                let snapshot = self.snapshot(&state);
                drop(state);
                self.observers.on_error(&err);
                self.observers.on_snapshot(&snapshot);
                return Err(ListingError::Store(err));
            }
        };

        let snapshot = self.snapshot(&state);
        drop(state);
        self.observers.on_snapshot(&snapshot);
        Ok(navigation)
    }

    fn apply_locked(&self, reason: LockReason) -> Navigation {
        info!(?reason, "upgrade required");
        let snapshot = {
            let mut state = self.state.lock();
            state.status = ListingStatus::Locked;
            state.upgrade_prompt = Some(reason);
            self.snapshot(&state)
        };
        self.observers.on_upgrade_required(&reason);
        self.observers.on_snapshot(&snapshot);
        Navigation::UpgradeRequired { reason }
    }

    fn apply_estimate(&self, version: FilterVersion, estimate: Result<Estimate, StoreError>) {
        let estimate = match estimate {
            Ok(estimate) => estimate,
            Err(err) => {
                warn!(error = %err, version = %version, "count estimate failed");
                return;
            }
        };

        {
            let mut state = self.state.lock();
            if state.filter.version() != version {
                debug!(version = %version, "discarding estimate for superseded filter");
                return;
            }
            state.estimate = Some(estimate);
        }
        self.observers.on_estimate(&estimate);
    }

    /// Whether a page after the current one exists.
    ///
    /// Decided by the shown window and the known last page only. The count
    /// estimate is advisory and never consulted here.
    fn has_next(&self, state: &ListingState) -> bool {
        let Some(window) = &state.window else {
            return false;
        };
        !window.is_last && self.walker.cache().lock().last_page() != Some(state.page)
    }

    fn snapshot(&self, state: &ListingState) -> ListingSnapshot {
        ListingSnapshot {
            status: state.status,
            page: state.page,
            window: state.window.clone(),
            total_pages_estimate: state.estimate.map(|e| e.total_pages),
            total_items_estimate: state.estimate.map(|e| e.total_items),
            has_next: self.has_next(state),
            has_previous: state.window.is_some() && state.page > 1,
            upgrade_prompt: state.upgrade_prompt,
            last_error: state.last_error.clone(),
            filter: state.filter.predicate().clone(),
            version: state.filter.version(),
            tier: self.tier,
        }
    }
}
