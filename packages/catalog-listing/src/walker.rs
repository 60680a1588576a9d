//! Page walker: resolves "go to page P" against a forward-only store.
//!
//! The store can only answer "the page after cursor X". Reaching page P
//! therefore needs the cursor of page P - 1, and when that is not cached the
//! walker fetches every page between the deepest cached cursor below P and P
//! itself, one after another. Each step awaits the previous one because its
//! cursor comes from the previous result; this costs O(P - frontier) fetches
//! and cannot be parallelized.
//!
//! Pages already fetched under the current filter version are served from the
//! [`NavigationCache`] without touching the store. "Previous" pops the
//! [`BackStack`](catalog_core::BackStack) and re-fetches from the popped
//! first-item marker when the previous window is no longer cached.
//!
//! The access gate is consulted before any fetch: a locked page never reaches
//! the store.

use std::sync::Arc;

use catalog_core::{
    AccessGate, AccessVerdict, CursorCache, FilterPredicate, FilterVersion, LockReason,
    PageMarker, PageWindow,
};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::NavigationCache;
use crate::error::StoreError;
use crate::token::{RequestClock, RequestToken};
use crate::traits::{CatalogStore, FetchedPage, PageAnchor, PageRequest};

/// Snapshot of the request a walk runs on behalf of.
#[derive(Debug, Clone)]
pub struct WalkRequest {
    pub filter: FilterPredicate,
    pub version: FilterVersion,
    pub token: RequestToken,
}

/// Result of a walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalkOutcome {
    /// The page to show. `window.page_number` can be lower than requested
    /// when the collection ended first.
    Window { window: PageWindow, fetches: usize },
    /// The access gate vetoed the page. Nothing was fetched.
    Locked(LockReason),
    /// A newer request or filter version took over. Results fetched so far
    /// were cached if their version was still current.
    Superseded,
    /// "Previous" from page 1.
    AtStart,
}

/// Internal walk failures. Cursor misses are recovered, never surfaced.
#[derive(Debug)]
enum WalkError {
    CursorMiss { page: u32, source: StoreError },
    Store(StoreError),
}

enum Step {
    Landed(PageWindow),
    /// The collection ends at page `last`, before the target. Carries that
    /// page's window when this walk fetched it.
    EndsAt { last: u32, window: Option<PageWindow> },
    Superseded,
}

/// Walks the forward-only cursor chain on behalf of a listing.
pub struct PageWalker {
    store: Arc<dyn CatalogStore>,
    gate: AccessGate,
    page_size: usize,
    cache: Arc<Mutex<NavigationCache>>,
    clock: Arc<RequestClock>,
}

impl PageWalker {
    #[must_use]
    pub fn new(
        store: Arc<dyn CatalogStore>,
        gate: AccessGate,
        page_size: usize,
        cache: Arc<Mutex<NavigationCache>>,
        clock: Arc<RequestClock>,
    ) -> Self {
        Self {
            store,
            gate,
            page_size,
            cache,
            clock,
        }
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<Mutex<NavigationCache>> {
        &self.cache
    }

    #[must_use]
    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    /// Resolves page `target`, fetching only pages not already cached.
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] of the first failed fetch. A rejected
    /// cursor is retried once by re-walking from the last good page before it
    /// is reported.
    pub async fn go_to(&self, request: &WalkRequest, target: u32) -> Result<WalkOutcome, StoreError> {
        if let AccessVerdict::Locked { reason } = self.gate.can_access_page(target) {
            debug!(page = target, "page locked, no fetch issued");
            return Ok(WalkOutcome::Locked(reason));
        }

        let mut target = target.max(1);
        let mut fetches = 0;
        let mut recovered = false;

        loop {
            {
                let mut cache = self.cache.lock();
                if cache.version() != request.version {
                    return Ok(WalkOutcome::Superseded);
                }
                if let Some(last) = cache.last_page() {
                    target = target.min(last);
                }
                if let Some(window) = cache.window(target).cloned() {
                    cache.land(request.version, target);
                    return Ok(WalkOutcome::Window { window, fetches });
                }
            }

            match self.walk(request, target, &mut fetches).await {
                Ok(Step::Landed(window)) => return Ok(WalkOutcome::Window { window, fetches }),
                Ok(Step::EndsAt { last, window }) => {
                    debug!(requested = target, last, "collection ends before requested page");
                    if let Some(window) = window {
                        if !self.cache.lock().land(request.version, last) {
                            return Ok(WalkOutcome::Superseded);
                        }
                        return Ok(WalkOutcome::Window { window, fetches });
                    }
                    target = last;
                }
                Ok(Step::Superseded) => return Ok(WalkOutcome::Superseded),
                Err(WalkError::CursorMiss { page, source }) => {
                    if recovered {
                        return Err(source);
                    }
                    recovered = true;
                    warn!(page, error = %source, "cursor rejected, re-walking from last good page");
                    self.cache
                        .lock()
                        .forget_cursors_from(request.version, page.saturating_sub(1));
                }
                Err(WalkError::Store(err)) => return Err(err),
            }
        }
    }

    /// Moves one page back from `current`.
    ///
    /// Served from the window cache when possible, otherwise by a fetch
    /// anchored at the previous page's first-item marker, and as a last
    /// resort through [`PageWalker::go_to`].
    ///
    /// # Errors
    ///
    /// Returns the [`StoreError`] of a failed fetch. The back stack is left
    /// as it was.
    pub async fn go_back(&self, request: &WalkRequest, current: u32) -> Result<WalkOutcome, StoreError> {
        if current <= 1 {
            return Ok(WalkOutcome::AtStart);
        }
        let target = current - 1;
        if let AccessVerdict::Locked { reason } = self.gate.can_access_page(target) {
            return Ok(WalkOutcome::Locked(reason));
        }

        let (popped, marker) = {
            let mut cache = self.cache.lock();
            if cache.version() != request.version {
                return Ok(WalkOutcome::Superseded);
            }
            if let Some(window) = cache.window(target).cloned() {
                cache.land(request.version, target);
                return Ok(WalkOutcome::Window { window, fetches: 0 });
            }

            let back = cache.back_stack_mut();
            let popped = if back.peek().is_some_and(|top| top.page_number == current) {
                back.pop_back()
            } else {
                None
            };
            let marker = back
                .peek()
                .filter(|top| top.page_number == target)
                .cloned();
            (popped, marker)
        };

        let result = match marker {
            Some(marker) => match self.fetch_from_marker(request, marker).await {
                Err(err) if err.is_cursor_miss() => {
                    debug!(page = target, "marker rejected, falling back to cursor walk");
                    self.go_to(request, target).await
                }
                other => other,
            },
            None => self.go_to(request, target).await,
        };

        if result.is_err() {
            if let Some(marker) = popped {
                self.cache.lock().back_stack_mut().push_back(marker);
            }
        }
        result
    }

    async fn fetch_from_marker(
        &self,
        request: &WalkRequest,
        marker: PageMarker,
    ) -> Result<WalkOutcome, StoreError> {
        if !self.clock.is_latest(request.token) {
            return Ok(WalkOutcome::Superseded);
        }

        let page_number = marker.page_number;
        let fetched = self
            .store
            .fetch_page(&PageRequest {
                filter: request.filter.clone(),
                anchor: PageAnchor::From(marker.token),
                page_size: self.page_size,
            })
            .await?;
        if fetched.items.is_empty() {
            return Err(StoreError::InvalidCursor(format!(
                "marker for page {page_number} no longer resolves"
            )));
        }

        let FetchedPage {
            items,
            last_item_cursor,
            first_item_marker,
        } = fetched;
        let window = PageWindow::from_items(&self.gate, page_number, items, self.page_size);

        let mut cache = self.cache.lock();
        if !cache.record_fetch(request.version, &window, last_item_cursor, first_item_marker) {
            return Ok(WalkOutcome::Superseded);
        }
        cache.land(request.version, page_number);
        Ok(WalkOutcome::Window { window, fetches: 1 })
    }

    /// Where a walk toward `target` starts: the page to fetch first and its
    /// anchor.
    fn resume_point(cursors: &CursorCache, target: u32) -> (u32, PageAnchor) {
        if target <= 1 {
            return (1, PageAnchor::Start);
        }
        match cursors.nearest_below(target) {
            Some(cursor) => (cursor.page_number + 1, PageAnchor::After(cursor.token.clone())),
            None => (1, PageAnchor::Start),
        }
    }

    async fn walk(
        &self,
        request: &WalkRequest,
        target: u32,
        fetches: &mut usize,
    ) -> Result<Step, WalkError> {
        let (mut page, mut anchor) = {
            let cache = self.cache.lock();
            if cache.version() != request.version {
                return Ok(Step::Superseded);
            }
            Self::resume_point(cache.cursors(), target)
        };
        if page < target {
            debug!(from = page, to = target, "walking past cached cursor frontier");
        }
        let mut previous: Option<PageWindow> = None;

        loop {
            if !self.clock.is_latest(request.token) {
                debug!(page, token = %request.token, "request superseded mid-walk");
                return Ok(Step::Superseded);
            }

            let is_cursor_fetch = !matches!(anchor, PageAnchor::Start);
            let fetched = self
                .store
                .fetch_page(&PageRequest {
                    filter: request.filter.clone(),
                    anchor,
                    page_size: self.page_size,
                })
                .await
                .map_err(|err| {
                    if is_cursor_fetch && err.is_cursor_miss() {
                        WalkError::CursorMiss { page, source: err }
                    } else {
                        WalkError::Store(err)
                    }
                })?;
            *fetches += 1;

            let FetchedPage {
                items,
                last_item_cursor,
                first_item_marker,
            } = fetched;

            if items.is_empty() && page > 1 {
                // The previous page was full, but nothing follows it.
                let mut cache = self.cache.lock();
                if !cache.mark_last_page(request.version, page - 1) {
                    return Ok(Step::Superseded);
                }
                return Ok(Step::EndsAt {
                    last: page - 1,
                    window: previous,
                });
            }

            let window = PageWindow::from_items(&self.gate, page, items, self.page_size);
            let next_anchor = last_item_cursor.clone().map(PageAnchor::After);
            {
                let mut cache = self.cache.lock();
                if !cache.record_fetch(request.version, &window, last_item_cursor, first_item_marker) {
                    return Ok(Step::Superseded);
                }
                if page >= target {
                    cache.land(request.version, page);
                    return Ok(Step::Landed(window));
                }
            }

            match next_anchor {
                Some(next) if !window.is_last => anchor = next,
                _ => {
                    return Ok(Step::EndsAt {
                        last: page,
                        window: Some(window),
                    })
                }
            }
            previous = Some(window);
            page += 1;
        }
    }
}
