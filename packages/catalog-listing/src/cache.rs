//! Per-filter-version navigation cache.
//!
//! Bundles everything the walker learns while fetching under one
//! [`FilterVersion`]:
//!
//! - forward cursors ([`CursorCache`]), one per fetched page
//! - first-item markers, one per fetched page, and the [`BackStack`] of
//!   markers along the current navigation path
//! - a bounded cache of fetched [`PageWindow`]s so revisits cost no fetch
//! - the last page, once a short or empty page has revealed it
//!
//! Every write carries the version it was produced under and is a no-op
//! when that version is no longer current. [`NavigationCache::reset`] is the
//! only way to move to a new version.

use std::collections::BTreeMap;

use catalog_core::{BackStack, Cursor, CursorCache, CursorToken, FilterVersion, PageMarker, PageWindow};

/// Navigation state scoped to a single filter version.
#[derive(Debug)]
pub struct NavigationCache {
    version: FilterVersion,
    cursors: CursorCache,
    markers: BTreeMap<u32, PageMarker>,
    back: BackStack,
    windows: BTreeMap<u32, PageWindow>,
    window_capacity: usize,
    last_page: Option<u32>,
}

impl NavigationCache {
    /// Creates an empty cache for `version` holding at most
    /// `window_capacity` windows (minimum one).
    #[must_use]
    pub fn new(version: FilterVersion, window_capacity: usize) -> Self {
        Self {
            version,
            cursors: CursorCache::new(version),
            markers: BTreeMap::new(),
            back: BackStack::new(version),
            windows: BTreeMap::new(),
            window_capacity: window_capacity.max(1),
            last_page: None,
        }
    }

    #[must_use]
    pub fn version(&self) -> FilterVersion {
        self.version
    }

    /// Discards everything and re-scopes the cache to `version`.
    pub fn reset(&mut self, version: FilterVersion) {
        tracing::debug!(
            from = %self.version,
            to = %version,
            cursors = self.cursors.len(),
            windows = self.windows.len(),
            "navigation cache reset"
        );
        self.version = version;
        self.cursors.reset(version);
        self.back.reset(version);
        self.markers.clear();
        self.windows.clear();
        self.last_page = None;
    }

    #[must_use]
    pub fn cursors(&self) -> &CursorCache {
        &self.cursors
    }

    #[must_use]
    pub fn back_stack(&self) -> &BackStack {
        &self.back
    }

    pub(crate) fn back_stack_mut(&mut self) -> &mut BackStack {
        &mut self.back
    }

    #[must_use]
    pub fn window(&self, page_number: u32) -> Option<&PageWindow> {
        self.windows.get(&page_number)
    }

    #[must_use]
    pub fn cached_window_count(&self) -> usize {
        self.windows.len()
    }

    /// Last page of the collection, once known.
    #[must_use]
    pub fn last_page(&self) -> Option<u32> {
        self.last_page
    }

    /// Records a successful fetch of `window.page_number`.
    ///
    /// Returns `false` without touching anything when `version` is stale.
    pub fn record_fetch(
        &mut self,
        version: FilterVersion,
        window: &PageWindow,
        last_item_cursor: Option<CursorToken>,
        first_item_marker: Option<CursorToken>,
    ) -> bool {
        if version != self.version {
            return false;
        }
        let page_number = window.page_number;

        if let Some(token) = last_item_cursor {
            self.cursors.put(Cursor {
                page_number,
                version,
                token,
            });
        }
        if let Some(token) = first_item_marker {
            self.markers.insert(
                page_number,
                PageMarker {
                    page_number,
                    version,
                    token,
                },
            );
        }
        // An empty page 1 is an empty collection; any other empty page is
        // handled by the walker, which marks the page before it.
        if window.is_last && (!window.is_empty() || page_number == 1) {
            self.mark_last_page(version, page_number);
        }

        self.windows.insert(page_number, window.clone());
        self.evict_around(page_number);
        true
    }

    /// Notes that `page_number` is the final page. Version-gated.
    pub fn mark_last_page(&mut self, version: FilterVersion, page_number: u32) -> bool {
        if version != self.version {
            return false;
        }
        self.last_page = Some(page_number);
        self.cursors.truncate_from(page_number + 1);
        true
    }

    /// Drops cursors for pages `>= page_number` after the store rejected one.
    ///
    /// Windows and markers stay: they describe data that was fetched
    /// successfully and remain valid for display.
    pub fn forget_cursors_from(&mut self, version: FilterVersion, page_number: u32) -> bool {
        if version != self.version {
            return false;
        }
        self.cursors.truncate_from(page_number);
        true
    }

    /// Aligns the back stack with landing on `page_number`: markers above it
    /// are popped and known markers up to it are pushed.
    pub fn land(&mut self, version: FilterVersion, page_number: u32) -> bool {
        if version != self.version {
            return false;
        }
        self.back.truncate_above(page_number);
        let from = self.back.peek().map_or(1, |top| top.page_number + 1);
        if from > page_number {
            return true;
        }
        for (_, marker) in self.markers.range(from..=page_number) {
            self.back.push_back(marker.clone());
        }
        true
    }

    /// Evicts the windows farthest from `anchor` until within capacity.
    fn evict_around(&mut self, anchor: u32) {
        while self.windows.len() > self.window_capacity {
            let first = self.windows.keys().next().copied();
            let last = self.windows.keys().next_back().copied();
            let victim = match (first, last) {
                (Some(first), Some(last)) if anchor - first >= last - anchor => first,
                (_, Some(last)) => last,
                _ => break,
            };
            self.windows.remove(&victim);
        }
    }
}

#[cfg(test)]
mod tests {
    use catalog_core::{AccessGate, AccessPolicy, AccessTier, Item};

    use super::*;

    const V0: FilterVersion = FilterVersion(0);
    const V1: FilterVersion = FilterVersion(1);

    fn window(page: u32, len: usize, page_size: usize) -> PageWindow {
        let gate = AccessGate::new(AccessPolicy::default(), AccessTier::Premium, page_size);
        let base = i64::from(page) * 100;
        let items = (0..len)
            .map(|i| {
                let order = base + i as i64;
                Item::new(format!("i{order}"), order, format!("Item {order}"))
            })
            .collect();
        PageWindow::from_items(&gate, page, items, page_size)
    }

    fn record(cache: &mut NavigationCache, version: FilterVersion, page: u32) -> bool {
        cache.record_fetch(
            version,
            &window(page, 2, 2),
            Some(CursorToken::new(format!("after-{page}"))),
            Some(CursorToken::new(format!("first-{page}"))),
        )
    }

    #[test]
    fn record_fetch_populates_cursor_marker_and_window() {
        let mut cache = NavigationCache::new(V0, 8);
        assert!(record(&mut cache, V0, 1));

        assert!(cache.cursors().get(1).is_some());
        assert!(cache.window(1).is_some());
        assert!(cache.last_page().is_none());
    }

    #[test]
    fn stale_version_writes_are_ignored() {
        let mut cache = NavigationCache::new(V0, 8);
        cache.reset(V1);

        assert!(!record(&mut cache, V0, 1));
        assert!(!cache.land(V0, 1));
        assert!(!cache.mark_last_page(V0, 1));
        assert!(cache.cursors().is_empty());
        assert!(cache.window(1).is_none());
    }

    #[test]
    fn reset_empties_everything() {
        let mut cache = NavigationCache::new(V0, 8);
        for page in 1..=3 {
            record(&mut cache, V0, page);
        }
        cache.land(V0, 3);
        cache.mark_last_page(V0, 3);

        cache.reset(V1);
        assert_eq!(cache.version(), V1);
        assert!(cache.cursors().is_empty());
        assert!(cache.back_stack().is_empty());
        assert_eq!(cache.cached_window_count(), 0);
        assert!(cache.last_page().is_none());
    }

    #[test]
    fn land_rebuilds_path_from_known_markers() {
        let mut cache = NavigationCache::new(V0, 8);
        for page in 1..=5 {
            record(&mut cache, V0, page);
        }

        cache.land(V0, 5);
        assert_eq!(cache.back_stack().len(), 5);

        cache.land(V0, 2);
        assert_eq!(cache.back_stack().peek().map(|m| m.page_number), Some(2));
        assert_eq!(cache.back_stack().len(), 2);

        cache.land(V0, 4);
        assert_eq!(cache.back_stack().peek().map(|m| m.page_number), Some(4));
        assert_eq!(cache.back_stack().len(), 4);
    }

    #[test]
    fn short_page_marks_last_and_drops_later_cursors() {
        let mut cache = NavigationCache::new(V0, 8);
        record(&mut cache, V0, 1);
        cache.record_fetch(
            V0,
            &window(2, 1, 2),
            Some(CursorToken::new("after-2")),
            Some(CursorToken::new("first-2")),
        );
        assert_eq!(cache.last_page(), Some(2));
    }

    #[test]
    fn empty_first_page_is_the_last_page() {
        let mut cache = NavigationCache::new(V0, 8);
        assert!(cache.record_fetch(V0, &window(1, 0, 2), None, None));
        assert_eq!(cache.last_page(), Some(1));
        assert!(cache.window(1).is_some());
    }

    #[test]
    fn window_eviction_keeps_pages_near_anchor() {
        let mut cache = NavigationCache::new(V0, 3);
        for page in 1..=5 {
            record(&mut cache, V0, page);
        }
        assert_eq!(cache.cached_window_count(), 3);
        assert!(cache.window(5).is_some());
        assert!(cache.window(4).is_some());
        assert!(cache.window(3).is_some());
        assert!(cache.window(1).is_none());

        // Cursors are never evicted.
        assert_eq!(cache.cursors().len(), 5);
    }

    #[test]
    fn forget_cursors_keeps_windows() {
        let mut cache = NavigationCache::new(V0, 8);
        for page in 1..=4 {
            record(&mut cache, V0, page);
        }
        assert!(cache.forget_cursors_from(V0, 2));
        assert_eq!(cache.cursors().deepest_page(), 1);
        assert!(cache.window(3).is_some());
    }
}
