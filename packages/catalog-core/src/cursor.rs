//! Forward cursors, back-stack markers, and their per-version caches.
//!
//! The store can only page forward, so navigation state is kept in two
//! independent append-only structures:
//!
//! - [`CursorCache`]: page number -> [`Cursor`] ("resume after the last item
//!   of page N"). Reaching page N > 1 requires the cursor of page N - 1.
//! - [`BackStack`]: ordered [`PageMarker`]s ("first item of page N"), popped
//!   to serve "Previous" without a reverse-order query.
//!
//! Both are scoped to a single [`FilterVersion`]. Writes tagged with another
//! version are rejected.

use std::collections::BTreeMap;
use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::filter::FilterVersion;

/// Opaque store-issued position token.
///
/// Consumers never inspect the contents. Only the store that issued a token
/// can interpret it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CursorToken(String);

impl CursorToken {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CursorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Errors from decoding a [`KeysetToken`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("cursor token is not valid base64")]
    Encoding,
    #[error("cursor token payload is malformed")]
    Malformed,
}

/// Decoded keyset position: the `order` of an item plus the fingerprint of
/// the filter the position was issued under.
///
/// Reference encoding for stores that paginate on a single integer key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeysetToken {
    pub fingerprint: u64,
    pub order: i64,
}

impl KeysetToken {
    #[must_use]
    pub fn encode(&self) -> CursorToken {
        let payload = format!("{:016x}:{}", self.fingerprint, self.order);
        CursorToken(URL_SAFE_NO_PAD.encode(payload))
    }

    /// Decodes a token produced by [`KeysetToken::encode`].
    ///
    /// # Errors
    ///
    /// Returns [`TokenError`] if the token is not base64 or does not carry a
    /// `fingerprint:order` payload.
    pub fn decode(token: &CursorToken) -> Result<Self, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.as_str())
            .map_err(|_| TokenError::Encoding)?;
        let payload = String::from_utf8(bytes).map_err(|_| TokenError::Malformed)?;
        let (fingerprint, order) = payload.split_once(':').ok_or(TokenError::Malformed)?;
        Ok(Self {
            fingerprint: u64::from_str_radix(fingerprint, 16).map_err(|_| TokenError::Malformed)?,
            order: order.parse().map_err(|_| TokenError::Malformed)?,
        })
    }
}

/// Forward cursor: resumes iteration after the last item of `page_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cursor {
    pub page_number: u32,
    pub version: FilterVersion,
    pub token: CursorToken,
}

/// Inclusive anchor at the first item of `page_number`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageMarker {
    pub page_number: u32,
    pub version: FilterVersion,
    pub token: CursorToken,
}

/// Page number -> forward cursor, scoped to one filter version.
#[derive(Debug, Default)]
pub struct CursorCache {
    version: FilterVersion,
    cursors: BTreeMap<u32, Cursor>,
}

impl CursorCache {
    #[must_use]
    pub fn new(version: FilterVersion) -> Self {
        Self {
            version,
            cursors: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn version(&self) -> FilterVersion {
        self.version
    }

    /// Cursor after the last item of `page_number`, if that page was fetched
    /// under the current version.
    #[must_use]
    pub fn get(&self, page_number: u32) -> Option<&Cursor> {
        self.cursors.get(&page_number)
    }

    /// Records a cursor. Returns `false` (and stores nothing) when the cursor
    /// belongs to another version.
    pub fn put(&mut self, cursor: Cursor) -> bool {
        if cursor.version != self.version {
            return false;
        }
        self.cursors.insert(cursor.page_number, cursor);
        true
    }

    /// Highest page whose cursor is cached, or 0 when empty.
    #[must_use]
    pub fn deepest_page(&self) -> u32 {
        self.cursors.keys().next_back().copied().unwrap_or(0)
    }

    /// Cached cursor with the highest page number below `page_number`.
    /// Walks toward `page_number` resume from here.
    #[must_use]
    pub fn nearest_below(&self, page_number: u32) -> Option<&Cursor> {
        self.cursors.range(..page_number).next_back().map(|(_, cursor)| cursor)
    }

    /// Drops every cursor for pages `>= page_number`.
    pub fn truncate_from(&mut self, page_number: u32) {
        self.cursors.retain(|&page, _| page < page_number);
    }

    pub fn clear(&mut self) {
        self.cursors.clear();
    }

    /// Clears and re-scopes the cache to `version`.
    pub fn reset(&mut self, version: FilterVersion) {
        self.clear();
        self.version = version;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cursors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cursors.is_empty()
    }
}

/// Stack of first-item markers along the current navigation path.
///
/// Page numbers are strictly increasing from bottom to top. The top is the
/// marker of the page currently shown, when known.
#[derive(Debug, Default)]
pub struct BackStack {
    version: FilterVersion,
    markers: Vec<PageMarker>,
}

impl BackStack {
    #[must_use]
    pub fn new(version: FilterVersion) -> Self {
        Self {
            version,
            markers: Vec::new(),
        }
    }

    #[must_use]
    pub fn version(&self) -> FilterVersion {
        self.version
    }

    /// Pushes a marker. Markers from another version, or at or below the
    /// current top, are rejected.
    pub fn push_back(&mut self, marker: PageMarker) -> bool {
        if marker.version != self.version {
            return false;
        }
        if self
            .markers
            .last()
            .is_some_and(|top| top.page_number >= marker.page_number)
        {
            return false;
        }
        self.markers.push(marker);
        true
    }

    pub fn pop_back(&mut self) -> Option<PageMarker> {
        self.markers.pop()
    }

    #[must_use]
    pub fn peek(&self) -> Option<&PageMarker> {
        self.markers.last()
    }

    /// Pops every marker for pages `> page_number`.
    pub fn truncate_above(&mut self, page_number: u32) {
        while self
            .markers
            .last()
            .is_some_and(|top| top.page_number > page_number)
        {
            self.markers.pop();
        }
    }

    pub fn clear(&mut self) {
        self.markers.clear();
    }

    /// Clears and re-scopes the stack to `version`.
    pub fn reset(&mut self, version: FilterVersion) {
        self.clear();
        self.version = version;
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
