//! Catalog Core: items, filter state, forward cursors, and the access gate.

pub mod access;
pub mod cursor;
pub mod filter;
pub mod hash;
pub mod types;
pub mod window;

pub use access::{AccessGate, AccessPolicy, AccessVerdict, LockReason};
pub use cursor::{BackStack, Cursor, CursorCache, CursorToken, KeysetToken, PageMarker, TokenError};
pub use filter::{FilterPredicate, FilterState, FilterVersion};
pub use types::{AccessTier, Item};
pub use window::{PageWindow, Row};
