//! Filter predicate and its versioned state.
//!
//! Every cursor and back-stack marker is tagged with the [`FilterVersion`]
//! it was produced under. Mutating the predicate bumps the version, which
//! invalidates everything tagged with an older one.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::hash::hash_fields;
use crate::types::Item;

/// User-supplied listing predicate.
///
/// Empty strings are treated the same as absent fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterPredicate {
    /// Case-insensitive substring matched against title and tags.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub search: Option<String>,
    /// Exact (case-insensitive) category match.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub category: Option<String>,
    /// Exact (case-insensitive) level match.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<String>,
}

fn non_empty(field: Option<&String>) -> Option<&str> {
    field.map(|s| s.trim()).filter(|s| !s.is_empty())
}

impl FilterPredicate {
    /// Predicate that matches every item.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self
    }

    /// Whether `item` satisfies every set field of the predicate.
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        if let Some(search) = non_empty(self.search.as_ref()) {
            let needle = search.to_lowercase();
            let in_title = item.title.to_lowercase().contains(&needle);
            let in_tags = item
                .tags
                .iter()
                .any(|tag| tag.to_lowercase().contains(&needle));
            if !in_title && !in_tags {
                return false;
            }
        }

        if let Some(category) = non_empty(self.category.as_ref()) {
            match item.category.as_deref() {
                Some(c) if c.eq_ignore_ascii_case(category) => {}
                _ => return false,
            }
        }

        if let Some(level) = non_empty(self.level.as_ref()) {
            match item.level.as_deref() {
                Some(l) if l.eq_ignore_ascii_case(level) => {}
                _ => return false,
            }
        }

        true
    }

    /// Stable fingerprint of the normalized predicate.
    ///
    /// Two predicates that match the same items (modulo case and surrounding
    /// whitespace) share a fingerprint.
    #[must_use]
    pub fn fingerprint(&self) -> u64 {
        let search = non_empty(self.search.as_ref()).map(str::to_lowercase);
        let category = non_empty(self.category.as_ref()).map(str::to_ascii_lowercase);
        let level = non_empty(self.level.as_ref()).map(str::to_ascii_lowercase);
        hash_fields(&[search.as_deref(), category.as_deref(), level.as_deref()])
    }
}

/// Monotonic identity of a [`FilterState`] predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct FilterVersion(pub u64);

impl FilterVersion {
    #[must_use]
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for FilterVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// The current predicate plus its version.
#[derive(Debug, Clone, Default)]
pub struct FilterState {
    predicate: FilterPredicate,
    version: FilterVersion,
}

impl FilterState {
    /// Creates a state at version 0 for the given predicate.
    #[must_use]
    pub fn new(predicate: FilterPredicate) -> Self {
        Self {
            predicate,
            version: FilterVersion::default(),
        }
    }

    #[must_use]
    pub fn predicate(&self) -> &FilterPredicate {
        &self.predicate
    }

    #[must_use]
    pub fn version(&self) -> FilterVersion {
        self.version
    }

    /// Replaces the predicate and bumps the version.
    ///
    /// Always bumps, even when the new predicate equals the old one: callers
    /// use `set` as "start over from page 1".
    pub fn set(&mut self, predicate: FilterPredicate) -> FilterVersion {
        self.predicate = predicate;
        self.version = self.version.next();
        self.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn problem() -> Item {
        let mut item = Item::new("p1", 1, "Longest Palindromic Substring")
            .with_category("Strings")
            .with_level("Medium");
        item.tags = vec!["dynamic-programming".to_string()];
        item
    }

    #[test]
    fn empty_predicate_matches_everything() {
        assert!(FilterPredicate::all().matches(&problem()));
        let blank = FilterPredicate::all().with_search("  ").with_category("");
        assert!(blank.matches(&problem()));
    }

    #[test]
    fn search_matches_title_or_tags_case_insensitively() {
        assert!(FilterPredicate::all().with_search("palindromic").matches(&problem()));
        assert!(FilterPredicate::all().with_search("DYNAMIC").matches(&problem()));
        assert!(!FilterPredicate::all().with_search("graph").matches(&problem()));
    }

    #[test]
    fn category_and_level_are_exact() {
        let item = problem();
        assert!(FilterPredicate::all().with_category("strings").matches(&item));
        assert!(!FilterPredicate::all().with_category("string").matches(&item));
        assert!(FilterPredicate::all()
            .with_category("Strings")
            .with_level("medium")
            .matches(&item));
        assert!(!FilterPredicate::all().with_level("hard").matches(&item));
    }

    #[test]
    fn missing_item_field_fails_set_predicate() {
        let item = Item::new("x", 1, "Untitled");
        assert!(!FilterPredicate::all().with_category("arrays").matches(&item));
    }

    #[test]
    fn fingerprint_normalizes_case_and_whitespace() {
        let a = FilterPredicate::all().with_search(" Tree ").with_level("HARD");
        let b = FilterPredicate::all().with_search("tree").with_level("hard");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(
            FilterPredicate::all().fingerprint(),
            FilterPredicate::all().with_search("").fingerprint()
        );
        assert_ne!(
            FilterPredicate::all().with_category("tree").fingerprint(),
            FilterPredicate::all().with_search("tree").fingerprint()
        );
    }

    #[test]
    fn set_always_bumps_version() {
        let mut state = FilterState::default();
        assert_eq!(state.version(), FilterVersion(0));

        let v1 = state.set(FilterPredicate::all().with_search("sum"));
        assert_eq!(v1, FilterVersion(1));
        assert_eq!(state.predicate().search.as_deref(), Some("sum"));

        let v2 = state.set(FilterPredicate::all().with_search("sum"));
        assert_eq!(v2, FilterVersion(2));
    }
}
