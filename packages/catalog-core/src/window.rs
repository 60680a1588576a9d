use serde::{Deserialize, Serialize};

use crate::access::{AccessGate, AccessVerdict};
use crate::types::Item;

/// One item of a page plus its row-level access verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Row {
    /// Absolute position in the filtered collection.
    pub global_index: u64,
    pub item: Item,
    pub access: AccessVerdict,
}

impl Row {
    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.access.is_locked()
    }
}

/// A page of items as handed to the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageWindow {
    pub page_number: u32,
    pub rows: Vec<Row>,
    /// At least one row of this window is row-locked.
    pub is_locked: bool,
    /// The fetch returned fewer than a full page; there is no next page.
    pub is_last: bool,
}

impl PageWindow {
    /// Builds a window from fetched items, tagging every row through `gate`.
    #[must_use]
    pub fn from_items(gate: &AccessGate, page_number: u32, items: Vec<Item>, page_size: usize) -> Self {
        let is_last = items.len() < page_size;
        let rows: Vec<Row> = items
            .into_iter()
            .enumerate()
            .map(|(row, item)| {
                let global_index = gate.global_index(page_number, row);
                Row {
                    global_index,
                    item,
                    access: gate.can_access_row(global_index),
                }
            })
            .collect();
        let is_locked = rows.iter().any(Row::is_locked);

        Self {
            page_number,
            rows,
            is_locked,
            is_last,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Items of rows the caller may see.
    pub fn visible_items(&self) -> impl Iterator<Item = &Item> {
        self.rows.iter().filter(|r| !r.is_locked()).map(|r| &r.item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::AccessPolicy;
    use crate::types::AccessTier;

    fn items(range: std::ops::Range<i64>) -> Vec<Item> {
        range
            .map(|i| Item::new(format!("item-{i}"), i, format!("Item {i}")))
            .collect()
    }

    #[test]
    fn short_page_is_last() {
        let gate = AccessGate::new(AccessPolicy::default(), AccessTier::Premium, 5);
        let full = PageWindow::from_items(&gate, 1, items(0..5), 5);
        assert!(!full.is_last);

        let short = PageWindow::from_items(&gate, 2, items(5..8), 5);
        assert!(short.is_last);
        assert_eq!(short.len(), 3);
        assert_eq!(short.rows[0].global_index, 5);
    }

    #[test]
    fn empty_window_is_last_and_unlocked() {
        let gate = AccessGate::new(AccessPolicy::default(), AccessTier::Free, 20);
        let window = PageWindow::from_items(&gate, 1, Vec::new(), 20);
        assert!(window.is_empty());
        assert!(window.is_last);
        assert!(!window.is_locked);
    }

    #[test]
    fn locked_rows_are_flagged_and_hidden() {
        let policy = AccessPolicy {
            free_page_limit: 3,
            free_row_limit: 3,
        };
        let gate = AccessGate::new(policy, AccessTier::Free, 5);
        let window = PageWindow::from_items(&gate, 1, items(0..5), 5);

        assert!(window.is_locked);
        let flags: Vec<bool> = window.rows.iter().map(Row::is_locked).collect();
        assert_eq!(flags, vec![false, false, false, true, true]);
        assert_eq!(window.visible_items().count(), 3);
    }
}
