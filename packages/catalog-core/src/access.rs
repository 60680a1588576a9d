//! Two-level access gate for tiered catalog content.
//!
//! Pages past `free_page_limit` are locked for non-privileged callers, and
//! independently, rows whose global index is at or past `free_row_limit` are
//! locked. A page can therefore be fetchable while some of its rows stay
//! locked. The gate is a pure function of its inputs and never performs I/O.

use serde::{Deserialize, Serialize};

use crate::types::AccessTier;

/// Free-tier limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPolicy {
    /// Pages `1..=free_page_limit` are open to every tier.
    pub free_page_limit: u32,
    /// Rows with global index `< free_row_limit` are open to every tier.
    pub free_row_limit: u64,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self {
            free_page_limit: 3,
            free_row_limit: 50,
        }
    }
}

/// Why a page or row is locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LockReason {
    /// The page lies past the free page limit.
    #[serde(rename_all = "camelCase")]
    LockedPage { page_number: u32, free_page_limit: u32 },
    /// The row lies past the free row limit.
    #[serde(rename_all = "camelCase")]
    LockedRow { global_index: u64, free_row_limit: u64 },
}

/// Outcome of an access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "camelCase")]
pub enum AccessVerdict {
    Allowed,
    Locked { reason: LockReason },
}

impl AccessVerdict {
    #[must_use]
    pub fn is_allowed(&self) -> bool {
        matches!(self, AccessVerdict::Allowed)
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        !self.is_allowed()
    }
}

/// Access gate bound to one caller tier and page size.
#[derive(Debug, Clone, Copy)]
pub struct AccessGate {
    policy: AccessPolicy,
    tier: AccessTier,
    page_size: usize,
}

impl AccessGate {
    #[must_use]
    pub fn new(policy: AccessPolicy, tier: AccessTier, page_size: usize) -> Self {
        Self {
            policy,
            tier,
            page_size,
        }
    }

    #[must_use]
    pub fn tier(&self) -> AccessTier {
        self.tier
    }

    #[must_use]
    pub fn policy(&self) -> AccessPolicy {
        self.policy
    }

    /// Page-level check. Locked pages must never be fetched.
    #[must_use]
    pub fn can_access_page(&self, page_number: u32) -> AccessVerdict {
        if page_number <= self.policy.free_page_limit || self.tier.is_privileged() {
            AccessVerdict::Allowed
        } else {
            AccessVerdict::Locked {
                reason: LockReason::LockedPage {
                    page_number,
                    free_page_limit: self.policy.free_page_limit,
                },
            }
        }
    }

    /// Row-level check by absolute position in the filtered collection.
    #[must_use]
    pub fn can_access_row(&self, global_index: u64) -> AccessVerdict {
        if global_index < self.policy.free_row_limit || self.tier.is_privileged() {
            AccessVerdict::Allowed
        } else {
            AccessVerdict::Locked {
                reason: LockReason::LockedRow {
                    global_index,
                    free_row_limit: self.policy.free_row_limit,
                },
            }
        }
    }

    /// Absolute index of row `row` (0-based) on page `page_number` (1-based).
    #[must_use]
    pub fn global_index(&self, page_number: u32, row: usize) -> u64 {
        u64::from(page_number.saturating_sub(1)) * self.page_size as u64 + row as u64
    }

    /// Row verdicts for the first `count` rows of a page.
    #[must_use]
    pub fn row_verdicts(&self, page_number: u32, count: usize) -> Vec<(u64, AccessVerdict)> {
        (0..count)
            .map(|row| {
                let global_index = self.global_index(page_number, row);
                (global_index, self.can_access_row(global_index))
            })
            .collect()
    }
}
