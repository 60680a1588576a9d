//! Request tokens for last-request-wins ordering.
//!
//! Every navigation request takes a token from the shared [`RequestClock`].
//! A response is applied only if its token is still the latest one issued;
//! anything else is a stale response and is discarded on arrival.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity of a single navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestToken(u64);

impl RequestToken {
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RequestToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Monotonic issuer of [`RequestToken`]s.
#[derive(Debug, Default)]
pub struct RequestClock {
    latest: AtomicU64,
}

impl RequestClock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issues a new token, superseding every earlier one.
    pub fn issue(&self) -> RequestToken {
        RequestToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    #[must_use]
    pub fn is_latest(&self, token: RequestToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_monotonic() {
        let clock = RequestClock::new();
        let a = clock.issue();
        let b = clock.issue();
        assert!(b > a);
        assert_eq!(b.value(), 2);
    }

    #[test]
    fn only_the_newest_token_is_latest() {
        let clock = RequestClock::new();
        let first = clock.issue();
        assert!(clock.is_latest(first));

        let second = clock.issue();
        assert!(!clock.is_latest(first));
        assert!(clock.is_latest(second));
    }
}
