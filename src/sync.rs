//! Response-recency tracking for interleaved asynchronous updates.
//!
//! Nothing in this crate runs in parallel, but several requests against the
//! same logical record may be outstanding at once and the transport gives no
//! completion-order guarantee. Each outstanding request takes a ticket from a
//! monotonically increasing per-record sequence; a response is applied only
//! if no newer response for that record has been applied already. Late
//! arrivals are discarded as no-ops instead of overwriting fresher state.

use std::collections::HashMap;
use std::hash::Hash;

/// Sequence number handed out by [`StaleGuard::begin`] and redeemed at
/// response time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Per-record monotonic sequence guard, keyed by record identity.
#[derive(Debug, Default)]
pub struct StaleGuard<K> {
    issued: HashMap<K, u64>,
    applied: HashMap<K, u64>,
}

impl<K: Eq + Hash + Clone> StaleGuard<K> {
    pub fn new() -> Self {
        Self {
            issued: HashMap::new(),
            applied: HashMap::new(),
        }
    }

    /// Take a ticket before issuing a request for `key`.
    pub fn begin(&mut self, key: K) -> Ticket {
        let seq = self.issued.entry(key).or_insert(0);
        *seq += 1;
        Ticket(*seq)
    }

    /// Redeem a ticket when its response arrives. Returns `true` if the
    /// response is the newest seen for `key` and should be applied; `false`
    /// means a newer response was already applied and this one is stale.
    pub fn commit(&mut self, key: &K, ticket: Ticket) -> bool {
        let applied = self.applied.entry(key.clone()).or_insert(0);
        if ticket.0 > *applied {
            *applied = ticket.0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_request_commits() {
        let mut guard = StaleGuard::new();
        let t = guard.begin(1i64);
        assert!(guard.commit(&1, t));
    }

    #[test]
    fn test_stale_response_discarded() {
        let mut guard = StaleGuard::new();
        let first = guard.begin(1i64);
        let second = guard.begin(1i64);
        // Newer request resolves first; the older response must be dropped.
        assert!(guard.commit(&1, second));
        assert!(!guard.commit(&1, first));
    }

    #[test]
    fn test_in_order_responses_both_apply() {
        let mut guard = StaleGuard::new();
        let first = guard.begin(1i64);
        let second = guard.begin(1i64);
        assert!(guard.commit(&1, first));
        assert!(guard.commit(&1, second));
    }

    #[test]
    fn test_records_are_independent() {
        let mut guard = StaleGuard::new();
        let a = guard.begin(1i64);
        let b = guard.begin(2i64);
        assert!(guard.commit(&2, b));
        assert!(guard.commit(&1, a));
    }

    #[test]
    fn test_duplicate_commit_is_stale() {
        let mut guard = StaleGuard::new();
        let t = guard.begin(1i64);
        assert!(guard.commit(&1, t));
        assert!(!guard.commit(&1, t));
    }
}
