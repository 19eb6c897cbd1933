//! Revoked-token registry
//!
//! Tokens are remembered by their BLAKE3 fingerprint. Each entry carries an
//! eviction deadline; after it passes the token is expired anyway, so
//! `purge_expired` can drop the entry without readmitting anything.

use parking_lot::RwLock;
use serde::Serialize;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Result of a revoke call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeOutcome {
    pub already_revoked: bool,
}

#[derive(Debug, Clone, Copy)]
struct RevocationEntry {
    revoked_at: u64,
    evict_after: u64,
}

#[derive(Debug, Default)]
pub struct RevocationRegistry {
    entries: RwLock<HashMap<blake3::Hash, RevocationEntry>>,
}

impl RevocationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `token` as revoked until at least `evict_after` (unix seconds).
    ///
    /// Revoking a token twice is not an error; the second call reports
    /// `already_revoked` and leaves the original entry untouched.
    pub fn revoke(&self, token: &str, evict_after: u64) -> RevokeOutcome {
        self.revoke_at(token, evict_after, crate::auth::unix_now())
    }

    pub fn revoke_at(&self, token: &str, evict_after: u64, now: u64) -> RevokeOutcome {
        let fingerprint = fingerprint(token);
        let mut entries = self.entries.write();

        match entries.entry(fingerprint) {
            Entry::Occupied(_) => RevokeOutcome { already_revoked: true },
            Entry::Vacant(slot) => {
                slot.insert(RevocationEntry {
                    revoked_at: now,
                    evict_after,
                });
                RevokeOutcome { already_revoked: false }
            }
        }
    }

    /// Membership test
    pub fn is_revoked(&self, token: &str) -> bool {
        self.entries.read().contains_key(&fingerprint(token))
    }

    /// When `token` was revoked, if it is
    pub fn revoked_at(&self, token: &str) -> Option<u64> {
        self.entries.read().get(&fingerprint(token)).map(|e| e.revoked_at)
    }

    /// Drop entries whose deadline is strictly before `now`. Returns how many were dropped.
    pub fn purge_expired(&self, now: u64) -> usize {
        let mut entries = self.entries.write();
        let before = entries.len();
        entries.retain(|_, entry| entry.evict_after >= now);
        before - entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

fn fingerprint(token: &str) -> blake3::Hash {
    blake3::hash(token.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_second_revoke_reports_already_revoked() {
        let registry = RevocationRegistry::new();

        assert!(!registry.is_revoked("tok"));
        assert_eq!(registry.revoke("tok", u64::MAX), RevokeOutcome { already_revoked: false });
        assert!(registry.is_revoked("tok"));
        assert_eq!(registry.revoke("tok", u64::MAX), RevokeOutcome { already_revoked: true });
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_repeat_revoke_keeps_first_entry() {
        let registry = RevocationRegistry::new();
        registry.revoke_at("tok", 100, 10);
        registry.revoke_at("tok", 5000, 20);

        assert_eq!(registry.revoked_at("tok"), Some(10));
        // the original deadline still applies
        assert_eq!(registry.purge_expired(101), 1);
    }

    #[test]
    fn test_purge_only_drops_past_deadlines() {
        let registry = RevocationRegistry::new();
        registry.revoke_at("old", 100, 0);
        registry.revoke_at("edge", 200, 0);
        registry.revoke_at("fresh", 300, 0);

        assert_eq!(registry.purge_expired(200), 1);
        assert!(!registry.is_revoked("old"));
        assert!(registry.is_revoked("edge"));
        assert!(registry.is_revoked("fresh"));

        assert_eq!(registry.purge_expired(1000), 2);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_distinct_tokens_do_not_collide() {
        let registry = RevocationRegistry::new();
        registry.revoke("token-a", u64::MAX);
        assert!(!registry.is_revoked("token-b"));
        assert!(!registry.is_revoked("token-a "));
    }

    #[test]
    fn test_concurrent_revoke_has_exactly_one_first_revocation() {
        let registry = Arc::new(RevocationRegistry::new());

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                thread::spawn(move || registry.revoke("shared-token", u64::MAX))
            })
            .collect();

        let first_revocations = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|outcome| !outcome.already_revoked)
            .count();

        assert_eq!(first_revocations, 1);
        assert!(registry.is_revoked("shared-token"));
    }

    #[test]
    fn test_concurrent_revoke_and_check_of_different_tokens() {
        let registry = Arc::new(RevocationRegistry::new());

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let registry = registry.clone();
                thread::spawn(move || {
                    for j in 0..100 {
                        registry.revoke(&format!("t-{}-{}", i, j), u64::MAX);
                    }
                })
            })
            .collect();
        let reader = {
            let registry = registry.clone();
            thread::spawn(move || {
                for _ in 0..1000 {
                    let _ = registry.is_revoked("t-0-0");
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        reader.join().unwrap();

        assert_eq!(registry.len(), 800);
    }
}
