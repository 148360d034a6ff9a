//! Mutation-to-query invalidation bridge.
//!
//! Role data is cached under two views: the basic member list and an
//! enriched view decorated with per-member metadata. Both must become fresh
//! after a role mutation, but refetching both unconditionally doubles the
//! RPC load and risks the basic fetch overwriting the enriched back-fill.
//! The bridge decides, once and synchronously at mutation-success time, which
//! cache entries to mark dirty and whether to cancel one in-flight race. It
//! does no polling of its own.

use tracing::debug;

use crate::types::{AccessControlOp, Address, AffectedViews, QueryKey, QueryKind};

const INVALIDATION_TARGET: &str = "access_console::invalidation";

/// Seam to whatever query-caching layer the UI uses.
///
/// `mark_stale` must cause the next subscriber (or an active one) to refetch;
/// `cancel_in_flight` must abort a running fetch without erroring subscribers.
pub trait QueryCache: Send + Sync {
    /// Number of active consumers currently reading the cached query.
    fn observer_count(&self, key: &QueryKey) -> usize;

    fn cancel_in_flight(&self, key: &QueryKey);

    fn mark_stale(&self, key: &QueryKey);
}

/// Invalidates both role views after a role mutation.
///
/// When the enriched view has active observers its refetch will back-fill the
/// basic cache entry too, so a concurrently running basic fetch is cancelled
/// first; it would only race the enriched fetch and could overwrite it with
/// staler data. Without observers both views are simply marked stale and
/// whichever gains a subscriber first triggers its own fetch.
pub fn invalidate_role_views(cache: &dyn QueryCache, contract: &Address) {
    let basic = QueryKey::new(contract.clone(), QueryKind::Roles);
    let enriched = QueryKey::new(contract.clone(), QueryKind::EnrichedRoles);

    let enriched_observers = cache.observer_count(&enriched);
    if enriched_observers > 0 {
        debug!(
            target: INVALIDATION_TARGET,
            contract = %contract,
            observers = enriched_observers,
            "enriched view is live, cancelling in-flight basic fetch"
        );
        cache.cancel_in_flight(&basic);
    }
    cache.mark_stale(&basic);
    cache.mark_stale(&enriched);
}

/// Marks the views affected by a successful operation stale.
pub fn invalidate_after(cache: &dyn QueryCache, contract: &Address, op: &AccessControlOp) {
    debug!(
        target: INVALIDATION_TARGET,
        contract = %contract,
        operation = op.name(),
        "invalidating cached views"
    );
    match op.affected_views() {
        AffectedViews::Roles => invalidate_role_views(cache, contract),
        AffectedViews::Ownership => {
            cache.mark_stale(&QueryKey::new(contract.clone(), QueryKind::Ownership));
        }
        AffectedViews::Admin => {
            cache.mark_stale(&QueryKey::new(contract.clone(), QueryKind::Admin));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::types::RoleId;

    #[derive(Debug, PartialEq, Eq)]
    enum CacheCall {
        Cancel(QueryKind),
        MarkStale(QueryKind),
    }

    struct RecordingCache {
        enriched_observers: usize,
        calls: Mutex<Vec<CacheCall>>,
    }

    impl RecordingCache {
        fn with_enriched_observers(enriched_observers: usize) -> Self {
            Self {
                enriched_observers,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<CacheCall> {
            self.calls.lock().unwrap().drain(..).collect()
        }
    }

    impl QueryCache for RecordingCache {
        fn observer_count(&self, key: &QueryKey) -> usize {
            if key.kind == QueryKind::EnrichedRoles {
                self.enriched_observers
            } else {
                0
            }
        }

        fn cancel_in_flight(&self, key: &QueryKey) {
            self.calls.lock().unwrap().push(CacheCall::Cancel(key.kind));
        }

        fn mark_stale(&self, key: &QueryKey) {
            self.calls
                .lock()
                .unwrap()
                .push(CacheCall::MarkStale(key.kind));
        }
    }

    #[test]
    fn live_enriched_view_cancels_basic_fetch_before_marking_stale() {
        let cache = RecordingCache::with_enriched_observers(2);
        invalidate_role_views(&cache, &Address::new("0xABC"));
        assert_eq!(
            cache.calls(),
            vec![
                CacheCall::Cancel(QueryKind::Roles),
                CacheCall::MarkStale(QueryKind::Roles),
                CacheCall::MarkStale(QueryKind::EnrichedRoles),
            ]
        );
    }

    #[test]
    fn unobserved_enriched_view_skips_cancellation() {
        let cache = RecordingCache::with_enriched_observers(0);
        invalidate_role_views(&cache, &Address::new("0xABC"));
        assert_eq!(
            cache.calls(),
            vec![
                CacheCall::MarkStale(QueryKind::Roles),
                CacheCall::MarkStale(QueryKind::EnrichedRoles),
            ]
        );
    }

    #[test]
    fn ownership_and_admin_ops_mark_their_single_view() {
        let cache = RecordingCache::with_enriched_observers(1);
        let contract = Address::new("0xABC");

        invalidate_after(&cache, &contract, &AccessControlOp::AcceptOwnership);
        assert_eq!(cache.calls(), vec![CacheCall::MarkStale(QueryKind::Ownership)]);

        invalidate_after(&cache, &contract, &AccessControlOp::RollbackAdminDelay);
        assert_eq!(cache.calls(), vec![CacheCall::MarkStale(QueryKind::Admin)]);

        invalidate_after(
            &cache,
            &contract,
            &AccessControlOp::RevokeRole {
                role_id: RoleId::new("r"),
                account: Address::new("a"),
            },
        );
        assert_eq!(
            cache.calls(),
            vec![
                CacheCall::Cancel(QueryKind::Roles),
                CacheCall::MarkStale(QueryKind::Roles),
                CacheCall::MarkStale(QueryKind::EnrichedRoles),
            ]
        );
    }
}
