//! Post-mutation poll tracking.
//!
//! A submitted transaction can succeed on-chain before any RPC node the
//! console reads from reflects it. The [`MutationPollTracker`] bridges that
//! gap: the mutation layer records "a mutation just completed for contract X"
//! and every polling query then asks [`post_mutation_refetch_interval`] on
//! each tick whether to keep refetching. Polling stops as soon as one tracked
//! query returns a different data reference than the first post-mutation
//! fetch, or after a fixed safety window.
//!
//! "Different" means reference identity, never value equality: the data layer
//! is required to mint a fresh [`Arc`] on every successful fetch, so pointer
//! inequality is a cheap and correct proxy for "this fetch returned new
//! content". That contract is load-bearing; a caching layer that reuses
//! allocations for equal values breaks change detection entirely.
//!
//! [`post_mutation_refetch_interval`]: MutationPollTracker::post_mutation_refetch_interval

use std::{
    any::Any,
    collections::HashMap,
    sync::{
        Arc, Mutex, Weak,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use tracing::{debug, info};

use crate::types::{AccessControlOp, Address, AdminState, QueryKind};

const POLL_TARGET: &str = "access_console::poll";

/// Two recorder calls inside this window are treated as one logical mutation
/// cycle; the second call is discarded. Policy, not law.
pub const COLLAPSE_WINDOW: Duration = Duration::from_millis(1_000);

/// Upper bound on post-mutation polling. Past it the RPC is assumed to not
/// catch up within this cycle and the tracking entry is discarded.
pub const SAFETY_WINDOW: Duration = Duration::from_secs(30);

/// Fixed cadence while a post-mutation window is open.
pub const POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Admin polling once a pending deadline has passed (state flip imminent).
pub const ADMIN_POLL_FAST: Duration = Duration::from_secs(5);
/// Admin polling within [`ADMIN_NEAR_DEADLINE`] of a pending deadline.
pub const ADMIN_POLL_NEAR: Duration = Duration::from_secs(15);
/// Admin polling while a deadline is still far away.
pub const ADMIN_POLL_SLOW: Duration = Duration::from_secs(60);
/// How close to a deadline the near tier starts.
pub const ADMIN_NEAR_DEADLINE: Duration = Duration::from_secs(120);

/// A data reference as produced by the fetching layer.
pub type DataRef = Arc<dyn Any + Send + Sync>;

/// Millisecond clock behind the tracker, injectable for tests.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Wall-clock time via chrono.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        chrono::Utc::now().timestamp_millis().max(0) as u64
    }
}

/// One contract's "waiting for the RPC to catch up" window.
struct MutationPollState {
    /// Instant (ms) the mutation completed.
    timestamp: u64,
    /// First post-mutation data reference seen per query, the comparison
    /// baseline. Not a copy of the data.
    snapshots: HashMap<QueryKind, DataRef>,
    /// Ghost-render payload for the UI, if the recorder supplied one.
    preview: Option<AccessControlOp>,
}

/// Read-only view of a tracked entry, for tests and diagnostics.
#[derive(Clone, Debug)]
pub struct TrackedMutation {
    pub timestamp: u64,
    pub preview: Option<AccessControlOp>,
    pub snapshot_queries: Vec<QueryKind>,
}

type SubscriberFn = Arc<dyn Fn() + Send + Sync>;

/// Process-wide registry of post-mutation poll windows.
///
/// Constructed once at application start and shared by reference. All writes
/// go through its own methods; consumers only read via [`preview`] and
/// friends or trigger writes via [`record_mutation`]. Every write notifies
/// every subscriber synchronously and unconditionally; subscribers re-derive
/// their own slice.
///
/// [`preview`]: MutationPollTracker::preview
/// [`record_mutation`]: MutationPollTracker::record_mutation
pub struct MutationPollTracker {
    clock: Arc<dyn Clock>,
    entries: Mutex<HashMap<Address, MutationPollState>>,
    subscribers: Mutex<Vec<(u64, SubscriberFn)>>,
    next_subscriber_id: AtomicU64,
}

impl Default for MutationPollTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl MutationPollTracker {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            entries: Mutex::new(HashMap::new()),
            subscribers: Mutex::new(Vec::new()),
            next_subscriber_id: AtomicU64::new(0),
        }
    }

    /// Records that a mutation just completed for `contract`.
    ///
    /// A second call for the same contract within [`COLLAPSE_WINDOW`] is
    /// discarded entirely (the mutation layer records from both its call path
    /// and its success hook). Past the window a new entry replaces the old
    /// one with fresh snapshots; a missing preview falls back to the prior
    /// entry's preview.
    pub fn record_mutation(&self, contract: &Address, preview: Option<AccessControlOp>) {
        let now = self.clock.now_ms();
        {
            let mut entries = self.entries.lock().expect("poll registry poisoned");
            if let Some(existing) = entries.get(contract) {
                if now.saturating_sub(existing.timestamp) < COLLAPSE_WINDOW.as_millis() as u64 {
                    debug!(
                        target: POLL_TARGET,
                        contract = %contract,
                        "collapsing duplicate mutation record within {}ms window",
                        COLLAPSE_WINDOW.as_millis()
                    );
                    return;
                }
            }
            let prior_preview = entries.remove(contract).and_then(|state| state.preview);
            entries.insert(
                contract.clone(),
                MutationPollState {
                    timestamp: now,
                    snapshots: HashMap::new(),
                    preview: preview.or(prior_preview),
                },
            );
        }
        info!(
            target: POLL_TARGET,
            contract = %contract,
            "opened post-mutation poll window"
        );
        self.notify_subscribers();
    }

    /// Decides, on every poll tick of one query, whether to keep polling.
    ///
    /// Returns the next poll interval, or `None` to stop. In order:
    /// no tracked mutation; safety timeout (entry deleted); first
    /// post-mutation fetch not yet landed; snapshot capture; reference
    /// comparison against the snapshot. A single query observing a changed
    /// reference deletes the whole entry for the contract: one view catching
    /// up is taken as evidence the mutation has propagated.
    pub fn post_mutation_refetch_interval(
        &self,
        contract: &Address,
        query: QueryKind,
        current_data: Option<&DataRef>,
        data_updated_at: u64,
    ) -> Option<Duration> {
        let caught_up;
        {
            let mut entries = self.entries.lock().expect("poll registry poisoned");
            let entry = entries.get_mut(contract)?;

            let now = self.clock.now_ms();
            if now.saturating_sub(entry.timestamp) > SAFETY_WINDOW.as_millis() as u64 {
                entries.remove(contract);
                caught_up = false;
            } else if data_updated_at <= entry.timestamp {
                // The last successful fetch predates the mutation; whatever
                // data we hold is stale by construction.
                return Some(POLL_INTERVAL);
            } else {
                let current = match current_data {
                    Some(current) => current,
                    None => return Some(POLL_INTERVAL),
                };
                match entry.snapshots.get(&query) {
                    None => {
                        debug!(
                            target: POLL_TARGET,
                            contract = %contract,
                            query = query.as_str(),
                            "captured post-mutation baseline snapshot"
                        );
                        entry.snapshots.insert(query, Arc::clone(current));
                        return Some(POLL_INTERVAL);
                    }
                    Some(snapshot) if same_data(snapshot, current) => {
                        return Some(POLL_INTERVAL);
                    }
                    Some(_) => {
                        entries.remove(contract);
                        caught_up = true;
                    }
                }
            }
        }

        if caught_up {
            info!(
                target: POLL_TARGET,
                contract = %contract,
                query = query.as_str(),
                "post-mutation data changed, closing poll window"
            );
        } else {
            info!(
                target: POLL_TARGET,
                contract = %contract,
                "safety window elapsed, closing poll window"
            );
        }
        self.notify_subscribers();
        None
    }

    /// Layered refetch decision for admin data.
    ///
    /// The generic post-mutation logic wins when it wants to poll; otherwise,
    /// if the admin view carries a pending deadline, polling tightens as the
    /// deadline approaches. No deadline and no open window means no polling.
    pub fn admin_refetch_interval(
        &self,
        admin: Option<&Arc<AdminState>>,
        contract: &Address,
        data_updated_at: u64,
    ) -> Option<Duration> {
        let data = admin.map(|state| Arc::clone(state) as DataRef);
        if let Some(interval) = self.post_mutation_refetch_interval(
            contract,
            QueryKind::Admin,
            data.as_ref(),
            data_updated_at,
        ) {
            return Some(interval);
        }

        let deadline = admin?.next_deadline()?;
        let now_secs = self.clock.now_ms() / 1_000;
        let interval = if now_secs >= deadline {
            ADMIN_POLL_FAST
        } else if deadline - now_secs <= ADMIN_NEAR_DEADLINE.as_secs() {
            ADMIN_POLL_NEAR
        } else {
            ADMIN_POLL_SLOW
        };
        Some(interval)
    }

    /// The preview payload of the mutation currently tracked for `contract`.
    pub fn preview(&self, contract: &Address) -> Option<AccessControlOp> {
        self.entries
            .lock()
            .expect("poll registry poisoned")
            .get(contract)
            .and_then(|state| state.preview.clone())
    }

    /// Whether the UI should render an "awaiting update" placeholder.
    pub fn is_awaiting_update(&self, contract: &Address) -> bool {
        self.preview(contract).is_some()
    }

    /// Registers a subscriber notified synchronously on every state change.
    /// The subscription ends when the returned guard is dropped.
    pub fn subscribe(
        self: &Arc<Self>,
        callback: impl Fn() + Send + Sync + 'static,
    ) -> PollSubscription {
        let id = self.next_subscriber_id.fetch_add(1, Ordering::Relaxed);
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .push((id, Arc::new(callback)));
        PollSubscription {
            tracker: Arc::downgrade(self),
            id,
        }
    }

    /// Read access to a tracked entry. Test seam; UI code reads [`preview`]
    /// instead.
    ///
    /// [`preview`]: MutationPollTracker::preview
    pub fn tracked(&self, contract: &Address) -> Option<TrackedMutation> {
        self.entries
            .lock()
            .expect("poll registry poisoned")
            .get(contract)
            .map(|state| TrackedMutation {
                timestamp: state.timestamp,
                preview: state.preview.clone(),
                snapshot_queries: state.snapshots.keys().copied().collect(),
            })
    }

    /// Drops all tracked entries. Test seam.
    pub fn reset(&self) {
        self.entries.lock().expect("poll registry poisoned").clear();
        self.notify_subscribers();
    }

    fn notify_subscribers(&self) {
        // Clone the callback list out so a subscriber can subscribe or drop
        // its guard from inside the notification.
        let callbacks: Vec<SubscriberFn> = self
            .subscribers
            .lock()
            .expect("subscriber list poisoned")
            .iter()
            .map(|(_, callback)| Arc::clone(callback))
            .collect();
        for callback in callbacks {
            callback();
        }
    }

    fn unsubscribe(&self, id: u64) {
        self.subscribers
            .lock()
            .expect("subscriber list poisoned")
            .retain(|(subscriber_id, _)| *subscriber_id != id);
    }
}

/// Compares the data addresses of two references, ignoring vtables.
fn same_data(a: &DataRef, b: &DataRef) -> bool {
    std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
}

/// Guard for one reactive subscription; unregisters on drop.
pub struct PollSubscription {
    tracker: Weak<MutationPollTracker>,
    id: u64,
}

impl Drop for PollSubscription {
    fn drop(&mut self) {
        if let Some(tracker) = self.tracker.upgrade() {
            tracker.unsubscribe(self.id);
        }
    }
}
