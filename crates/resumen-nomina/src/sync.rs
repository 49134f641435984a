//! View synchronizer: the subscription registry behind period fan-out.
//!
//! Every view controller registers a callback. When the selected period
//! changes, the [`PeriodStore`](crate::store::PeriodStore) calls
//! [`ViewSynchronizer::notify`], which invokes each live callback with the new
//! code in subscription order. Callbacks must not block: they start their own
//! async fetches and return.
//!
//! Callbacks run outside the registry lock, so a callback may subscribe or
//! unsubscribe without deadlocking.

use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::period::PeriodCode;

/// Callback invoked with the newly selected period code.
pub type PeriodCallback = Arc<dyn Fn(PeriodCode) + Send + Sync>;

/// Opaque identifier of one registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionHandle(u64);

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<(SubscriptionHandle, PeriodCallback)>,
}

/// Ordered list of period-change subscribers.
#[derive(Default)]
pub struct ViewSynchronizer {
    registry: Mutex<Registry>,
}

impl ViewSynchronizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn registry(&self) -> MutexGuard<'_, Registry> {
        self.registry.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register a callback and return its handle.
    pub fn subscribe<F>(&self, on_period_change: F) -> SubscriptionHandle
    where
        F: Fn(PeriodCode) + Send + Sync + 'static,
    {
        let mut registry = self.registry();
        let handle = SubscriptionHandle(registry.next_id);
        registry.next_id += 1;
        registry.entries.push((handle, Arc::new(on_period_change)));
        tracing::debug!("Subscriber {} registered", handle.0);
        handle
    }

    /// Remove a registration. Returns `false` if it was already gone.
    pub fn unsubscribe(&self, handle: SubscriptionHandle) -> bool {
        let mut registry = self.registry();
        let before = registry.entries.len();
        registry.entries.retain(|(h, _)| *h != handle);
        let removed = registry.entries.len() != before;
        if removed {
            tracing::debug!("Subscriber {} removed", handle.0);
        }
        removed
    }

    /// Invoke every live subscriber with `code`, in subscription order.
    pub fn notify(&self, code: PeriodCode) {
        let callbacks: Vec<PeriodCallback> = self
            .registry()
            .entries
            .iter()
            .map(|(_, cb)| Arc::clone(cb))
            .collect();

        tracing::debug!("Notifying {} subscribers of period {code}", callbacks.len());
        for callback in callbacks {
            callback(code);
        }
    }

    /// Number of live subscriptions.
    pub fn len(&self) -> usize {
        self.registry().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// RAII registration: unsubscribes when dropped, so a disposed view leaves
/// no callback behind.
pub struct Subscription {
    handle: SubscriptionHandle,
    synchronizer: Weak<ViewSynchronizer>,
}

impl Subscription {
    pub fn new(synchronizer: &Arc<ViewSynchronizer>, handle: SubscriptionHandle) -> Self {
        Self {
            handle,
            synchronizer: Arc::downgrade(synchronizer),
        }
    }

    pub fn handle(&self) -> SubscriptionHandle {
        self.handle
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(sync) = self.synchronizer.upgrade() {
            sync.unsubscribe(self.handle);
        }
    }
}
