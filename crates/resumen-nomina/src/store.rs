//! Period store: the single shared "selected period" state.
//!
//! [`PeriodStore`] owns the catalog of selectable periods, the current
//! selection and the [`ViewSynchronizer`] that fans selection changes out to
//! the views. It is shared by `Arc`; nothing about it is global.
//!
//! Writers: [`PeriodStore::select`] (user action) and
//! [`PeriodStore::load_current`] (one-time bootstrap, only while unset).
//! Derived values are computed on every read.

use std::sync::{Arc, Mutex, MutexGuard};

use crate::client::AnalyticsClient;
use crate::period::{Period, PeriodCode};
use crate::sync::{Subscription, ViewSynchronizer};
use crate::types::{DashboardError, DashboardResult};

/// Snapshot of the store's state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PeriodState {
    /// Server-provided catalog, chronological.
    pub available: Vec<Period>,
    /// Unset until bootstrap completes.
    pub selected: Option<Period>,
}

impl PeriodState {
    pub fn prior(&self) -> Option<Period> {
        self.selected.map(|p| p.prior())
    }

    pub fn numeric_code(&self) -> Option<PeriodCode> {
        self.selected.map(|p| p.code())
    }
}

pub struct PeriodStore {
    state: Mutex<PeriodState>,
    sync: Arc<ViewSynchronizer>,
}

impl Default for PeriodStore {
    fn default() -> Self {
        Self::new()
    }
}

impl PeriodStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(PeriodState::default()),
            sync: Arc::new(ViewSynchronizer::new()),
        }
    }

    fn state(&self) -> MutexGuard<'_, PeriodState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self) -> PeriodState {
        self.state().clone()
    }

    pub fn available(&self) -> Vec<Period> {
        self.state().available.clone()
    }

    pub fn selected(&self) -> Option<Period> {
        self.state().selected
    }

    /// Prior period of the selection, if any.
    pub fn prior(&self) -> Option<Period> {
        self.state().prior()
    }

    /// Numeric code of the selection. `None` means "not bootstrapped yet".
    pub fn current_code(&self) -> Option<PeriodCode> {
        self.state().numeric_code()
    }

    /// Like [`current_code`](Self::current_code), as an encoding error.
    pub fn numeric_code(&self) -> DashboardResult<PeriodCode> {
        self.current_code()
            .ok_or_else(|| DashboardError::Encoding("no period selected".to_string()))
    }

    pub fn synchronizer(&self) -> &Arc<ViewSynchronizer> {
        &self.sync
    }

    /// Register a period-change callback; the returned guard unsubscribes on drop.
    pub fn subscribe<F>(&self, on_period_change: F) -> Subscription
    where
        F: Fn(PeriodCode) + Send + Sync + 'static,
    {
        let handle = self.sync.subscribe(on_period_change);
        Subscription::new(&self.sync, handle)
    }

    /// Select a period by label. Anything but an exact `YYYY-WW` label
    /// (surrounding whitespace included) is rejected and leaves the state
    /// unchanged. Re-selecting the current period notifies nobody.
    pub fn select(&self, label: &str) -> DashboardResult<Period> {
        let period = Period::parse(label)?;
        let changed = {
            let mut state = self.state();
            let changed = state.selected != Some(period);
            state.selected = Some(period);
            changed
        };

        if changed {
            tracing::info!("Selected period {period} (prior {})", period.prior());
            self.sync.notify(period.code());
        }
        Ok(period)
    }

    /// Re-broadcast the current selection so every view reloads.
    pub fn refresh(&self) -> DashboardResult<PeriodCode> {
        let code = self.numeric_code()?;
        self.sync.notify(code);
        Ok(code)
    }

    /// Load the catalog. On failure the previous catalog is kept.
    pub async fn load_catalog(&self, client: &dyn AnalyticsClient) -> DashboardResult<usize> {
        let labels = match client.periods().await {
            Ok(labels) => labels,
            Err(e) => {
                tracing::warn!("Period catalog unavailable, keeping previous: {e}");
                return Err(e);
            }
        };

        let mut periods = Vec::with_capacity(labels.len());
        for label in &labels {
            match Period::parse(label) {
                Ok(p) => periods.push(p),
                Err(e) => tracing::warn!("Skipping catalog entry: {e}"),
            }
        }

        let count = periods.len();
        self.state().available = periods;
        tracing::info!("Loaded {count} periods");
        Ok(count)
    }

    /// Fetch the server's current period and select it, but only if nothing
    /// is selected when the response arrives. Returns whether it was applied.
    pub async fn load_current(&self, client: &dyn AnalyticsClient) -> DashboardResult<bool> {
        let label = client.current_period().await.map_err(|e| {
            tracing::warn!("Current period unavailable: {e}");
            e
        })?;
        let period = Period::parse(label.trim())?;

        let applied = {
            let mut state = self.state();
            if state.selected.is_none() {
                state.selected = Some(period);
                true
            } else {
                false
            }
        };

        if applied {
            tracing::info!("Bootstrapped period {period}");
            self.sync.notify(period.code());
        } else {
            tracing::debug!("Keeping user selection over server period {period}");
        }
        Ok(applied)
    }

    /// Startup: catalog and current period, issued concurrently.
    pub async fn bootstrap(&self, client: &dyn AnalyticsClient) -> DashboardResult<Option<Period>> {
        // Catalog failures are logged inside load_catalog; the selection is what matters.
        let (_catalog, current) =
            futures::join!(self.load_catalog(client), self.load_current(client));
        match current {
            Err(e) if self.selected().is_none() => Err(e),
            _ => Ok(self.selected()),
        }
    }
}
