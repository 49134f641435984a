//! View controllers.
//!
//! Each controller subscribes to the [`PeriodStore`], owns its own
//! [`ViewCell`]s and issues its own fetches when the period changes. Fetches
//! run as tokio tasks on the runtime captured in [`ViewContext`]; their
//! responses go through [`ViewCell::finish`], so superseded responses never
//! reach the view. Dropping a controller drops its subscription.

pub mod alerts;
pub mod business;
pub mod cell;
pub mod heatmap;
pub mod national;
pub mod results;

use std::future::Future;
use std::sync::Arc;

use tokio::runtime::Handle;

use crate::client::AnalyticsClient;
use crate::period::PeriodCode;
use crate::store::PeriodStore;
use crate::types::{DashboardError, DashboardResult};

pub use alerts::AlertsView;
pub use business::{BusinessView, Selection, DEFAULT_INDICATOR};
pub use cell::{CellStatus, Outcome, RequestTag, ViewCell, ViewState};
pub use heatmap::{HeatmapData, HeatmapView};
pub use national::{NationalView, TOTAL_TAB};
pub use results::ResultsTableView;

/// What every view controller needs: the store, the client and a runtime.
#[derive(Clone)]
pub struct ViewContext {
    pub store: Arc<PeriodStore>,
    pub client: Arc<dyn AnalyticsClient>,
    runtime: Handle,
}

impl ViewContext {
    pub fn new(store: Arc<PeriodStore>, client: Arc<dyn AnalyticsClient>, runtime: Handle) -> Self {
        Self {
            store,
            client,
            runtime,
        }
    }

    /// Use the runtime the caller is running on.
    pub fn current(
        store: Arc<PeriodStore>,
        client: Arc<dyn AnalyticsClient>,
    ) -> DashboardResult<Self> {
        let runtime = Handle::try_current()
            .map_err(|e| DashboardError::Config(format!("no tokio runtime: {e}")))?;
        Ok(Self::new(store, client, runtime))
    }

    /// Tag a request on `cell`, run `fetch` in the background and hand the
    /// result back to the cell together with the period selected by then.
    pub(crate) fn spawn_tagged<T, Fut>(&self, cell: &Arc<ViewCell<T>>, code: PeriodCode, fetch: Fut)
    where
        T: Clone + Send + 'static,
        Fut: Future<Output = DashboardResult<T>> + Send + 'static,
    {
        let tag = cell.begin(code);
        let cell = Arc::clone(cell);
        let store = Arc::clone(&self.store);
        self.runtime.spawn(async move {
            let result = fetch.await;
            cell.finish(tag, store.current_code(), result);
        });
    }

    /// Run `load` for the period selected now, not the one delivered.
    ///
    /// Nested or concurrent selections can deliver notifications out of
    /// order. `load` must tag its requests before returning; it runs again
    /// while the selection moved underneath it, so the last tag issued is
    /// always for the selected period.
    pub(crate) fn follow_selection(&self, delivered: PeriodCode, load: impl Fn(PeriodCode)) {
        let mut code = self.store.current_code().unwrap_or(delivered);
        loop {
            load(code);
            match self.store.current_code() {
                Some(now) if now != code => {
                    tracing::debug!("selection moved to {now} while loading {code}");
                    code = now;
                }
                _ => return,
            }
        }
    }

    pub(crate) fn spawn<Fut>(&self, task: Fut)
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(task);
    }
}
