//! The assembled dashboard: one store, one client, every period-driven view.
//!
//! Views are attached in a fixed order (national, heat-map, results,
//! alerts), which is also the order they hear about a period change.
//! Business views are opened on demand and live as long as the caller keeps
//! them.

use std::sync::{Arc, Mutex};

use serde::Serialize;
use tokio::runtime::Handle;

use crate::client::{AnalyticsClient, HttpAnalyticsClient};
use crate::config::DashboardConfig;
use crate::period::Period;
use crate::store::PeriodStore;
use crate::types::DashboardResult;
use crate::views::{AlertsView, BusinessView, HeatmapView, NationalView, ResultsTableView, ViewContext};

/// Header status from `/info`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    pub online: bool,
    pub total_records: u64,
    pub version: Option<String>,
}

impl ServerStatus {
    pub fn offline() -> Self {
        Self::default()
    }
}

pub struct Dashboard {
    ctx: ViewContext,
    /// Business names from the last successful catalog load.
    businesses: Mutex<Vec<String>>,
    pub national: NationalView,
    pub heatmap: HeatmapView,
    pub results: ResultsTableView,
    pub alerts: AlertsView,
}

impl Dashboard {
    /// Build on the caller's tokio runtime.
    pub fn new(client: Arc<dyn AnalyticsClient>) -> DashboardResult<Self> {
        let ctx = ViewContext::current(Arc::new(PeriodStore::new()), client)?;
        Ok(Self::attach(ctx))
    }

    /// Build on an explicit runtime handle.
    pub fn with_runtime(client: Arc<dyn AnalyticsClient>, runtime: Handle) -> Self {
        Self::attach(ViewContext::new(Arc::new(PeriodStore::new()), client, runtime))
    }

    /// HTTP-backed dashboard for the given configuration.
    pub fn from_config(config: &DashboardConfig) -> DashboardResult<Self> {
        let client = HttpAnalyticsClient::new(config)?;
        tracing::info!("Analytics API: {}", client.base_url());
        Self::new(Arc::new(client))
    }

    fn attach(ctx: ViewContext) -> Self {
        Self {
            national: NationalView::attach(ctx.clone()),
            heatmap: HeatmapView::attach(ctx.clone()),
            results: ResultsTableView::attach(ctx.clone()),
            alerts: AlertsView::attach(ctx.clone()),
            ctx,
            businesses: Mutex::new(Vec::new()),
        }
    }

    /// Load the period catalog, the server's current period and the
    /// business catalog. Only a missing selection fails the bootstrap.
    pub async fn bootstrap(&self) -> DashboardResult<Option<Period>> {
        let (selected, _businesses) = futures::join!(
            self.ctx.store.bootstrap(self.ctx.client.as_ref()),
            self.load_businesses()
        );
        selected
    }

    /// Fetch the business catalog. On failure the previous one is kept.
    pub async fn load_businesses(&self) -> DashboardResult<Vec<String>> {
        let names = self.ctx.client.businesses().await.map_err(|e| {
            tracing::warn!("Business catalog unavailable, keeping previous: {e}");
            e
        })?;
        tracing::info!("Loaded {} businesses", names.len());
        *self.businesses.lock().unwrap_or_else(|e| e.into_inner()) = names.clone();
        Ok(names)
    }

    /// Business names from the last successful load.
    pub fn businesses(&self) -> Vec<String> {
        self.businesses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Select a period; every attached view reloads if it changed.
    pub fn select(&self, label: &str) -> DashboardResult<Period> {
        self.ctx.store.select(label)
    }

    pub fn store(&self) -> &Arc<PeriodStore> {
        &self.ctx.store
    }

    pub fn client(&self) -> &Arc<dyn AnalyticsClient> {
        &self.ctx.client
    }

    pub fn context(&self) -> &ViewContext {
        &self.ctx
    }

    /// Open a detail view for one business.
    pub fn open_business(&self, business: &str) -> DashboardResult<BusinessView> {
        BusinessView::open(self.ctx.clone(), business)
    }

    /// Wait until every attached view is idle.
    pub async fn wait_idle(&self) {
        self.national.wait_idle().await;
        self.heatmap.wait_idle().await;
        self.results.wait_idle().await;
        self.alerts.wait_idle().await;
    }

    /// Ask `/info` whether the API is up. Any failure reads as offline.
    pub async fn status(&self) -> ServerStatus {
        match self.ctx.client.server_info().await {
            Ok(info) => ServerStatus {
                online: true,
                total_records: info.total_records,
                version: (!info.version.is_empty()).then_some(info.version),
            },
            Err(e) => {
                tracing::warn!("API offline: {e}");
                ServerStatus::offline()
            }
        }
    }
}
