//! Analytics API client.
//!
//! [`AnalyticsClient`] is the seam between the dashboard core and the remote
//! API; views only ever talk to the trait. [`HttpAnalyticsClient`] is the
//! reqwest implementation. Every call unwraps the `{ success, data }`
//! envelope, and every failure mode (transport, status, decode,
//! `success: false`) surfaces as [`DashboardError::Fetch`]. There is no
//! retry here; timeouts come from the configured client.

use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::config::DashboardConfig;
use crate::period::PeriodCode;
use crate::types::{
    ApiEnvelope, DashboardError, DashboardResult, HeatmapSnapshot, IndicatorSummary,
    NationalSummary, PredictionAlert, ResultsTable, ServerInfo, TableMode, TimeSeries, ZScoreAlert,
};

/// Endpoints consumed by the dashboard.
///
/// `period` parameters are sent as `?periodo=`; `until` parameters as
/// `?hasta=`. `None` omits the parameter and lets the server pick its
/// current period.
#[async_trait]
pub trait AnalyticsClient: Send + Sync {
    /// Chronological catalog of period labels.
    async fn periods(&self) -> DashboardResult<Vec<String>>;

    /// The server's current period label.
    async fn current_period(&self) -> DashboardResult<String>;

    async fn national_summary(&self, period: Option<PeriodCode>)
        -> DashboardResult<NationalSummary>;

    async fn national_series(&self, until: Option<PeriodCode>) -> DashboardResult<TimeSeries>;

    async fn business_series(
        &self,
        business: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries>;

    async fn heatmap(&self, period: Option<PeriodCode>) -> DashboardResult<HeatmapSnapshot>;

    async fn results_table(
        &self,
        mode: TableMode,
        period: Option<PeriodCode>,
    ) -> DashboardResult<ResultsTable>;

    async fn businesses(&self) -> DashboardResult<Vec<String>>;

    async fn positions(&self, business: &str) -> DashboardResult<Vec<String>>;

    async fn indicators(&self, business: &str, position: &str) -> DashboardResult<Vec<String>>;

    async fn indicator_summary(
        &self,
        business: &str,
        position: &str,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<IndicatorSummary>>;

    async fn indicator_series(
        &self,
        business: &str,
        position: &str,
        indicator: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries>;

    async fn zscore_alerts(&self, period: Option<PeriodCode>) -> DashboardResult<Vec<ZScoreAlert>>;

    async fn prediction_alerts(
        &self,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<PredictionAlert>>;

    async fn server_info(&self) -> DashboardResult<ServerInfo>;
}

/// reqwest-backed [`AnalyticsClient`].
#[derive(Clone)]
pub struct HttpAnalyticsClient {
    client: reqwest::Client,
    base_url: Url,
}

impl HttpAnalyticsClient {
    /// Create a client for the configured base URL.
    pub fn new(config: &DashboardConfig) -> DashboardResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(concat!("resumen-nomina/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DashboardError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_url.clone(),
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Base URL + percent-encoded path segments + the present query params.
    fn endpoint(&self, segments: &[&str], query: &[(&str, Option<PeriodCode>)]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty();
            path.extend(segments);
        }
        let present: Vec<(&str, String)> = query
            .iter()
            .filter_map(|(k, v)| v.map(|v| (*k, v.to_string())))
            .collect();
        if !present.is_empty() {
            url.query_pairs_mut().extend_pairs(present);
        }
        url
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> DashboardResult<T> {
        let endpoint = url.path().to_string();
        tracing::debug!("GET {url}");

        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DashboardError::fetch(&endpoint, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DashboardError::fetch(
                &endpoint,
                format!("HTTP {}", status.as_u16()),
            ));
        }

        let envelope: ApiEnvelope<T> = resp
            .json()
            .await
            .map_err(|e| DashboardError::fetch(&endpoint, format!("invalid body: {e}")))?;

        if !envelope.success {
            let reason = envelope
                .message
                .unwrap_or_else(|| "server reported failure".to_string());
            return Err(DashboardError::fetch(&endpoint, reason));
        }

        envelope
            .data
            .ok_or_else(|| DashboardError::fetch(&endpoint, "response has no data"))
    }
}

#[async_trait]
impl AnalyticsClient for HttpAnalyticsClient {
    async fn periods(&self) -> DashboardResult<Vec<String>> {
        self.get_json(self.endpoint(&["compensacion", "periodos"], &[]))
            .await
    }

    async fn current_period(&self) -> DashboardResult<String> {
        self.get_json(self.endpoint(&["compensacion", "periodo-actual"], &[]))
            .await
    }

    async fn national_summary(
        &self,
        period: Option<PeriodCode>,
    ) -> DashboardResult<NationalSummary> {
        self.get_json(self.endpoint(&["compensacion", "nacional"], &[("periodo", period)]))
            .await
    }

    async fn national_series(&self, until: Option<PeriodCode>) -> DashboardResult<TimeSeries> {
        self.get_json(self.endpoint(&["compensacion", "nacional", "serie"], &[("hasta", until)]))
            .await
    }

    async fn business_series(
        &self,
        business: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries> {
        self.get_json(self.endpoint(
            &["compensacion", "negocio", business, "serie"],
            &[("hasta", until)],
        ))
        .await
    }

    async fn heatmap(&self, period: Option<PeriodCode>) -> DashboardResult<HeatmapSnapshot> {
        self.get_json(self.endpoint(&["compensacion", "mapa-calor"], &[("periodo", period)]))
            .await
    }

    async fn results_table(
        &self,
        mode: TableMode,
        period: Option<PeriodCode>,
    ) -> DashboardResult<ResultsTable> {
        self.get_json(self.endpoint(
            &["compensacion", "tabla-resultados", mode.path_segment()],
            &[("periodo", period)],
        ))
        .await
    }

    async fn businesses(&self) -> DashboardResult<Vec<String>> {
        self.get_json(self.endpoint(&["compensacion", "negocios"], &[]))
            .await
    }

    async fn positions(&self, business: &str) -> DashboardResult<Vec<String>> {
        self.get_json(self.endpoint(&["compensacion", "negocios", business, "puestos"], &[]))
            .await
    }

    async fn indicators(&self, business: &str, position: &str) -> DashboardResult<Vec<String>> {
        self.get_json(self.endpoint(
            &["compensacion", "negocios", business, "puestos", position, "indicadores"],
            &[],
        ))
        .await
    }

    async fn indicator_summary(
        &self,
        business: &str,
        position: &str,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<IndicatorSummary>> {
        self.get_json(self.endpoint(
            &[
                "compensacion",
                "negocios",
                business,
                "puestos",
                position,
                "resumen-indicadores",
            ],
            &[("periodo", period)],
        ))
        .await
    }

    async fn indicator_series(
        &self,
        business: &str,
        position: &str,
        indicator: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries> {
        self.get_json(self.endpoint(
            &[
                "compensacion",
                "negocios",
                business,
                "puestos",
                position,
                "indicadores",
                indicator,
                "serie",
            ],
            &[("hasta", until)],
        ))
        .await
    }

    async fn zscore_alerts(&self, period: Option<PeriodCode>) -> DashboardResult<Vec<ZScoreAlert>> {
        self.get_json(self.endpoint(&["alertas", "zscore"], &[("periodo", period)]))
            .await
    }

    async fn prediction_alerts(
        &self,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<PredictionAlert>> {
        self.get_json(self.endpoint(&["alertas", "prediccion"], &[("periodo", period)]))
            .await
    }

    async fn server_info(&self) -> DashboardResult<ServerInfo> {
        self.get_json(self.endpoint(&["info"], &[])).await
    }
}
