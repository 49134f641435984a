//! Scripted in-memory analytics client for integration tests.
//!
//! Every response is derived from its arguments (so tests can tell which
//! period a payload belongs to). Calls can be held behind a gate and
//! released later, or made to fail.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use resumen_nomina::*;

/// Gate key: endpoint name plus the period code it was called with.
type Key = (&'static str, Option<PeriodCode>);

pub struct ScriptedClient {
    pub catalog: Mutex<Vec<String>>,
    pub current: Mutex<String>,
    pub positions: Mutex<Vec<String>>,
    pub indicators: Mutex<Vec<String>>,
    gates: Mutex<HashMap<Key, Arc<Notify>>>,
    failing: Mutex<HashSet<&'static str>>,
    calls: Mutex<Vec<String>>,
}

impl Default for ScriptedClient {
    fn default() -> Self {
        Self {
            catalog: Mutex::new(
                ["2025-42", "2025-43", "2025-44"]
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
            ),
            current: Mutex::new("2025-44".to_string()),
            positions: Mutex::new(vec!["Cajero".to_string(), "Gerente".to_string()]),
            indicators: Mutex::new(vec!["Bono".to_string(), "Compensación".to_string()]),
            gates: Mutex::new(HashMap::new()),
            failing: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl ScriptedClient {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Hold the next call to `endpoint` for `period` until the returned
    /// gate is notified.
    pub fn hold(&self, endpoint: &'static str, period: Option<PeriodCode>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .unwrap()
            .insert((endpoint, period), Arc::clone(&gate));
        gate
    }

    pub fn fail(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().insert(endpoint);
    }

    pub fn recover(&self, endpoint: &'static str) {
        self.failing.lock().unwrap().remove(endpoint);
    }

    /// Calls so far, as `endpoint[:arg...]`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn called(&self, call: &str) -> bool {
        self.calls().iter().any(|c| c == call)
    }

    async fn respond<T>(
        &self,
        endpoint: &'static str,
        period: Option<PeriodCode>,
        call: String,
        make: impl FnOnce() -> T,
    ) -> DashboardResult<T> {
        self.calls.lock().unwrap().push(call);
        let gate = self.gates.lock().unwrap().remove(&(endpoint, period));
        if let Some(gate) = gate {
            gate.notified().await;
        }
        if self.failing.lock().unwrap().contains(endpoint) {
            return Err(DashboardError::fetch(endpoint, "HTTP 500"));
        }
        Ok(make())
    }
}

pub fn label(code: Option<PeriodCode>) -> String {
    code.and_then(|c| Period::from_code(c).ok())
        .map(|p| p.to_string())
        .unwrap_or_default()
}

fn arg(code: Option<PeriodCode>) -> String {
    code.map(|c| c.to_string()).unwrap_or_else(|| "-".to_string())
}

fn series(business: Option<&str>, position: Option<&str>, indicator: Option<&str>, until: Option<PeriodCode>) -> TimeSeries {
    TimeSeries {
        business: business.map(str::to_string),
        position: position.map(str::to_string),
        indicator: indicator.map(str::to_string),
        point_count: 1,
        points: vec![SeriesPoint {
            week: label(until),
            value: 1_000.0,
            ..Default::default()
        }],
        ..Default::default()
    }
}

#[async_trait]
impl AnalyticsClient for ScriptedClient {
    async fn periods(&self) -> DashboardResult<Vec<String>> {
        let catalog = self.catalog.lock().unwrap().clone();
        self.respond("periods", None, "periods".into(), || catalog)
            .await
    }

    async fn current_period(&self) -> DashboardResult<String> {
        let current = self.current.lock().unwrap().clone();
        self.respond("current_period", None, "current_period".into(), || current)
            .await
    }

    async fn national_summary(&self, period: Option<PeriodCode>) -> DashboardResult<NationalSummary> {
        self.respond(
            "national_summary",
            period,
            format!("national_summary:{}", arg(period)),
            || NationalSummary {
                current_period: label(period),
                total_current: 100.0,
                total_prior: 90.0,
                ..Default::default()
            },
        )
        .await
    }

    async fn national_series(&self, until: Option<PeriodCode>) -> DashboardResult<TimeSeries> {
        self.respond(
            "national_series",
            until,
            format!("national_series:{}", arg(until)),
            || series(None, None, None, until),
        )
        .await
    }

    async fn business_series(
        &self,
        business: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries> {
        self.respond(
            "business_series",
            until,
            format!("business_series:{business}:{}", arg(until)),
            || series(Some(business), None, None, until),
        )
        .await
    }

    async fn heatmap(&self, period: Option<PeriodCode>) -> DashboardResult<HeatmapSnapshot> {
        self.respond("heatmap", period, format!("heatmap:{}", arg(period)), || {
            HeatmapSnapshot {
                current_period: label(period),
                items: vec![
                    VariationRecord {
                        business: "Elektra".to_string(),
                        item: "Cajero".to_string(),
                        percent_change: 4.0,
                        current_value: 2_000_000.0,
                        ..Default::default()
                    },
                    VariationRecord {
                        business: "Banco Azteca".to_string(),
                        item: "Ejecutivo".to_string(),
                        percent_change: -6.0,
                        current_value: 8_000_000.0,
                        ..Default::default()
                    },
                ],
                ..Default::default()
            }
        })
        .await
    }

    async fn results_table(
        &self,
        mode: TableMode,
        period: Option<PeriodCode>,
    ) -> DashboardResult<ResultsTable> {
        self.respond(
            "results_table",
            period,
            format!("results_table:{}:{}", mode.path_segment(), arg(period)),
            || ResultsTable {
                current_period: label(period),
                mode,
                rows: vec![
                    ResultRow {
                        business: "Elektra".to_string(),
                        position: "Cajero".to_string(),
                        ..Default::default()
                    },
                    ResultRow {
                        business: "Banco Azteca".to_string(),
                        position: "Ejecutivo".to_string(),
                        ..Default::default()
                    },
                    ResultRow {
                        business: "Elektra".to_string(),
                        position: "Gerente".to_string(),
                        ..Default::default()
                    },
                ],
                ..Default::default()
            },
        )
        .await
    }

    async fn businesses(&self) -> DashboardResult<Vec<String>> {
        self.respond("businesses", None, "businesses".into(), || {
            vec!["Banco Azteca".to_string(), "Elektra".to_string()]
        })
        .await
    }

    async fn positions(&self, business: &str) -> DashboardResult<Vec<String>> {
        let positions = self.positions.lock().unwrap().clone();
        self.respond("positions", None, format!("positions:{business}"), || positions)
            .await
    }

    async fn indicators(&self, business: &str, position: &str) -> DashboardResult<Vec<String>> {
        let indicators = self.indicators.lock().unwrap().clone();
        self.respond(
            "indicators",
            None,
            format!("indicators:{business}:{position}"),
            || indicators,
        )
        .await
    }

    async fn indicator_summary(
        &self,
        business: &str,
        position: &str,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<IndicatorSummary>> {
        self.respond(
            "indicator_summary",
            period,
            format!("indicator_summary:{business}:{position}:{}", arg(period)),
            || {
                vec![IndicatorSummary {
                    indicator: "Compensación".to_string(),
                    current: 10.0,
                    prior: 8.0,
                    ..Default::default()
                }]
            },
        )
        .await
    }

    async fn indicator_series(
        &self,
        business: &str,
        position: &str,
        indicator: &str,
        until: Option<PeriodCode>,
    ) -> DashboardResult<TimeSeries> {
        self.respond(
            "indicator_series",
            until,
            format!("indicator_series:{business}:{position}:{indicator}:{}", arg(until)),
            || series(Some(business), Some(position), Some(indicator), until),
        )
        .await
    }

    async fn zscore_alerts(&self, period: Option<PeriodCode>) -> DashboardResult<Vec<ZScoreAlert>> {
        self.respond("zscore_alerts", period, format!("zscore_alerts:{}", arg(period)), || {
            vec![
                ZScoreAlert {
                    business: "Elektra".to_string(),
                    severity: Severity::Critical,
                    ..Default::default()
                },
                ZScoreAlert {
                    business: "Italika".to_string(),
                    severity: Severity::Moderate,
                    ..Default::default()
                },
            ]
        })
        .await
    }

    async fn prediction_alerts(
        &self,
        period: Option<PeriodCode>,
    ) -> DashboardResult<Vec<PredictionAlert>> {
        self.respond(
            "prediction_alerts",
            period,
            format!("prediction_alerts:{}", arg(period)),
            || {
                vec![PredictionAlert {
                    business: "Elektra".to_string(),
                    observed: 5.0,
                    ..Default::default()
                }]
            },
        )
        .await
    }

    async fn server_info(&self) -> DashboardResult<ServerInfo> {
        self.respond("server_info", None, "server_info".into(), || ServerInfo {
            application: "resumen-nomina-api".to_string(),
            version: "1.2.0".to_string(),
            total_records: 48_210,
            ..Default::default()
        })
        .await
    }
}
