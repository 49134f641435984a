//! Wire types returned by the analytics API, and the library error type.
//!
//! The API speaks camelCase Spanish field names; every struct maps them onto
//! English field names. Fields the server omits or sends as `null` take
//! their default (zero, empty, `false`).

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

/// Read a nullable field, mapping `null` to the type's default.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Uniform response envelope: `{ success, data, message? }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    pub data: Option<T>,
    #[serde(default, alias = "mensaje")]
    pub message: Option<String>,
}

/// One heat-map record: the percentage variation of a position inside a business.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariationRecord {
    #[serde(rename = "negocio", deserialize_with = "or_default")]
    pub business: String,
    #[serde(rename = "puesto", deserialize_with = "or_default")]
    pub item: String,
    #[serde(rename = "variacionPorcentual", deserialize_with = "or_default")]
    pub percent_change: f64,
    #[serde(rename = "valorAbsoluto", deserialize_with = "or_default")]
    pub absolute_value: f64,
    #[serde(rename = "valorSemanaActual", deserialize_with = "or_default")]
    pub current_value: f64,
    #[serde(rename = "valorSemanaAnterior", deserialize_with = "or_default")]
    pub prior_value: f64,
}

/// Heat-map payload for one period.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HeatmapSnapshot {
    #[serde(rename = "periodoActual", deserialize_with = "or_default")]
    pub current_period: String,
    #[serde(rename = "periodoAnterior", deserialize_with = "or_default")]
    pub prior_period: String,
    #[serde(deserialize_with = "or_default")]
    pub items: Vec<VariationRecord>,
    #[serde(rename = "itemsPorNegocio", deserialize_with = "or_default")]
    pub items_by_business: BTreeMap<String, Vec<VariationRecord>>,
}

/// Which results-table endpoint supplied the rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TableMode {
    #[default]
    #[serde(rename = "TOTAL")]
    Total,
    #[serde(rename = "PROMEDIO")]
    Average,
}

impl TableMode {
    /// Path segment under `/compensacion/tabla-resultados/`.
    pub fn path_segment(self) -> &'static str {
        match self {
            TableMode::Total => "total",
            TableMode::Average => "promedio",
        }
    }

    /// Short label used by front-ends.
    pub fn label(self) -> &'static str {
        match self {
            TableMode::Total => "Total",
            TableMode::Average => "Promedio",
        }
    }
}

impl std::str::FromStr for TableMode {
    type Err = DashboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "total" => Ok(TableMode::Total),
            "average" | "promedio" | "avg" => Ok(TableMode::Average),
            other => Err(DashboardError::Validation(format!(
                "unknown table mode '{other}', expected total or average"
            ))),
        }
    }
}

/// One row of the results table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultRow {
    #[serde(rename = "puesto", deserialize_with = "or_default")]
    pub position: String,
    #[serde(rename = "negocio", deserialize_with = "or_default")]
    pub business: String,
    #[serde(rename = "semanaActual", deserialize_with = "or_default")]
    pub current: f64,
    #[serde(rename = "semanaAnterior", deserialize_with = "or_default")]
    pub prior: f64,
    #[serde(rename = "variacionMonto", deserialize_with = "or_default")]
    pub amount_change: f64,
    #[serde(rename = "variacionPorcentual", deserialize_with = "or_default")]
    pub percent_change: f64,
    #[serde(rename = "variacionPositiva", deserialize_with = "or_default")]
    pub positive: bool,
}

/// Results-table payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ResultsTable {
    #[serde(rename = "periodoActual", deserialize_with = "or_default")]
    pub current_period: String,
    #[serde(rename = "periodoAnterior", deserialize_with = "or_default")]
    pub prior_period: String,
    #[serde(rename = "tipo", deserialize_with = "or_default")]
    pub mode: TableMode,
    #[serde(rename = "filas", deserialize_with = "or_default")]
    pub rows: Vec<ResultRow>,
    #[serde(rename = "filasPorNegocio", deserialize_with = "or_default")]
    pub rows_by_business: BTreeMap<String, Vec<ResultRow>>,
}

/// National totals for one period, with a per-business breakdown.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NationalSummary {
    #[serde(rename = "periodoActual", deserialize_with = "or_default")]
    pub current_period: String,
    #[serde(rename = "periodoAnterior", deserialize_with = "or_default")]
    pub prior_period: String,
    #[serde(rename = "totalSemanaActual", deserialize_with = "or_default")]
    pub total_current: f64,
    #[serde(rename = "totalSemanaAnterior", deserialize_with = "or_default")]
    pub total_prior: f64,
    #[serde(rename = "diferencia", deserialize_with = "or_default")]
    pub difference: f64,
    #[serde(rename = "variacionPorcentual", deserialize_with = "or_default")]
    pub percent_change: f64,
    #[serde(rename = "negocios", deserialize_with = "or_default")]
    pub businesses: Vec<BusinessSummary>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSummary {
    #[serde(rename = "negocio", deserialize_with = "or_default")]
    pub business: String,
    #[serde(deserialize_with = "or_default")]
    pub slug: String,
    #[serde(rename = "semanaActual", deserialize_with = "or_default")]
    pub current: f64,
    #[serde(rename = "semanaAnterior", deserialize_with = "or_default")]
    pub prior: f64,
    #[serde(rename = "diferencia", deserialize_with = "or_default")]
    pub difference: f64,
    #[serde(rename = "variacionPorcentual", deserialize_with = "or_default")]
    pub percent_change: f64,
    #[serde(rename = "empleados", deserialize_with = "or_default")]
    pub employees: u64,
}

/// A weekly series with its confidence bands.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeSeries {
    #[serde(rename = "negocio")]
    pub business: Option<String>,
    #[serde(rename = "puesto")]
    pub position: Option<String>,
    #[serde(rename = "indicador")]
    pub indicator: Option<String>,
    #[serde(rename = "media", deserialize_with = "or_default")]
    pub mean: f64,
    #[serde(rename = "desviacionEstandar", deserialize_with = "or_default")]
    pub std_dev: f64,
    #[serde(rename = "minimo", deserialize_with = "or_default")]
    pub min: f64,
    #[serde(rename = "maximo", deserialize_with = "or_default")]
    pub max: f64,
    #[serde(rename = "cantidadPuntos", deserialize_with = "or_default")]
    pub point_count: u32,
    #[serde(rename = "lineasConfianza", deserialize_with = "or_default")]
    pub bands: ConfidenceBands,
    #[serde(rename = "serie", deserialize_with = "or_default")]
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfidenceBands {
    #[serde(rename = "limiteSuperior1Sigma", deserialize_with = "or_default")]
    pub upper_1_sigma: f64,
    #[serde(rename = "limiteInferior1Sigma", deserialize_with = "or_default")]
    pub lower_1_sigma: f64,
    #[serde(rename = "limiteSuperior15Sigma", deserialize_with = "or_default")]
    pub upper_1_5_sigma: f64,
    #[serde(rename = "limiteInferior15Sigma", deserialize_with = "or_default")]
    pub lower_1_5_sigma: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesPoint {
    #[serde(rename = "semana", deserialize_with = "or_default")]
    pub week: String,
    #[serde(rename = "valor", deserialize_with = "or_default")]
    pub value: f64,
    #[serde(rename = "variacionVsSemanaAnterior", deserialize_with = "or_default")]
    pub change_vs_prior: f64,
    #[serde(rename = "fueraDe1Sigma", deserialize_with = "or_default")]
    pub outside_1_sigma: bool,
    #[serde(rename = "fueraDe15Sigma", deserialize_with = "or_default")]
    pub outside_1_5_sigma: bool,
}

/// Current vs prior value of one indicator for a business position.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndicatorSummary {
    #[serde(rename = "indicador", deserialize_with = "or_default")]
    pub indicator: String,
    #[serde(rename = "valorActual", deserialize_with = "or_default")]
    pub current: f64,
    #[serde(rename = "valorAnterior", deserialize_with = "or_default")]
    pub prior: f64,
    #[serde(rename = "diferencia", deserialize_with = "or_default")]
    pub difference: f64,
    #[serde(rename = "variacionPorcentual", deserialize_with = "or_default")]
    pub percent_change: f64,
    #[serde(rename = "variacionPositiva", deserialize_with = "or_default")]
    pub positive: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    #[serde(rename = "CRITICA")]
    Critical,
    #[serde(rename = "ALTA")]
    High,
    #[default]
    #[serde(rename = "MODERADA")]
    Moderate,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Critical => "CRITICA",
            Severity::High => "ALTA",
            Severity::Moderate => "MODERADA",
        }
    }
}

/// Z-score alert as computed by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ZScoreAlert {
    #[serde(rename = "negocio", deserialize_with = "or_default")]
    pub business: String,
    #[serde(rename = "puesto", deserialize_with = "or_default")]
    pub position: String,
    #[serde(rename = "indicador", deserialize_with = "or_default")]
    pub indicator: String,
    #[serde(rename = "variacionPorcentualVsSA", deserialize_with = "or_default")]
    pub percent_change_vs_prior: f64,
    #[serde(rename = "variacionMedia", deserialize_with = "or_default")]
    pub mean_change: f64,
    #[serde(rename = "limiteInferior", deserialize_with = "or_default")]
    pub lower_limit: f64,
    #[serde(rename = "limiteSuperior", deserialize_with = "or_default")]
    pub upper_limit: f64,
    #[serde(rename = "zScore", deserialize_with = "or_default")]
    pub z_score: f64,
    #[serde(rename = "severidad", deserialize_with = "or_default")]
    pub severity: Severity,
}

/// 95% prediction-interval alert as computed by the API.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PredictionAlert {
    #[serde(rename = "negocio", deserialize_with = "or_default")]
    pub business: String,
    #[serde(rename = "puesto", deserialize_with = "or_default")]
    pub position: String,
    #[serde(rename = "indicador", deserialize_with = "or_default")]
    pub indicator: String,
    #[serde(rename = "observacionReal", deserialize_with = "or_default")]
    pub observed: f64,
    #[serde(rename = "limiteInferior", deserialize_with = "or_default")]
    pub lower_limit: f64,
    #[serde(rename = "limiteSuperior", deserialize_with = "or_default")]
    pub upper_limit: f64,
    #[serde(rename = "variacionFueraRango", deserialize_with = "or_default")]
    pub out_of_range: f64,
    #[serde(rename = "historiaInsuficiente", deserialize_with = "or_default")]
    pub insufficient_history: bool,
}

/// `/info` payload.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerInfo {
    #[serde(deserialize_with = "or_default")]
    pub application: String,
    #[serde(deserialize_with = "or_default")]
    pub version: String,
    #[serde(deserialize_with = "or_default")]
    pub environment: String,
    #[serde(rename = "totalRegistros", deserialize_with = "or_default")]
    pub total_records: u64,
}

/// Errors that can occur in the dashboard core.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum DashboardError {
    /// A malformed period label was passed to `select`.
    #[error("Invalid period: {0}")]
    Validation(String),

    /// A numeric code was requested for an unset or malformed period.
    #[error("Cannot encode period: {0}")]
    Encoding(String),

    /// Transport, status or envelope failure for one request.
    #[error("Fetch failed for {endpoint}: {reason}")]
    Fetch { endpoint: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DashboardError {
    pub fn fetch(endpoint: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        DashboardError::Fetch {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, DashboardError::Fetch { .. })
    }
}

/// Convenience result type.
pub type DashboardResult<T> = Result<T, DashboardError>;
