//! Resumen Nómina — core of the payroll summary dashboard: period store, view synchronization, heat-map layout and results grouping.

pub mod client;
pub mod config;
pub mod dashboard;
pub mod heatmap;
pub mod period;
pub mod store;
pub mod sync;
pub mod table;
pub mod types;
pub mod views;

pub use client::{AnalyticsClient, HttpAnalyticsClient};
pub use config::DashboardConfig;
pub use dashboard::{Dashboard, ServerStatus};
pub use heatmap::{layout, HeatmapCell, HeatmapGroup, HeatmapLayout, Rgb};
pub use period::{derive_numeric_code, derive_prior, Period, PeriodCode};
pub use store::{PeriodState, PeriodStore};
pub use sync::{Subscription, SubscriptionHandle, ViewSynchronizer};
pub use table::GroupedResults;
pub use types::*;
