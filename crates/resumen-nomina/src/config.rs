//! Configuration loading and resolution.

use url::Url;

use crate::types::{DashboardError, DashboardResult};

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api/v1";
pub const DEFAULT_TIMEOUT_MS: u64 = 15_000;

pub const API_URL_ENV: &str = "RESUMEN_NOMINA_API_URL";
pub const TIMEOUT_ENV: &str = "RESUMEN_NOMINA_TIMEOUT_MS";

/// Where the analytics API lives and how long to wait for it.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardConfig {
    pub api_url: Url,
    pub timeout_ms: u64,
}

impl DashboardConfig {
    /// Resolve each setting as explicit value > environment > default.
    pub fn resolve(api_url: Option<&str>, timeout_ms: Option<u64>) -> DashboardResult<Self> {
        let api_url = resolve_api_url(api_url);
        let timeout_ms = timeout_ms
            .or_else(|| std::env::var(TIMEOUT_ENV).ok()?.trim().parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Self::new(&api_url, timeout_ms)
    }

    /// Build a config from a base URL string.
    pub fn new(api_url: &str, timeout_ms: u64) -> DashboardResult<Self> {
        let mut url = Url::parse(api_url)
            .map_err(|e| DashboardError::Config(format!("invalid API URL '{api_url}': {e}")))?;
        if url.cannot_be_a_base() {
            return Err(DashboardError::Config(format!(
                "API URL '{api_url}' cannot be used as a base"
            )));
        }
        // Endpoint paths are appended as segments; drop a trailing slash.
        let trimmed = url.path().trim_end_matches('/').to_string();
        url.set_path(&trimmed);
        Ok(Self {
            api_url: url,
            timeout_ms,
        })
    }
}

/// Resolve the API base URL.
pub fn resolve_api_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }

    if let Ok(env_url) = std::env::var(API_URL_ENV) {
        if !env_url.trim().is_empty() {
            return env_url;
        }
    }

    DEFAULT_API_URL.to_string()
}
