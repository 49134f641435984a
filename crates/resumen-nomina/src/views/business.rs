//! Business detail view.
//!
//! Opened for one business. Loading is a chain: positions → first position
//! → its indicator list → default indicator → series. The indicator summary
//! table only needs the position, so it loads alongside the indicator list.
//! Every link goes through a [`ViewCell`], so a link that lands after the
//! period changed is discarded and the chain stops there; the period change
//! restarts it.

use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::period::PeriodCode;
use crate::sync::Subscription;
use crate::types::{DashboardError, DashboardResult, IndicatorSummary, TimeSeries};

use super::{Outcome, ViewCell, ViewContext, ViewState};

/// Indicator selected by default when the position offers it.
pub const DEFAULT_INDICATOR: &str = "Compensación";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub position: Option<String>,
    pub indicator: Option<String>,
}

struct Inner {
    business: String,
    positions: Arc<ViewCell<Vec<String>>>,
    indicators: Arc<ViewCell<Vec<String>>>,
    summary: Arc<ViewCell<Vec<IndicatorSummary>>>,
    series: Arc<ViewCell<TimeSeries>>,
    selection: Mutex<Selection>,
    /// Chain links still running.
    links: watch::Sender<usize>,
}

impl Inner {
    fn selection(&self) -> MutexGuard<'_, Selection> {
        self.selection.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn link_started(&self) {
        self.links.send_modify(|n| *n += 1);
    }

    fn link_done(&self) {
        self.links.send_modify(|n| *n = n.saturating_sub(1));
    }
}

pub struct BusinessView {
    ctx: ViewContext,
    inner: Arc<Inner>,
    _subscription: Subscription,
}

impl BusinessView {
    /// Open the view for `business` and start loading its positions.
    ///
    /// Needs a selected period; before bootstrap this fails with
    /// [`DashboardError::Encoding`].
    pub fn open(ctx: ViewContext, business: &str) -> DashboardResult<Self> {
        let business = business.trim();
        if business.is_empty() {
            return Err(DashboardError::Validation(
                "business name is empty".to_string(),
            ));
        }
        let code = ctx.store.numeric_code()?;

        let inner = Arc::new(Inner {
            business: business.to_string(),
            positions: Arc::new(ViewCell::new("business.positions")),
            indicators: Arc::new(ViewCell::new("business.indicators")),
            summary: Arc::new(ViewCell::new("business.summary")),
            series: Arc::new(ViewCell::new("business.series")),
            selection: Mutex::new(Selection::default()),
            links: watch::channel(0).0,
        });

        let subscription = {
            let ctx = ctx.clone();
            let inner = Arc::clone(&inner);
            let store = Arc::clone(&ctx.store);
            store.subscribe(move |code| ctx.follow_selection(code, |code| on_period(&ctx, &inner, code)))
        };

        tracing::info!("opening business view for {business}");
        load_positions(&ctx, &inner, code);

        Ok(Self {
            ctx,
            inner,
            _subscription: subscription,
        })
    }

    pub fn business(&self) -> &str {
        &self.inner.business
    }

    pub fn selection(&self) -> Selection {
        self.inner.selection().clone()
    }

    /// Select a position from the loaded list and reload its data.
    pub fn select_position(&self, position: &str) -> DashboardResult<()> {
        let position = position.trim();
        let known = self.inner.positions.data().unwrap_or_default();
        if !known.iter().any(|p| p == position) {
            return Err(DashboardError::Validation(format!(
                "unknown position '{position}' for {}",
                self.inner.business
            )));
        }
        let code = self.ctx.store.numeric_code()?;
        self.inner.selection().position = Some(position.to_string());
        load_position_data(&self.ctx, &self.inner, code);
        Ok(())
    }

    /// Select an indicator from the loaded list and reload the series.
    pub fn select_indicator(&self, indicator: &str) -> DashboardResult<()> {
        let indicator = indicator.trim();
        let known = self.inner.indicators.data().unwrap_or_default();
        if !known.iter().any(|i| i == indicator) {
            return Err(DashboardError::Validation(format!(
                "unknown indicator '{indicator}'"
            )));
        }
        let code = self.ctx.store.numeric_code()?;
        self.inner.selection().indicator = Some(indicator.to_string());
        load_series(&self.ctx, &self.inner, code);
        Ok(())
    }

    pub fn positions(&self) -> ViewState<Vec<String>> {
        self.inner.positions.snapshot()
    }

    pub fn indicators(&self) -> ViewState<Vec<String>> {
        self.inner.indicators.snapshot()
    }

    pub fn summary(&self) -> ViewState<Vec<IndicatorSummary>> {
        self.inner.summary.snapshot()
    }

    pub fn series(&self) -> ViewState<TimeSeries> {
        self.inner.series.snapshot()
    }

    /// Wait for the whole load chain to settle.
    pub async fn wait_idle(&self) {
        let mut links = self.inner.links.subscribe();
        let _ = links.wait_for(|n| *n == 0).await;
        self.inner.positions.wait_idle().await;
        self.inner.indicators.wait_idle().await;
        self.inner.summary.wait_idle().await;
        self.inner.series.wait_idle().await;
    }
}

fn on_period(ctx: &ViewContext, inner: &Arc<Inner>, code: PeriodCode) {
    let selection = inner.selection().clone();
    match selection {
        Selection { position: None, .. } => load_positions(ctx, inner, code),
        Selection {
            indicator: None, ..
        } => load_position_data(ctx, inner, code),
        _ => {
            load_summary(ctx, inner, code);
            load_series(ctx, inner, code);
        }
    }
}

fn load_positions(ctx: &ViewContext, inner: &Arc<Inner>, code: PeriodCode) {
    let tag = inner.positions.begin(code);
    let client = Arc::clone(&ctx.client);
    let (task_ctx, inner) = (ctx.clone(), Arc::clone(inner));
    inner.link_started();
    ctx.spawn(async move {
        let result = client.positions(&inner.business).await;
        let first = result.as_ref().ok().and_then(|p| p.first().cloned());

        let selected = task_ctx.store.current_code();
        if inner.positions.finish(tag, selected, result) == Outcome::Applied {
            if let Some(first) = first {
                inner.selection().position.get_or_insert(first);
            }
            load_position_data(&task_ctx, &inner, code);
        }
        inner.link_done();
    });
}

/// Summary and indicator list for the selected position, then the series.
fn load_position_data(ctx: &ViewContext, inner: &Arc<Inner>, code: PeriodCode) {
    let Some(position) = inner.selection().position.clone() else {
        return;
    };
    load_summary(ctx, inner, code);

    let tag = inner.indicators.begin(code);
    let client = Arc::clone(&ctx.client);
    let (task_ctx, inner) = (ctx.clone(), Arc::clone(inner));
    inner.link_started();
    ctx.spawn(async move {
        let result = client.indicators(&inner.business, &position).await;
        let fallback = result.as_ref().ok().map(|list| {
            (default_indicator(list), list.clone())
        });

        let selected = task_ctx.store.current_code();
        if inner.indicators.finish(tag, selected, result) == Outcome::Applied {
            if let Some((default, list)) = fallback {
                let mut selection = inner.selection();
                let keep = selection
                    .indicator
                    .as_ref()
                    .is_some_and(|current| list.contains(current));
                if !keep {
                    selection.indicator = default;
                }
            }
            load_series(&task_ctx, &inner, code);
        }
        inner.link_done();
    });
}

fn load_summary(ctx: &ViewContext, inner: &Arc<Inner>, code: PeriodCode) {
    let Some(position) = inner.selection().position.clone() else {
        return;
    };
    let client = Arc::clone(&ctx.client);
    let business = inner.business.clone();
    ctx.spawn_tagged(&inner.summary, code, async move {
        client
            .indicator_summary(&business, &position, Some(code))
            .await
    });
}

fn load_series(ctx: &ViewContext, inner: &Arc<Inner>, code: PeriodCode) {
    let Selection {
        position: Some(position),
        indicator: Some(indicator),
    } = inner.selection().clone()
    else {
        return;
    };
    let client = Arc::clone(&ctx.client);
    let business = inner.business.clone();
    ctx.spawn_tagged(&inner.series, code, async move {
        client
            .indicator_series(&business, &position, &indicator, Some(code))
            .await
    });
}

/// [`DEFAULT_INDICATOR`] when offered, else the first one.
pub fn default_indicator(indicators: &[String]) -> Option<String> {
    indicators
        .iter()
        .find(|i| i.as_str() == DEFAULT_INDICATOR)
        .or_else(|| indicators.first())
        .cloned()
}
