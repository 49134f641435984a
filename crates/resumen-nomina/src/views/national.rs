//! National view: period summary plus the series of the selected tab.

use std::sync::{Arc, Mutex};

use crate::period::PeriodCode;
use crate::sync::Subscription;
use crate::types::{NationalSummary, TimeSeries};

use super::{ViewCell, ViewContext, ViewState};

/// Tab that shows the national series instead of one business.
pub const TOTAL_TAB: &str = "Total";

struct Cells {
    summary: Arc<ViewCell<NationalSummary>>,
    series: Arc<ViewCell<TimeSeries>>,
    positions: Arc<ViewCell<Vec<String>>>,
    tab: Mutex<String>,
}

pub struct NationalView {
    ctx: ViewContext,
    cells: Arc<Cells>,
    _subscription: Subscription,
}

impl NationalView {
    pub fn attach(ctx: ViewContext) -> Self {
        let cells = Arc::new(Cells {
            summary: Arc::new(ViewCell::new("national.summary")),
            series: Arc::new(ViewCell::new("national.series")),
            positions: Arc::new(ViewCell::new("national.positions")),
            tab: Mutex::new(TOTAL_TAB.to_string()),
        });

        let subscription = {
            let ctx = ctx.clone();
            let cells = Arc::clone(&cells);
            let store = Arc::clone(&ctx.store);
            store.subscribe(move |code| {
                ctx.follow_selection(code, |code| {
                    load_summary(&ctx, &cells, code);
                    load_tab(&ctx, &cells, code);
                })
            })
        };

        if let Some(code) = ctx.store.current_code() {
            load_summary(&ctx, &cells, code);
            load_tab(&ctx, &cells, code);
        }

        Self {
            ctx,
            cells,
            _subscription: subscription,
        }
    }

    /// Switch the series tab to a business (or [`TOTAL_TAB`]).
    ///
    /// The tab is remembered even before a period is selected; the series
    /// loads with the first period.
    pub fn select_business(&self, business: &str) {
        let business = business.trim();
        let business = if business.is_empty() {
            TOTAL_TAB
        } else {
            business
        };
        *self.cells.tab.lock().unwrap_or_else(|e| e.into_inner()) = business.to_string();
        tracing::info!("national tab -> {business}");
        if let Some(code) = self.ctx.store.current_code() {
            load_tab(&self.ctx, &self.cells, code);
        }
    }

    pub fn selected_business(&self) -> String {
        self.cells.tab()
    }

    pub fn reload(&self) -> bool {
        match self.ctx.store.current_code() {
            Some(code) => {
                load_summary(&self.ctx, &self.cells, code);
                load_tab(&self.ctx, &self.cells, code);
                true
            }
            None => false,
        }
    }

    pub fn summary(&self) -> ViewState<NationalSummary> {
        self.cells.summary.snapshot()
    }

    pub fn series(&self) -> ViewState<TimeSeries> {
        self.cells.series.snapshot()
    }

    /// Positions of the selected business; empty data on the Total tab.
    pub fn positions(&self) -> ViewState<Vec<String>> {
        self.cells.positions.snapshot()
    }

    pub fn summary_cell(&self) -> &ViewCell<NationalSummary> {
        &self.cells.summary
    }

    pub fn series_cell(&self) -> &ViewCell<TimeSeries> {
        &self.cells.series
    }

    pub async fn wait_idle(&self) {
        self.cells.summary.wait_idle().await;
        self.cells.series.wait_idle().await;
        self.cells.positions.wait_idle().await;
    }
}

impl Cells {
    fn tab(&self) -> String {
        self.tab.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

fn load_summary(ctx: &ViewContext, cells: &Arc<Cells>, code: PeriodCode) {
    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(&cells.summary, code, async move {
        client.national_summary(Some(code)).await
    });
}

fn load_tab(ctx: &ViewContext, cells: &Arc<Cells>, code: PeriodCode) {
    let tab = cells.tab();

    let client = Arc::clone(&ctx.client);
    let business = tab.clone();
    ctx.spawn_tagged(&cells.series, code, async move {
        if business == TOTAL_TAB {
            client.national_series(Some(code)).await
        } else {
            client.business_series(&business, Some(code)).await
        }
    });

    if tab == TOTAL_TAB {
        // Bump the generation so an in-flight business list is discarded.
        let tag = cells.positions.begin(code);
        cells.positions.finish(tag, Some(code), Ok(Vec::new()));
        return;
    }
    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(&cells.positions, code, async move {
        client.positions(&tab).await
    });
}
