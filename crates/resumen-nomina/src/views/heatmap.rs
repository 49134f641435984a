//! Heat-map view: fetches the variation snapshot and lays it out.

use std::sync::Arc;

use serde::Serialize;

use crate::heatmap::HeatmapLayout;
use crate::period::PeriodCode;
use crate::sync::Subscription;
use crate::types::HeatmapSnapshot;

use super::{ViewCell, ViewContext, ViewState};

/// Render-ready heat-map for one period.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct HeatmapData {
    pub current_period: String,
    pub prior_period: String,
    pub layout: HeatmapLayout,
}

impl From<HeatmapSnapshot> for HeatmapData {
    fn from(snapshot: HeatmapSnapshot) -> Self {
        let layout = HeatmapLayout::from_snapshot(&snapshot);
        Self {
            current_period: snapshot.current_period,
            prior_period: snapshot.prior_period,
            layout,
        }
    }
}

pub struct HeatmapView {
    ctx: ViewContext,
    cell: Arc<ViewCell<HeatmapData>>,
    _subscription: Subscription,
}

impl HeatmapView {
    /// Subscribe to period changes, loading immediately if a period is set.
    pub fn attach(ctx: ViewContext) -> Self {
        let cell = Arc::new(ViewCell::new("heatmap"));
        let subscription = {
            let ctx = ctx.clone();
            let cell = Arc::clone(&cell);
            let store = Arc::clone(&ctx.store);
            store.subscribe(move |code| ctx.follow_selection(code, |code| load(&ctx, &cell, code)))
        };
        if let Some(code) = ctx.store.current_code() {
            load(&ctx, &cell, code);
        }
        Self {
            ctx,
            cell,
            _subscription: subscription,
        }
    }

    /// Reload for the selected period. Returns `false` before bootstrap.
    pub fn reload(&self) -> bool {
        match self.ctx.store.current_code() {
            Some(code) => {
                load(&self.ctx, &self.cell, code);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> ViewState<HeatmapData> {
        self.cell.snapshot()
    }

    pub fn cell(&self) -> &ViewCell<HeatmapData> {
        &self.cell
    }

    pub async fn wait_idle(&self) {
        self.cell.wait_idle().await
    }
}

fn load(ctx: &ViewContext, cell: &Arc<ViewCell<HeatmapData>>, code: PeriodCode) {
    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(cell, code, async move {
        client.heatmap(Some(code)).await.map(HeatmapData::from)
    });
}
