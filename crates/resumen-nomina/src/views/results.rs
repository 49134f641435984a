//! Results-table view: TOTAL / AVERAGE table grouped by business.

use std::sync::{Arc, Mutex};

use crate::period::PeriodCode;
use crate::sync::Subscription;
use crate::table::GroupedResults;
use crate::types::TableMode;

use super::{ViewCell, ViewContext, ViewState};

pub struct ResultsTableView {
    ctx: ViewContext,
    cell: Arc<ViewCell<GroupedResults>>,
    mode: Arc<Mutex<TableMode>>,
    _subscription: Subscription,
}

impl ResultsTableView {
    pub fn attach(ctx: ViewContext) -> Self {
        let cell = Arc::new(ViewCell::new("results"));
        let mode = Arc::new(Mutex::new(TableMode::default()));

        let subscription = {
            let ctx = ctx.clone();
            let cell = Arc::clone(&cell);
            let mode = Arc::clone(&mode);
            let store = Arc::clone(&ctx.store);
            store.subscribe(move |code| {
                ctx.follow_selection(code, |code| load(&ctx, &cell, current_mode(&mode), code))
            })
        };

        if let Some(code) = ctx.store.current_code() {
            load(&ctx, &cell, current_mode(&mode), code);
        }

        Self {
            ctx,
            cell,
            mode,
            _subscription: subscription,
        }
    }

    pub fn mode(&self) -> TableMode {
        current_mode(&self.mode)
    }

    /// Switch between TOTAL and AVERAGE and reload for the current period.
    pub fn set_mode(&self, mode: TableMode) {
        *self.mode.lock().unwrap_or_else(|e| e.into_inner()) = mode;
        tracing::info!("results table mode -> {}", mode.label());
        if let Some(code) = self.ctx.store.current_code() {
            load(&self.ctx, &self.cell, mode, code);
        }
    }

    pub fn reload(&self) -> bool {
        match self.ctx.store.current_code() {
            Some(code) => {
                load(&self.ctx, &self.cell, self.mode(), code);
                true
            }
            None => false,
        }
    }

    pub fn state(&self) -> ViewState<GroupedResults> {
        self.cell.snapshot()
    }

    pub fn cell(&self) -> &ViewCell<GroupedResults> {
        &self.cell
    }

    pub async fn wait_idle(&self) {
        self.cell.wait_idle().await
    }
}

fn current_mode(mode: &Mutex<TableMode>) -> TableMode {
    *mode.lock().unwrap_or_else(|e| e.into_inner())
}

fn load(ctx: &ViewContext, cell: &Arc<ViewCell<GroupedResults>>, mode: TableMode, code: PeriodCode) {
    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(cell, code, async move {
        client
            .results_table(mode, Some(code))
            .await
            .map(|table| {
                let mut grouped = GroupedResults::from_table(table);
                // The endpoint decides the mode, whatever the payload says.
                grouped.mode = mode;
                grouped
            })
    });
}
