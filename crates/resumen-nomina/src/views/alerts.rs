//! Alerts view: Z-score and prediction alerts, fetched independently.
//!
//! The two cells never share a request, so one endpoint failing leaves the
//! other list intact.

use std::sync::Arc;

use crate::period::PeriodCode;
use crate::sync::Subscription;
use crate::types::{PredictionAlert, Severity, ZScoreAlert};

use super::{ViewCell, ViewContext, ViewState};

pub struct AlertsView {
    ctx: ViewContext,
    zscore: Arc<ViewCell<Vec<ZScoreAlert>>>,
    prediction: Arc<ViewCell<Vec<PredictionAlert>>>,
    _subscription: Subscription,
}

impl AlertsView {
    pub fn attach(ctx: ViewContext) -> Self {
        let zscore = Arc::new(ViewCell::new("alerts.zscore"));
        let prediction = Arc::new(ViewCell::new("alerts.prediction"));

        let subscription = {
            let ctx = ctx.clone();
            let (zscore, prediction) = (Arc::clone(&zscore), Arc::clone(&prediction));
            let store = Arc::clone(&ctx.store);
            store.subscribe(move |code| {
                ctx.follow_selection(code, |code| load(&ctx, &zscore, &prediction, code))
            })
        };

        if let Some(code) = ctx.store.current_code() {
            load(&ctx, &zscore, &prediction, code);
        }

        Self {
            ctx,
            zscore,
            prediction,
            _subscription: subscription,
        }
    }

    pub fn reload(&self) -> bool {
        match self.ctx.store.current_code() {
            Some(code) => {
                load(&self.ctx, &self.zscore, &self.prediction, code);
                true
            }
            None => false,
        }
    }

    pub fn zscore(&self) -> ViewState<Vec<ZScoreAlert>> {
        self.zscore.snapshot()
    }

    pub fn prediction(&self) -> ViewState<Vec<PredictionAlert>> {
        self.prediction.snapshot()
    }

    /// Z-score alerts to render; empty when the fetch failed.
    pub fn zscore_alerts(&self) -> Vec<ZScoreAlert> {
        self.zscore.data().unwrap_or_default()
    }

    /// Prediction alerts to render; empty when the fetch failed.
    pub fn prediction_alerts(&self) -> Vec<PredictionAlert> {
        self.prediction.data().unwrap_or_default()
    }

    /// Z-score alerts at the given severity.
    pub fn zscore_by_severity(&self, severity: Severity) -> Vec<ZScoreAlert> {
        self.zscore_alerts()
            .into_iter()
            .filter(|a| a.severity == severity)
            .collect()
    }

    pub async fn wait_idle(&self) {
        self.zscore.wait_idle().await;
        self.prediction.wait_idle().await;
    }
}

fn load(
    ctx: &ViewContext,
    zscore: &Arc<ViewCell<Vec<ZScoreAlert>>>,
    prediction: &Arc<ViewCell<Vec<PredictionAlert>>>,
    code: PeriodCode,
) {
    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(zscore, code, async move {
        client.zscore_alerts(Some(code)).await
    });

    let client = Arc::clone(&ctx.client);
    ctx.spawn_tagged(prediction, code, async move {
        client.prediction_alerts(Some(code)).await
    });
}
