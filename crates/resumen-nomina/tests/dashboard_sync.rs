//! Integration tests for period selection, fan-out and stale-response handling.

mod common;

use std::sync::{Arc, Mutex};

use common::ScriptedClient;
use resumen_nomina::views::{HeatmapView, ViewContext, TOTAL_TAB};
use resumen_nomina::*;

// ─────────────────────── helpers ───────────────────────

fn dashboard(client: &Arc<ScriptedClient>) -> Dashboard {
    let client: Arc<dyn AnalyticsClient> = client.clone();
    Dashboard::new(client).unwrap()
}

// ─────────────────────── bootstrap ───────────────────────

#[tokio::test]
async fn test_bootstrap_selects_server_period_and_loads_catalog() {
    let client = ScriptedClient::new();
    client
        .catalog
        .lock()
        .unwrap()
        .extend(["2025-53".to_string(), "garbage".to_string()]);
    let dash = dashboard(&client);

    let selected = dash.bootstrap().await.unwrap();
    assert_eq!(selected.map(|p| p.to_string()).as_deref(), Some("2025-44"));

    let labels: Vec<String> = dash
        .store()
        .available()
        .iter()
        .map(|p| p.to_string())
        .collect();
    assert_eq!(labels, vec!["2025-42", "2025-43", "2025-44"]);
    assert_eq!(dash.store().current_code(), Some(202544));
    assert_eq!(dash.store().prior().unwrap().to_string(), "2025-43");
}

#[tokio::test]
async fn test_bootstrap_does_not_override_user_selection() {
    let client = ScriptedClient::new();
    let gate = client.hold("current_period", None);
    let dash = dashboard(&client);

    let (result, _) = tokio::join!(dash.bootstrap(), async {
        dash.select("2025-40").unwrap();
        gate.notify_one();
    });

    assert_eq!(result.unwrap().unwrap().to_string(), "2025-40");
    assert_eq!(dash.store().current_code(), Some(202540));
}

#[tokio::test]
async fn test_bootstrap_fails_without_current_period() {
    let client = ScriptedClient::new();
    client.fail("current_period");
    let dash = dashboard(&client);

    let err = dash.bootstrap().await.unwrap_err();
    assert!(err.is_fetch_failure());
    assert!(dash.store().selected().is_none());
    // Catalog still loaded.
    assert_eq!(dash.store().available().len(), 3);
}

#[tokio::test]
async fn test_catalog_failure_keeps_selection() {
    let client = ScriptedClient::new();
    client.fail("periods");
    let dash = dashboard(&client);

    let selected = dash.bootstrap().await.unwrap();
    assert_eq!(selected.unwrap().code(), 202544);
    assert!(dash.store().available().is_empty());
}

#[tokio::test]
async fn test_bootstrap_loads_business_catalog() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    assert!(dash.businesses().is_empty());

    dash.bootstrap().await.unwrap();
    assert_eq!(dash.businesses(), vec!["Banco Azteca", "Elektra"]);

    client.fail("businesses");
    assert!(dash.load_businesses().await.unwrap_err().is_fetch_failure());
    assert_eq!(dash.businesses().len(), 2);
}

#[tokio::test]
async fn test_business_catalog_failure_does_not_fail_bootstrap() {
    let client = ScriptedClient::new();
    client.fail("businesses");
    let dash = dashboard(&client);

    let selected = dash.bootstrap().await.unwrap();
    assert_eq!(selected.unwrap().code(), 202544);
    assert!(dash.businesses().is_empty());
}

// ─────────────────────── fan-out ───────────────────────

#[tokio::test]
async fn test_select_fans_out_to_every_view() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    dash.select("2025-43").unwrap();
    dash.wait_idle().await;

    for call in [
        "national_summary:202543",
        "national_series:202543",
        "heatmap:202543",
        "results_table:total:202543",
        "zscore_alerts:202543",
        "prediction_alerts:202543",
    ] {
        assert!(client.called(call), "missing {call} in {:?}", client.calls());
    }

    let heatmap = dash.heatmap.state();
    assert_eq!(heatmap.period, Some(202543));
    assert_eq!(heatmap.data.unwrap().current_period, "2025-43");
    assert_eq!(
        dash.national.summary().data.unwrap().current_period,
        "2025-43"
    );
}

#[tokio::test]
async fn test_views_notified_in_attach_order() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    let order = Arc::new(Mutex::new(Vec::new()));

    let log = Arc::clone(&order);
    let _late = dash
        .store()
        .subscribe(move |code| log.lock().unwrap().push(code));

    dash.select("2025-44").unwrap();
    dash.wait_idle().await;

    let calls = client.calls();
    let position = |prefix: &str| calls.iter().position(|c| c.starts_with(prefix)).unwrap();
    assert!(position("national_summary") < position("heatmap"));
    assert!(position("heatmap") < position("results_table"));
    assert!(position("results_table") < position("zscore_alerts"));
    assert_eq!(*order.lock().unwrap(), vec![202544]);
}

#[tokio::test]
async fn test_reselecting_same_period_issues_no_fetch() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.wait_idle().await;
    let before = client.calls().len();

    dash.select("2025-44").unwrap();
    dash.wait_idle().await;
    assert_eq!(client.calls().len(), before);

    dash.store().refresh().unwrap();
    dash.wait_idle().await;
    assert!(client.calls().len() > before);
}

#[tokio::test]
async fn test_malformed_select_changes_nothing() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    dash.select("2025-44").unwrap();
    dash.wait_idle().await;
    let before = client.calls().len();

    for bad in ["2025-4", "25-44", "2025-00", "2025-53", "abcd-ef", "", " 2025-43 "] {
        assert!(matches!(dash.select(bad), Err(DashboardError::Validation(_))));
    }
    assert_eq!(dash.store().current_code(), Some(202544));
    assert_eq!(client.calls().len(), before);
}

// ─────────────────────── staleness ───────────────────────

#[tokio::test]
async fn test_late_response_for_old_period_is_discarded() {
    let client = ScriptedClient::new();
    let gate_a = client.hold("heatmap", Some(202543));
    let dash = dashboard(&client);
    let cell = dash.heatmap.cell();

    dash.select("2025-43").unwrap();
    dash.select("2025-44").unwrap();

    // B resolves first.
    cell.wait_settled(1).await;
    assert_eq!(dash.heatmap.state().period, Some(202544));
    assert!(!dash.heatmap.state().loading);

    // A resolves late and must not overwrite B.
    gate_a.notify_one();
    cell.wait_settled(2).await;

    let state = dash.heatmap.state();
    assert_eq!(state.period, Some(202544));
    assert_eq!(state.data.unwrap().current_period, "2025-44");
    assert!(!state.loading);
}

#[tokio::test]
async fn test_old_response_first_keeps_view_loading() {
    let client = ScriptedClient::new();
    let gate_b = client.hold("heatmap", Some(202544));
    let dash = dashboard(&client);
    let cell = dash.heatmap.cell();

    dash.select("2025-43").unwrap();
    dash.select("2025-44").unwrap();

    cell.wait_settled(1).await;
    let state = dash.heatmap.state();
    assert!(state.loading);
    assert!(state.data.is_none());

    gate_b.notify_one();
    dash.heatmap.wait_idle().await;
    assert_eq!(dash.heatmap.state().period, Some(202544));
}

#[tokio::test]
async fn test_back_and_forth_shows_final_period() {
    let client = ScriptedClient::new();
    let gate = client.hold("results_table", Some(202543));
    let dash = dashboard(&client);
    let cell = dash.results.cell();

    dash.select("2025-43").unwrap();
    dash.select("2025-44").unwrap();
    dash.select("2025-42").unwrap();

    cell.wait_settled(2).await;
    gate.notify_one();
    cell.wait_settled(3).await;

    let state = dash.results.state();
    assert_eq!(state.period, Some(202542));
    assert_eq!(state.data.unwrap().current_period, "2025-42");
}

#[tokio::test]
async fn test_nested_select_leaves_view_on_final_period() {
    let client = ScriptedClient::new();
    let analytics: Arc<dyn AnalyticsClient> = client.clone();
    let store = Arc::new(PeriodStore::new());
    let ctx = ViewContext::current(Arc::clone(&store), analytics).unwrap();

    // Subscribed ahead of the view: moves 2025-43 on to 2025-44 before the
    // view hears about 2025-43.
    let _redirect = {
        let weak = Arc::downgrade(&store);
        store.subscribe(move |code| {
            if code == 202543 {
                if let Some(store) = weak.upgrade() {
                    store.select("2025-44").unwrap();
                }
            }
        })
    };
    let view = HeatmapView::attach(ctx);

    store.select("2025-43").unwrap();
    view.wait_idle().await;

    assert_eq!(store.current_code(), Some(202544));
    let state = view.state();
    assert!(!state.loading);
    assert_eq!(state.period, Some(202544));
    assert_eq!(state.data.unwrap().current_period, "2025-44");
    assert!(!client.called("heatmap:202543"));
}

// ─────────────────────── views ───────────────────────

#[tokio::test]
async fn test_alert_failures_are_independent() {
    let client = ScriptedClient::new();
    client.fail("zscore_alerts");
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.alerts.wait_idle().await;

    assert!(dash.alerts.zscore().error.is_some());
    assert!(dash.alerts.zscore_alerts().is_empty());
    assert!(dash.alerts.prediction().error.is_none());
    assert_eq!(dash.alerts.prediction_alerts().len(), 1);
}

#[tokio::test]
async fn test_alerts_filter_by_severity() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.alerts.wait_idle().await;

    let critical = dash.alerts.zscore_by_severity(Severity::Critical);
    assert_eq!(critical.len(), 1);
    assert_eq!(critical[0].business, "Elektra");
}

#[tokio::test]
async fn test_failure_then_success_clears_error() {
    let client = ScriptedClient::new();
    client.fail("heatmap");
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.heatmap.wait_idle().await;
    assert!(dash.heatmap.state().error.is_some());

    client.recover("heatmap");
    dash.store().refresh().unwrap();
    dash.heatmap.wait_idle().await;
    let state = dash.heatmap.state();
    assert!(state.error.is_none());
    assert!(state.data.is_some());
}

#[tokio::test]
async fn test_heatmap_view_holds_layout() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.heatmap.wait_idle().await;

    let layout = dash.heatmap.state().data.unwrap().layout;
    let names: Vec<_> = layout.groups.iter().map(|g| g.business.as_str()).collect();
    assert_eq!(names, vec!["Banco Azteca", "Elektra"]);
    assert_eq!(layout.group("Banco Azteca").unwrap().weight, 8);
    assert_eq!(layout.group("Elektra").unwrap().weight, 2);
}

#[tokio::test]
async fn test_results_mode_switch_reloads_average() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    dash.select("2025-44").unwrap();
    dash.results.wait_idle().await;
    assert_eq!(dash.results.mode(), TableMode::Total);

    dash.results.set_mode(TableMode::Average);
    dash.results.wait_idle().await;

    assert!(client.called("results_table:promedio:202544"));
    let grouped = dash.results.state().data.unwrap();
    assert_eq!(grouped.mode, TableMode::Average);
    let elektra: Vec<_> = grouped
        .rows_for("Elektra")
        .iter()
        .map(|r| r.position.as_str())
        .collect();
    assert_eq!(elektra, vec!["Cajero", "Gerente"]);
}

#[tokio::test]
async fn test_national_business_tab() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    assert_eq!(dash.national.selected_business(), TOTAL_TAB);

    dash.select("2025-44").unwrap();
    dash.national.wait_idle().await;
    assert!(dash.national.series().data.unwrap().business.is_none());
    assert_eq!(dash.national.positions().data, Some(Vec::new()));

    dash.national.select_business("Elektra");
    dash.national.wait_idle().await;

    assert!(client.called("business_series:Elektra:202544"));
    let series = dash.national.series().data.unwrap();
    assert_eq!(series.business.as_deref(), Some("Elektra"));
    assert_eq!(
        dash.national.positions().data,
        Some(vec!["Cajero".to_string(), "Gerente".to_string()])
    );
}

#[tokio::test]
async fn test_business_view_chain_and_defaults() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    dash.select("2025-44").unwrap();

    let view = dash.open_business("Elektra").unwrap();
    view.wait_idle().await;

    let selection = view.selection();
    assert_eq!(selection.position.as_deref(), Some("Cajero"));
    assert_eq!(selection.indicator.as_deref(), Some("Compensación"));
    assert!(client.called("indicator_summary:Elektra:Cajero:202544"));
    assert!(client.called("indicator_series:Elektra:Cajero:Compensación:202544"));
    assert_eq!(view.summary().data.unwrap().len(), 1);

    view.select_position("Gerente").unwrap();
    view.wait_idle().await;
    assert!(client.called("indicators:Elektra:Gerente"));
    assert!(client.called("indicator_series:Elektra:Gerente:Compensación:202544"));

    view.select_indicator("Bono").unwrap();
    view.wait_idle().await;
    assert_eq!(
        view.series().data.unwrap().indicator.as_deref(),
        Some("Bono")
    );

    dash.select("2025-43").unwrap();
    view.wait_idle().await;
    assert!(client.called("indicator_summary:Elektra:Gerente:202543"));
    assert!(client.called("indicator_series:Elektra:Gerente:Bono:202543"));
}

#[tokio::test]
async fn test_business_view_rejects_unknown_selection() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);

    assert!(matches!(
        dash.open_business("Elektra"),
        Err(DashboardError::Encoding(_))
    ));

    dash.select("2025-44").unwrap();
    let view = dash.open_business("Elektra").unwrap();
    view.wait_idle().await;
    assert!(matches!(
        view.select_position("Astronauta"),
        Err(DashboardError::Validation(_))
    ));
    assert!(matches!(
        view.select_indicator("Nada"),
        Err(DashboardError::Validation(_))
    ));
}

#[tokio::test]
async fn test_default_indicator_falls_back_to_first() {
    let client = ScriptedClient::new();
    *client.indicators.lock().unwrap() = vec!["Bono".to_string(), "Comisiones".to_string()];
    let dash = dashboard(&client);
    dash.select("2025-44").unwrap();

    let view = dash.open_business("Italika").unwrap();
    view.wait_idle().await;
    assert_eq!(view.selection().indicator.as_deref(), Some("Bono"));
}

#[tokio::test]
async fn test_dropped_view_unsubscribes() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    let sync = Arc::clone(dash.store().synchronizer());
    assert_eq!(sync.len(), 4);

    dash.select("2025-44").unwrap();
    let view = dash.open_business("Elektra").unwrap();
    assert_eq!(sync.len(), 5);
    view.wait_idle().await;

    drop(view);
    assert_eq!(sync.len(), 4);

    drop(dash);
    assert!(sync.is_empty());
}

// ─────────────────────── status ───────────────────────

#[tokio::test]
async fn test_server_status() {
    let client = ScriptedClient::new();
    let dash = dashboard(&client);
    let status = dash.status().await;
    assert!(status.online);
    assert_eq!(status.total_records, 48_210);
    assert_eq!(status.version.as_deref(), Some("1.2.0"));

    let down = ScriptedClient::new();
    down.fail("server_info");
    let status = dashboard(&down).status().await;
    assert_eq!(status, ServerStatus::offline());
}
