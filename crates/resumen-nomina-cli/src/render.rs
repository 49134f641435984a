//! Plain-text rendering of dashboard state for the terminal.
//!
//! Every function returns a `String` so the REPL and the one-shot commands
//! share the same output, and tests can look at it.

use std::fmt::Write;

use resumen_nomina::views::{HeatmapData, ViewState};
use resumen_nomina::{
    GroupedResults, IndicatorSummary, NationalSummary, PeriodState, PredictionAlert, Rgb,
    ServerStatus, TimeSeries, ZScoreAlert,
};

/// `1234567.8` → `$1,234,568`.
pub fn money(value: f64) -> String {
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded < 0.0 {
        format!("-${grouped}")
    } else {
        format!("${grouped}")
    }
}

/// Signed percentage with two decimals.
pub fn percent(value: f64) -> String {
    format!("{value:+.2}%")
}

/// Render a view's state, or its loading / error placeholder.
pub fn state<T>(state: &ViewState<T>, render: impl FnOnce(&T) -> String) -> String {
    if let Some(error) = &state.error {
        return format!("  error: {error}\n");
    }
    match &state.data {
        Some(data) => render(data),
        None if state.loading => "  loading...\n".to_string(),
        None => "  no data\n".to_string(),
    }
}

pub fn periods(state: &PeriodState) -> String {
    let mut out = String::new();
    let selected = state.selected;
    for period in &state.available {
        let marker = if Some(*period) == selected { "*" } else { " " };
        let _ = writeln!(out, "  {marker} {period}");
    }
    match (selected, state.prior()) {
        (Some(current), Some(prior)) => {
            let _ = writeln!(out, "  selected {current} (code {}), prior {prior}", current.code());
        }
        _ => out.push_str("  no period selected\n"),
    }
    out
}

pub fn national(summary: &NationalSummary) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  National {} vs {}: {} → {} ({}, {})",
        summary.current_period,
        summary.prior_period,
        money(summary.total_prior),
        money(summary.total_current),
        money(summary.difference),
        percent(summary.percent_change)
    );
    let _ = writeln!(
        out,
        "  {:<24} {:>16} {:>16} {:>10} {:>10}",
        "Business", "Current", "Prior", "Change", "Employees"
    );
    for b in &summary.businesses {
        let _ = writeln!(
            out,
            "  {:<24} {:>16} {:>16} {:>10} {:>10}",
            b.business,
            money(b.current),
            money(b.prior),
            percent(b.percent_change),
            b.employees
        );
    }
    out
}

/// Series statistics plus the most recent points; `*` marks points outside
/// 1σ, `**` outside 1.5σ.
pub fn series(series: &TimeSeries, last: usize) -> String {
    let mut out = String::new();
    let title = [&series.business, &series.position, &series.indicator]
        .into_iter()
        .flatten()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(" / ");
    let title = if title.is_empty() { "National" } else { &title };
    let _ = writeln!(
        out,
        "  {title}: mean {} sd {} min {} max {} ({} points)",
        money(series.mean),
        money(series.std_dev),
        money(series.min),
        money(series.max),
        series.point_count
    );
    let skip = series.points.len().saturating_sub(last);
    for point in series.points.iter().skip(skip) {
        let flag = if point.outside_1_5_sigma {
            "**"
        } else if point.outside_1_sigma {
            "*"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "    {:<8} {:>16} {:>10} {flag}",
            point.week,
            money(point.value),
            percent(point.change_vs_prior)
        );
    }
    out
}

pub fn indicator_summary(rows: &[IndicatorSummary]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  {:<28} {:>16} {:>16} {:>10}",
        "Indicator", "Current", "Prior", "Change"
    );
    for row in rows {
        let _ = writeln!(
            out,
            "  {:<28} {:>16} {:>16} {:>10}",
            row.indicator,
            money(row.current),
            money(row.prior),
            percent(row.percent_change)
        );
    }
    out
}

fn swatch(color: Rgb, text: &str, ansi: bool) -> String {
    if ansi {
        format!(
            "\x1b[48;2;{};{};{}m\x1b[30m {text} \x1b[0m",
            color.r, color.g, color.b
        )
    } else {
        format!("[{text}]")
    }
}

/// One line per business group, cells in layout order.
pub fn heatmap(data: &HeatmapData, ansi: bool) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Heat map {} vs {} ({} positions)",
        data.current_period,
        data.prior_period,
        data.layout.cell_count()
    );
    for group in &data.layout.groups {
        let _ = writeln!(out, "  {} (weight {})", group.business, group.weight);
        for cell in &group.cells {
            let label = format!(
                "{} {} w{}",
                cell.record.item,
                percent(cell.record.percent_change),
                cell.weight
            );
            let _ = writeln!(out, "    {}", swatch(cell.color, &label, ansi));
        }
    }
    out
}

pub fn results(grouped: &GroupedResults) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "  Results ({}) {} vs {}: {} rows",
        grouped.mode.label(),
        grouped.current_period,
        grouped.prior_period,
        grouped.row_count()
    );
    for (business, rows) in grouped.sections() {
        let _ = writeln!(out, "  {business}");
        for row in rows {
            let _ = writeln!(
                out,
                "    {:<28} {:>16} {:>16} {:>10}",
                row.position,
                money(row.current),
                money(row.prior),
                percent(row.percent_change)
            );
        }
    }
    out
}

pub fn zscore_alerts(alerts: &[ZScoreAlert]) -> String {
    let mut out = format!("  Z-score alerts: {}\n", alerts.len());
    for a in alerts {
        let _ = writeln!(
            out,
            "    [{:<8}] {} / {} / {}: {} (z {:.2})",
            a.severity.label(),
            a.business,
            a.position,
            a.indicator,
            percent(a.percent_change_vs_prior),
            a.z_score
        );
    }
    out
}

pub fn prediction_alerts(alerts: &[PredictionAlert]) -> String {
    let mut out = format!("  Prediction alerts: {}\n", alerts.len());
    for a in alerts {
        let history = if a.insufficient_history {
            " (short history)"
        } else {
            ""
        };
        let _ = writeln!(
            out,
            "    {} / {} / {}: {} outside [{}, {}]{history}",
            a.business,
            a.position,
            a.indicator,
            money(a.observed),
            money(a.lower_limit),
            money(a.upper_limit)
        );
    }
    out
}

pub fn businesses(names: &[String]) -> String {
    if names.is_empty() {
        return "  no businesses loaded\n".to_string();
    }
    let mut out = String::new();
    for name in names {
        let _ = writeln!(out, "  {name}");
    }
    let _ = writeln!(out, "  {} businesses", names.len());
    out
}

pub fn status(status: &ServerStatus) -> String {
    if !status.online {
        return "  API offline\n".to_string();
    }
    match &status.version {
        Some(version) => format!(
            "  API online (v{version}), {} records\n",
            status.total_records
        ),
        None => format!("  API online, {} records\n", status.total_records),
    }
}
