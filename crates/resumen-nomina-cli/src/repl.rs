//! Interactive REPL over a live dashboard.
//!
//! Launch with `resumen-nomina repl` (or with no subcommand).
//! Type `/help` for available commands, Tab for completion.
//!
//! Readline blocks, so the REPL runs on a blocking thread and drives the
//! async side through a runtime [`Handle`].

use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::config::CompletionType;
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
    Cmd, ConditionalEventHandler, Config, Editor, Event, EventContext, EventHandler, Helper,
    KeyEvent, RepeatCount,
};
use tokio::runtime::Handle;

use resumen_nomina::views::BusinessView;
use resumen_nomina::{Dashboard, PeriodStore, TableMode};

use crate::render;

/// Available REPL commands.
const COMMANDS: &[(&str, &str)] = &[
    ("/periods", "List the period catalog"),
    ("/select", "Select a period (YYYY-WW)"),
    ("/prior", "Show the selected and prior period"),
    ("/nacional", "National summary and series (optionally for one business)"),
    ("/negocios", "List the business catalog"),
    ("/negocio", "Open a business view"),
    ("/puesto", "Select a position in the open business"),
    ("/indicador", "Select an indicator in the open business"),
    ("/heatmap", "Show the variation heat map"),
    ("/table", "Results table (total | promedio)"),
    ("/alerts", "Z-score and prediction alerts"),
    ("/refresh", "Reload every view for the selected period"),
    ("/status", "Check the analytics API"),
    ("/clear", "Clear the screen"),
    ("/help", "Show available commands"),
    ("/exit", "Quit the REPL"),
];

/// REPL helper for tab completion.
struct DashboardHelper {
    store: Arc<PeriodStore>,
    businesses: Vec<String>,
}

impl Completer for DashboardHelper {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let input = &line[..pos];

        if !input.contains(' ') {
            let matches: Vec<Pair> = COMMANDS
                .iter()
                .filter(|(cmd, _)| cmd.starts_with(input))
                .map(|(cmd, desc)| Pair {
                    display: format!("{cmd:<16} {desc}"),
                    replacement: format!("{cmd} "),
                })
                .collect();
            return Ok((0, matches));
        }

        let parts: Vec<&str> = input.splitn(2, ' ').collect();
        let cmd = parts[0];
        let args = if parts.len() > 1 { parts[1] } else { "" };
        let prefix_start = input.len() - args.len();

        let candidates: Vec<String> = match cmd {
            "/select" => self
                .store
                .available()
                .iter()
                .rev()
                .map(|p| p.to_string())
                .collect(),
            "/table" => vec!["total".to_string(), "promedio".to_string()],
            "/negocio" | "/nacional" => self.businesses.clone(),
            _ => return Ok((pos, Vec::new())),
        };

        let matches: Vec<Pair> = candidates
            .into_iter()
            .filter(|c| c.starts_with(args.trim()))
            .map(|c| Pair {
                display: c.clone(),
                replacement: format!("{c} "),
            })
            .collect();
        Ok((prefix_start, matches))
    }
}

impl Hinter for DashboardHelper {
    type Hint = String;

    fn hint(&self, line: &str, pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        if pos < line.len() || line.is_empty() {
            return None;
        }
        if line.starts_with('/') && !line.contains(' ') {
            for (cmd, _) in COMMANDS {
                if cmd.starts_with(line) && *cmd != line {
                    return Some(cmd[line.len()..].to_string());
                }
            }
        }
        None
    }
}

impl Highlighter for DashboardHelper {}
impl Validator for DashboardHelper {}
impl Helper for DashboardHelper {}

struct TabCompleteOrAcceptHint;

impl ConditionalEventHandler for TabCompleteOrAcceptHint {
    fn handle(
        &self,
        _evt: &Event,
        _n: RepeatCount,
        _positive: bool,
        ctx: &EventContext<'_>,
    ) -> Option<Cmd> {
        if ctx.has_hint() {
            Some(Cmd::CompleteHint)
        } else {
            Some(Cmd::Complete)
        }
    }
}

/// Session state.
struct ReplState {
    dashboard: Dashboard,
    runtime: Handle,
    business: Option<BusinessView>,
    ansi: bool,
}

/// Run the interactive REPL. Call from a blocking thread, not from async code.
pub fn run(dashboard: Dashboard, runtime: Handle, ansi: bool) -> anyhow::Result<()> {
    eprintln!();
    eprintln!(
        "  \x1b[32m\u{25c9}\x1b[0m \x1b[1mresumen-nomina v{}\x1b[0m \x1b[90mpayroll summary dashboard\x1b[0m",
        env!("CARGO_PKG_VERSION")
    );
    eprintln!();
    eprintln!(
        "    Press \x1b[36m/\x1b[0m to browse commands, \x1b[90mTab\x1b[0m to complete, \x1b[90m/exit\x1b[0m to quit."
    );
    eprintln!();

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .completion_type(CompletionType::List)
        .completion_prompt_limit(20)
        .build();

    let mut rl: Editor<DashboardHelper, rustyline::history::DefaultHistory> =
        Editor::with_config(config)?;
    rl.set_helper(Some(DashboardHelper {
        store: Arc::clone(dashboard.store()),
        businesses: dashboard.businesses(),
    }));
    rl.bind_sequence(
        KeyEvent::from('\t'),
        EventHandler::Conditional(Box::new(TabCompleteOrAcceptHint)),
    );

    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());
    let hist_path = std::path::PathBuf::from(&home).join(".resumen_nomina_history");
    if hist_path.exists() {
        let _ = rl.load_history(&hist_path);
    }

    let mut state = ReplState {
        dashboard,
        runtime,
        business: None,
        ansi,
    };

    loop {
        let prompt = match state.dashboard.store().selected() {
            Some(period) => format!(" \x1b[36mnomina {period}>\x1b[0m "),
            None => " \x1b[36mnomina>\x1b[0m ".to_string(),
        };
        match rl.readline(&prompt) {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }

                let input = line.strip_prefix('/').unwrap_or(line);
                if input.is_empty() {
                    cmd_help();
                    continue;
                }

                let mut parts = input.splitn(2, ' ');
                let cmd = parts.next().unwrap_or("");
                let args = parts.next().unwrap_or("").trim();

                match cmd {
                    "exit" | "quit" => {
                        eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                        break;
                    }
                    "help" | "h" | "?" => cmd_help(),
                    "clear" | "cls" => eprint!("\x1b[2J\x1b[H"),
                    "periods" => cmd_periods(&state),
                    "select" => cmd_select(args, &state),
                    "prior" => cmd_prior(&state),
                    "nacional" | "national" => cmd_national(args, &state),
                    "negocios" | "businesses" => {
                        let names = cmd_businesses(&state);
                        if let Some(helper) = rl.helper_mut() {
                            helper.businesses = names;
                        }
                    }
                    "negocio" | "business" => cmd_business(args, &mut state),
                    "puesto" | "position" => cmd_position(args, &state),
                    "indicador" | "indicator" => cmd_indicator(args, &state),
                    "heatmap" => cmd_heatmap(&state),
                    "table" => cmd_table(args, &state),
                    "alerts" => cmd_alerts(&state),
                    "refresh" => cmd_refresh(&state),
                    "status" => cmd_status(&state),
                    _ => {
                        eprintln!("  Unknown command '/{cmd}'. Type /help for commands.");
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                eprintln!("  \x1b[90m(Ctrl+C)\x1b[0m Type \x1b[1m/exit\x1b[0m to quit.");
            }
            Err(ReadlineError::Eof) => {
                eprintln!("  \x1b[90m\u{2728}\x1b[0m Goodbye!");
                break;
            }
            Err(err) => {
                eprintln!("  Error: {err}");
                break;
            }
        }
    }

    let _ = std::fs::create_dir_all(hist_path.parent().unwrap_or(std::path::Path::new(".")));
    let _ = rl.save_history(&hist_path);

    Ok(())
}

fn cmd_help() {
    eprintln!();
    eprintln!("  Commands:");
    eprintln!();
    for (cmd, desc) in COMMANDS {
        eprintln!("    {cmd:<18} {desc}");
    }
    eprintln!();
    eprintln!("  Tip: Tab completes commands, period labels, business names and table modes.");
    eprintln!();
}

fn cmd_periods(state: &ReplState) {
    eprint!("{}", render::periods(&state.dashboard.store().snapshot()));
}

fn cmd_select(args: &str, state: &ReplState) {
    if args.is_empty() {
        eprintln!("  Usage: /select <YYYY-WW>");
        return;
    }
    match state.dashboard.select(args) {
        Ok(period) => {
            eprintln!("  Selected {period} (prior {})", period.prior());
            state.runtime.block_on(state.dashboard.wait_idle());
        }
        Err(e) => eprintln!("  {e}"),
    }
}

fn cmd_prior(state: &ReplState) {
    let store = state.dashboard.store();
    match (store.selected(), store.prior(), store.current_code()) {
        (Some(current), Some(prior), Some(code)) => {
            eprintln!("  Current: {current} (code {code})");
            eprintln!("  Prior:   {prior}");
        }
        _ => eprintln!("  No period selected yet."),
    }
}

fn cmd_national(args: &str, state: &ReplState) {
    let national = &state.dashboard.national;
    if !args.is_empty() {
        national.select_business(args);
    }
    state.runtime.block_on(national.wait_idle());
    eprintln!();
    eprint!("{}", render::state(&national.summary(), render::national));
    eprintln!();
    eprint!("{}", render::state(&national.series(), |s| render::series(s, 8)));
    if let Some(positions) = national.positions().data.filter(|p| !p.is_empty()) {
        eprintln!("  Positions: {}", positions.join(", "));
    }
    eprintln!();
}

/// Reload and print the business catalog; returns it for completion.
fn cmd_businesses(state: &ReplState) -> Vec<String> {
    if let Err(e) = state.runtime.block_on(state.dashboard.load_businesses()) {
        eprintln!("  {e}");
    }
    let names = state.dashboard.businesses();
    eprint!("{}", render::businesses(&names));
    names
}

fn cmd_business(args: &str, state: &mut ReplState) {
    if args.is_empty() {
        match &state.business {
            Some(view) => show_business(view, state),
            None => eprintln!("  Usage: /negocio <name>"),
        }
        return;
    }
    // Drop the previous view first so it stops listening.
    state.business = None;
    match state.dashboard.open_business(args) {
        Ok(view) => {
            state.business = Some(view);
            if let Some(view) = &state.business {
                show_business(view, state);
            }
        }
        Err(e) => eprintln!("  {e}"),
    }
}

fn cmd_position(args: &str, state: &ReplState) {
    let Some(view) = &state.business else {
        eprintln!("  Open a business first: /negocio <name>");
        return;
    };
    match view.select_position(args) {
        Ok(()) => show_business(view, state),
        Err(e) => eprintln!("  {e}"),
    }
}

fn cmd_indicator(args: &str, state: &ReplState) {
    let Some(view) = &state.business else {
        eprintln!("  Open a business first: /negocio <name>");
        return;
    };
    match view.select_indicator(args) {
        Ok(()) => show_business(view, state),
        Err(e) => eprintln!("  {e}"),
    }
}

fn show_business(view: &BusinessView, state: &ReplState) {
    state.runtime.block_on(view.wait_idle());
    let selection = view.selection();
    eprintln!();
    eprintln!(
        "  {}: position {}, indicator {}",
        view.business(),
        selection.position.as_deref().unwrap_or("-"),
        selection.indicator.as_deref().unwrap_or("-")
    );
    if let Some(positions) = view.positions().data {
        eprintln!("  Positions:  {}", positions.join(", "));
    }
    if let Some(indicators) = view.indicators().data {
        eprintln!("  Indicators: {}", indicators.join(", "));
    }
    eprint!("{}", render::state(&view.summary(), |s| render::indicator_summary(s)));
    eprint!("{}", render::state(&view.series(), |s| render::series(s, 8)));
    eprintln!();
}

fn cmd_heatmap(state: &ReplState) {
    let heatmap = &state.dashboard.heatmap;
    state.runtime.block_on(heatmap.wait_idle());
    eprintln!();
    eprint!(
        "{}",
        render::state(&heatmap.state(), |data| render::heatmap(data, state.ansi))
    );
    eprintln!();
}

fn cmd_table(args: &str, state: &ReplState) {
    let results = &state.dashboard.results;
    if !args.is_empty() {
        match args.parse::<TableMode>() {
            Ok(mode) => results.set_mode(mode),
            Err(e) => {
                eprintln!("  {e}");
                return;
            }
        }
    }
    state.runtime.block_on(results.wait_idle());
    eprintln!();
    eprint!("{}", render::state(&results.state(), render::results));
    eprintln!();
}

fn cmd_alerts(state: &ReplState) {
    let alerts = &state.dashboard.alerts;
    state.runtime.block_on(alerts.wait_idle());
    eprintln!();
    eprint!("{}", render::state(&alerts.zscore(), |a| render::zscore_alerts(a)));
    eprint!(
        "{}",
        render::state(&alerts.prediction(), |a| render::prediction_alerts(a))
    );
    eprintln!();
}

fn cmd_refresh(state: &ReplState) {
    match state.dashboard.store().refresh() {
        Ok(code) => {
            state.runtime.block_on(state.dashboard.wait_idle());
            eprintln!("  Reloaded period {code}");
        }
        Err(e) => eprintln!("  {e}"),
    }
}

fn cmd_status(state: &ReplState) {
    let status = state.runtime.block_on(state.dashboard.status());
    eprint!("{}", render::status(&status));
}
