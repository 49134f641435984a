//! Resumen Nómina CLI — entry point.

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use resumen_nomina::{Dashboard, DashboardConfig, TableMode};
use resumen_nomina_cli::{render, repl};

#[derive(Parser)]
#[command(
    name = "resumen-nomina",
    about = "Payroll summary dashboard in the terminal: national totals, heat map, results and alerts",
    version
)]
struct Cli {
    /// Analytics API base URL.
    /// Also reads from RESUMEN_NOMINA_API_URL.
    #[arg(long)]
    api_url: Option<String>,

    /// Request timeout in milliseconds.
    /// Also reads from RESUMEN_NOMINA_TIMEOUT_MS.
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Period to show (YYYY-WW) instead of the server's current one.
    #[arg(short, long, global = true)]
    period: Option<String>,

    /// Disable ANSI colors in the heat map.
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch interactive REPL mode (default).
    Repl,

    /// List the period catalog and the selected period.
    Periods,

    /// List the business catalog.
    Businesses,

    /// National summary, optionally with one business's series.
    Summary {
        /// Business tab for the series (default: Total).
        #[arg(short, long)]
        business: Option<String>,
    },

    /// Business detail: positions, indicator summary and series.
    Business {
        /// Business name.
        name: String,

        /// Position (default: first).
        #[arg(long)]
        position: Option<String>,

        /// Indicator (default: Compensación, else first).
        #[arg(long)]
        indicator: Option<String>,
    },

    /// Variation heat map.
    Heatmap,

    /// Results table grouped by business.
    Table {
        /// total or promedio.
        #[arg(short, long, default_value = "total")]
        mode: TableMode,
    },

    /// Z-score and prediction alerts.
    Alerts,

    /// Check the analytics API.
    Status,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   resumen-nomina completions bash > ~/.local/share/bash-completion/completions/resumen-nomina
    ///   resumen-nomina completions zsh > ~/.zfunc/_resumen-nomina
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let command = cli.command.unwrap_or(Commands::Repl);
    if let Commands::Completions { shell } = command {
        let mut cmd = Cli::command();
        clap_complete::generate(shell, &mut cmd, "resumen-nomina", &mut std::io::stdout());
        return Ok(());
    }

    let config = DashboardConfig::resolve(cli.api_url.as_deref(), cli.timeout_ms)?;
    let dashboard = Dashboard::from_config(&config)?;

    if let Commands::Status = command {
        print!("{}", render::status(&dashboard.status().await));
        return Ok(());
    }

    if let Err(e) = dashboard.bootstrap().await {
        tracing::warn!("Bootstrap incomplete: {e}");
    }
    if let Some(period) = cli.period.as_deref() {
        dashboard.select(period)?;
    }
    let ansi = !cli.no_color;

    match command {
        Commands::Repl => {
            let runtime = tokio::runtime::Handle::current();
            tokio::task::spawn_blocking(move || repl::run(dashboard, runtime, ansi)).await??;
        }

        Commands::Periods => {
            print!("{}", render::periods(&dashboard.store().snapshot()));
        }

        Commands::Businesses => {
            print!("{}", render::businesses(&dashboard.businesses()));
        }

        Commands::Summary { business } => {
            let national = &dashboard.national;
            if let Some(business) = business {
                national.select_business(&business);
            }
            national.wait_idle().await;
            print!("{}", render::state(&national.summary(), render::national));
            print!(
                "{}",
                render::state(&national.series(), |s| render::series(s, 12))
            );
        }

        Commands::Business {
            name,
            position,
            indicator,
        } => {
            let view = dashboard.open_business(&name)?;
            view.wait_idle().await;
            if let Some(position) = position {
                view.select_position(&position)?;
                view.wait_idle().await;
            }
            if let Some(indicator) = indicator {
                view.select_indicator(&indicator)?;
                view.wait_idle().await;
            }
            let selection = view.selection();
            println!(
                "  {}: position {}, indicator {}",
                view.business(),
                selection.position.as_deref().unwrap_or("-"),
                selection.indicator.as_deref().unwrap_or("-")
            );
            print!(
                "{}",
                render::state(&view.summary(), |s| render::indicator_summary(s))
            );
            print!("{}", render::state(&view.series(), |s| render::series(s, 12)));
        }

        Commands::Heatmap => {
            dashboard.heatmap.wait_idle().await;
            print!(
                "{}",
                render::state(&dashboard.heatmap.state(), |d| render::heatmap(d, ansi))
            );
        }

        Commands::Table { mode } => {
            let results = &dashboard.results;
            if mode != results.mode() {
                results.set_mode(mode);
            }
            results.wait_idle().await;
            print!("{}", render::state(&results.state(), render::results));
        }

        Commands::Alerts => {
            let alerts = &dashboard.alerts;
            alerts.wait_idle().await;
            print!("{}", render::state(&alerts.zscore(), |a| render::zscore_alerts(a)));
            print!(
                "{}",
                render::state(&alerts.prediction(), |a| render::prediction_alerts(a))
            );
        }

        Commands::Status | Commands::Completions { .. } => {}
    }

    Ok(())
}
