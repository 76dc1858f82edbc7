mod activity;
mod api;
mod cli;
mod config;
mod engine;
mod report;

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use activity::ActivityLog;
use api::{HttpScanApi, ScanApi};
use cli::{Cli, Commands, ExportArgs, IndexArgs, OutputFormat, ScanArgs};
use config::ScanboardConfig;
use engine::{DirectorySink, ExportController, ScanController, UiState};
use report::json::JsonPort;
use report::terminal::{self, TerminalPort};
use report::{round_score, RenderPort};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging. The dashboard draws its own activity panel, so
    // it only gets warnings unless asked for more.
    let interactive = matches!(cli.command, None | Some(Commands::Dashboard(_)));
    let filter = if cli.verbose {
        EnvFilter::new("scanboard=debug")
    } else if cli.quiet {
        EnvFilter::new("scanboard=error")
    } else if interactive {
        EnvFilter::new("scanboard=warn")
    } else {
        EnvFilter::new("scanboard=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;
    info!("Scanboard v{} → {}", env!("CARGO_PKG_VERSION"), config.server.base_url);

    match &cli.command {
        None => cli::dashboard::run(&config, cli::TargetArgs::default().to_request(&config.target))?,
        Some(Commands::Dashboard(target)) => {
            cli::dashboard::run(&config, target.to_request(&config.target))?
        }
        Some(Commands::Scan(args)) => run_scan(&config, args)?,
        Some(Commands::Export(args)) => run_export(&config, args)?,
        Some(Commands::History) => {
            let api = HttpScanApi::new(&config.server);
            terminal::render_history(&api.history()?);
        }
        Some(Commands::Mitigations(args)) => run_mitigations(&config, args)?,
        Some(Commands::Status) => {
            let api = HttpScanApi::new(&config.server);
            println!("{}: {}", api.base_url(), api.status()?);
        }
        Some(Commands::Init) => {
            config::init_config()?;
        }
    }

    Ok(())
}

/// .scanboard.toml (unless disabled), then command-line overrides
fn load_config(cli: &Cli) -> Result<ScanboardConfig> {
    let mut config = if cli.no_config {
        ScanboardConfig::default()
    } else {
        ScanboardConfig::load(&std::env::current_dir()?).unwrap_or_default()
    };
    if let Some(ref server) = cli.server {
        config.server.base_url = server.clone();
    }
    Ok(config)
}

fn run_scan(config: &ScanboardConfig, args: &ScanArgs) -> Result<()> {
    let api = HttpScanApi::new(&config.server);
    let controller = ScanController::new(&api, args.target.to_request(&config.target));
    let mut state = UiState::default();
    let mut log = ActivityLog::new();

    let mut json = JsonPort::new();
    let mut term = TerminalPort::stdout();
    let port: &mut dyn RenderPort = match args.format {
        OutputFormat::Json => &mut json,
        OutputFormat::Terminal => &mut term,
    };

    let done = controller.start_scan(&mut state, port, &mut log)?;
    info!("Scan stored as #{}", done.index);

    if args.format == OutputFormat::Json {
        println!("{}", json.to_json()?);
    }

    if let Some(ref path) = args.out {
        // Paint a JSON capture when the screen got the terminal view
        let output = if args.format == OutputFormat::Json {
            json.to_json()?
        } else {
            let mut capture = JsonPort::new();
            report::ResultRenderer::paint(&done.result, &mut capture);
            capture.to_json()?
        };
        std::fs::write(path, &output)?;
        info!("JSON results written to {}", path.display());
    }

    if args.export {
        let out_dir = args.out_dir.clone().unwrap_or_else(|| config.export.out_dir.clone());
        let sink = DirectorySink::new(out_dir);
        if let Some(path) = ExportController::new(&api).export_pdf(&state, &sink, &mut log)? {
            info!("PDF report written to {}", path.display());
        }
    }

    // Exit code based on risk score
    if let Some(threshold) = args.fail_above {
        if round_score(done.result.risk_score) > threshold {
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Explicit index, or the most recent history entry
fn pick_index(api: &dyn ScanApi, args: &IndexArgs) -> Result<Option<usize>> {
    if let Some(index) = args.index {
        return Ok(Some(index));
    }
    Ok(api.history()?.len().checked_sub(1))
}

fn run_export(config: &ScanboardConfig, args: &ExportArgs) -> Result<()> {
    let api = HttpScanApi::new(&config.server);
    let mut log = ActivityLog::new();

    let state = UiState {
        scanning: false,
        last_scan_index: pick_index(&api, &args.index)?,
    };
    let out_dir: PathBuf = args.out_dir.clone().unwrap_or_else(|| config.export.out_dir.clone());

    match ExportController::new(&api).export_pdf(&state, &DirectorySink::new(out_dir), &mut log)? {
        Some(path) => println!("{}", path.display()),
        None => info!("No completed scan to export"),
    }
    Ok(())
}

fn run_mitigations(config: &ScanboardConfig, args: &IndexArgs) -> Result<()> {
    let api = HttpScanApi::new(&config.server);
    let Some(index) = pick_index(&api, args)? else {
        info!("No scans recorded yet");
        return Ok(());
    };
    let report = api.mitigations(index)?;
    terminal::render_mitigations(index, &report);
    Ok(())
}
