use anyhow::Result;
use inquire::{InquireError, Select};
use owo_colors::OwoColorize;
use tracing::debug;

use crate::activity::ActivityLog;
use crate::api::{HttpScanApi, ScanApi, ScanRequest};
use crate::config::ScanboardConfig;
use crate::engine::{DirectorySink, ExportController, Phase, ScanController, UiState};
use crate::report::terminal::{self, TerminalPort};

/// Lines of the activity panel shown after each action
const PANEL_LINES: usize = 8;

// ── Helpers ──────────────────────────────────────────────────────────

/// Print a horizontal separator.
fn separator() {
    println!("{}", "━".repeat(60));
}

// ── Menu ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    StartScan,
    ExportPdf,
    Mitigations,
    ShowLog,
    Quit,
}

impl Action {
    /// Menu entries for the current state. Export and mitigations only
    /// make sense once a scan has completed.
    pub fn available(state: &UiState) -> Vec<Action> {
        let mut actions = Vec::new();
        if state.can_start() {
            actions.push(Action::StartScan);
        }
        if state.can_export() {
            actions.push(Action::ExportPdf);
            actions.push(Action::Mitigations);
        }
        actions.push(Action::ShowLog);
        actions.push(Action::Quit);
        actions
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::StartScan => "🚀 Start New Scan",
            Action::ExportPdf => "📄 Export PDF Report",
            Action::Mitigations => "🛡  View Mitigations",
            Action::ShowLog => "📜 Show Activity Log",
            Action::Quit => "Quit",
        };
        f.write_str(label)
    }
}

// ── Session ──────────────────────────────────────────────────────────

/// One dashboard session: state and log live as long as the process.
struct Dashboard<'a, A: ScanApi> {
    api: &'a A,
    request: ScanRequest,
    sink: DirectorySink,
    state: UiState,
    log: ActivityLog,
}

impl<'a, A: ScanApi> Dashboard<'a, A> {
    fn start_scan(&mut self) {
        println!();
        println!("  {}", "Scanning...".bold());
        let controller = ScanController::new(self.api, self.request.clone());
        let mut port = TerminalPort::stdout();
        // The activity log already carries the failure line.
        if let Err(e) = controller.start_scan(&mut self.state, &mut port, &mut self.log) {
            debug!("scan ended with error: {}", e);
        }
    }

    fn export_pdf(&mut self) {
        let exporter = ExportController::new(self.api);
        if let Ok(Some(path)) = exporter.export_pdf(&self.state, &self.sink, &mut self.log) {
            println!(
                "  {} Report saved to {}",
                "✅".bold(),
                path.display().to_string().green()
            );
        }
    }

    fn mitigations(&mut self) {
        let Some(index) = self.state.last_scan_index else {
            return;
        };
        match self.api.mitigations(index) {
            Ok(report) => terminal::render_mitigations(index, &report),
            Err(e) => self.log.log(format!("Error loading mitigations: {}", e)),
        }
    }

    fn status_line(&self) -> String {
        match self.state.phase() {
            Phase::Idle => "idle".dimmed().to_string(),
            Phase::Scanning => "scanning".yellow().to_string(),
            Phase::ReadyToExport => match self.state.last_scan_index {
                Some(i) => format!("scan #{} ready to export", i).green().to_string(),
                None => String::new(),
            },
        }
    }
}

// ── Entry point ──────────────────────────────────────────────────────

/// Run the interactive dashboard until the user quits
pub fn run(config: &ScanboardConfig, request: ScanRequest) -> Result<()> {
    let api = HttpScanApi::new(&config.server);

    let mut dashboard = Dashboard {
        api: &api,
        request,
        sink: DirectorySink::new(&config.export.out_dir),
        state: UiState::default(),
        log: ActivityLog::new(),
    };

    screen_welcome(&api, &mut dashboard.log);

    loop {
        println!();
        dashboard.log.print_panel(PANEL_LINES);
        println!();

        let actions = Action::available(&dashboard.state);
        let prompt = format!("[{}] What next?", dashboard.status_line());
        let choice = match Select::new(&prompt, actions).prompt() {
            Ok(choice) => choice,
            Err(InquireError::OperationCanceled) | Err(InquireError::OperationInterrupted) => {
                break;
            }
            Err(e) => return Err(e.into()),
        };

        match choice {
            Action::StartScan => dashboard.start_scan(),
            Action::ExportPdf => dashboard.export_pdf(),
            Action::Mitigations => dashboard.mitigations(),
            Action::ShowLog => {
                println!();
                dashboard.log.print_panel(usize::MAX);
            }
            Action::Quit => break,
        }
    }

    println!();
    println!("  {}", "Bye! 🛡".dimmed());
    println!();
    Ok(())
}

/// Banner plus a reachability check of the backend
fn screen_welcome(api: &HttpScanApi, log: &mut ActivityLog) {
    println!();
    separator();
    println!(
        "  {} {}",
        "🛡".bold(),
        format!("Scanboard v{}", env!("CARGO_PKG_VERSION")).bold()
    );
    println!(
        "  {}",
        "OWASP Top 10 vulnerability dashboard for large language models.".dimmed()
    );
    println!("  Backend: {}", api.base_url().cyan());
    separator();

    match api.status() {
        Ok(message) => log.log(format!("Connected: {}", message)),
        Err(e) => log.log(format!("Error: backend unreachable: {}", e)),
    }
}
