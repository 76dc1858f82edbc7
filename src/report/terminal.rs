use std::io::{self, Write};

use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};
use owo_colors::OwoColorize;

use crate::report::model::{HistoryEntry, MitigationReport, Severity};
use crate::report::{ChartData, RenderPort, Stats, TableRow};

const BAR_WIDTH: usize = 40;
const EVIDENCE_MAX_CHARS: usize = 120;

/// Chart colors, one per bucket
const CHART_COLORS: [(u8, u8, u8); 5] = [
    (239, 68, 68),
    (249, 115, 22),
    (245, 158, 11),
    (59, 130, 246),
    (16, 185, 129),
];

/// Renders scan results to a terminal (or any writer) with colors
pub struct TerminalPort<W: Write> {
    out: W,
}

impl TerminalPort<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalPort<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> RenderPort for TerminalPort<W> {
    fn render_stats(&mut self, stats: &Stats) {
        let score = stats.risk_score.to_string();
        let score = match stats.risk_score {
            s if s >= 70 => score.red().bold().to_string(),
            s if s >= 40 => score.yellow().bold().to_string(),
            _ => score.green().bold().to_string(),
        };
        writeln!(self.out).ok();
        writeln!(
            self.out,
            "  Risk Score {}   Vulnerabilities {}   Passed {}",
            score,
            stats.failed_tests.to_string().bold(),
            stats.passed_tests.to_string().bold(),
        )
        .ok();
        writeln!(self.out).ok();
    }

    fn render_table(&mut self, rows: &[TableRow]) {
        if rows.is_empty() {
            writeln!(self.out, "  {}  No vulnerabilities found!", "✅".bold()).ok();
            writeln!(self.out).ok();
            return;
        }

        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec!["Severity", "Module", "Vulnerability", "Evidence"]);

        for row in rows {
            table.add_row(vec![
                severity_cell(&row.severity),
                Cell::new(&row.module),
                Cell::new(&row.name).add_attribute(Attribute::Bold),
                Cell::new(truncate(row.evidence.trim(), EVIDENCE_MAX_CHARS)).fg(Color::Grey),
            ]);
        }

        writeln!(self.out, "{table}").ok();
        writeln!(self.out).ok();
    }

    fn render_chart(&mut self, chart: &ChartData) {
        let total = chart.total();
        for (i, (label, count)) in chart.labelled().enumerate() {
            let filled = if total == 0 {
                0
            } else {
                (count as usize * BAR_WIDTH + total as usize / 2) / total as usize
            };
            let (r, g, b) = CHART_COLORS[i];
            writeln!(
                self.out,
                "  {:<9} {}{} {}",
                label,
                "█".repeat(filled).truecolor(r, g, b),
                "░".repeat(BAR_WIDTH - filled).dimmed(),
                count,
            )
            .ok();
        }
        writeln!(self.out).ok();
    }
}

fn severity_cell(severity: &Severity) -> Cell {
    let badge = format!(" {} ", severity.as_str().to_uppercase());
    let cell = Cell::new(badge).add_attribute(Attribute::Bold);
    match severity {
        Severity::Critical => cell.fg(Color::White).bg(Color::Red),
        Severity::High => cell.fg(Color::Black).bg(Color::Yellow),
        Severity::Medium => cell.fg(Color::White).bg(Color::Blue),
        Severity::Low => cell.fg(Color::Black).bg(Color::White),
        Severity::Other(_) => cell.fg(Color::Grey),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let line = text.lines().next().unwrap_or_default();
    if line.chars().count() > max_chars || text.lines().count() > 1 {
        let cut: String = line.chars().take(max_chars - 1).collect();
        format!("{}…", cut)
    } else {
        line.to_string()
    }
}

/// Render the scan history listing
pub fn render_history(history: &[HistoryEntry]) {
    println!();
    if history.is_empty() {
        println!("  No scans recorded on the server yet.");
        println!();
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["#", "Timestamp", "Risk", "Failed", "Passed", "Vulns"]);

    let dash = || "-".to_string();
    for (index, entry) in history.iter().enumerate() {
        table.add_row(vec![
            index.to_string(),
            entry.timestamp().map(str::to_string).unwrap_or_else(dash),
            entry
                .risk_score()
                .map(|s| format!("{:.1}", s))
                .unwrap_or_else(dash),
            entry.failed_tests().map(|n| n.to_string()).unwrap_or_else(dash),
            entry.passed_tests().map(|n| n.to_string()).unwrap_or_else(dash),
            entry
                .vulnerability_count()
                .map(|n| n.to_string())
                .unwrap_or_else(dash),
        ]);
    }

    println!("{table}");
    println!();
}

/// Render the mitigation recommendations for one scan
pub fn render_mitigations(index: usize, report: &MitigationReport) {
    let s = &report.summary;
    println!();
    println!(
        "{}  Mitigations for scan #{}",
        "🛡".bold(),
        index
    );
    println!("{}", "━".repeat(60));
    println!(
        " {} vulnerabilities: {}, {}, {}, {}",
        s.total_vulnerabilities.to_string().bold(),
        format!("{} critical", s.critical).red().bold(),
        format!("{} high", s.high).yellow().bold(),
        format!("{} medium", s.medium).blue(),
        format!("{} low", s.low).white(),
    );
    println!("{}", "━".repeat(60));

    if report.recommendations.is_empty() {
        println!();
        println!("  {}  Nothing to mitigate.", "✅".bold());
        println!();
        return;
    }

    for rec in &report.recommendations {
        println!();
        println!("  {}", rec.category.bold());
        println!("    {} {}", "Strategy:".dimmed(), rec.strategy);
        for control in &rec.controls {
            println!("    {} {}", "⮕".green(), control.green());
        }
        if !rec.affected_vulnerabilities.is_empty() {
            println!(
                "    {} {}",
                "Affects:".dimmed(),
                rec.affected_vulnerabilities.join(", ").dimmed()
            );
        }
    }
    println!();
}
