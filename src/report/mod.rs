pub mod json;
pub mod model;
pub mod terminal;

use serde::Serialize;

use crate::activity::ActivityLog;
use model::{ScanResult, Severity};

/// Labels for the chart buckets, in bucket order
pub const CHART_LABELS: [&str; 5] = ["Critical", "High", "Medium", "Low", "Safe"];

/// Headline counters shown above the table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    /// Risk score rounded to the nearest integer
    pub risk_score: i64,
    pub failed_tests: u32,
    pub passed_tests: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub severity: Severity,
    pub module: String,
    pub name: String,
    pub evidence: String,
}

/// `[critical, high, medium, low, passed_tests]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ChartData(pub [u32; 5]);

impl ChartData {
    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    pub fn labelled(&self) -> impl Iterator<Item = (&'static str, u32)> + '_ {
        CHART_LABELS.iter().copied().zip(self.0.iter().copied())
    }
}

/// Sink for rendered scan results.
///
/// Every call replaces whatever the port showed before; ports never diff.
pub trait RenderPort {
    fn render_stats(&mut self, stats: &Stats);
    fn render_table(&mut self, rows: &[TableRow]);
    fn render_chart(&mut self, chart: &ChartData);
}

/// Rounds half up, so 73.5 shows as 74 and -0.5 as 0.
pub fn round_score(score: f64) -> i64 {
    (score + 0.5).floor() as i64
}

pub fn stats_for(result: &ScanResult) -> Stats {
    Stats {
        risk_score: round_score(result.risk_score),
        failed_tests: result.failed_tests,
        passed_tests: result.passed_tests,
    }
}

pub fn rows_for(result: &ScanResult) -> Vec<TableRow> {
    result
        .vulnerabilities
        .iter()
        .map(|v| TableRow {
            severity: v.severity.clone(),
            module: v.module.clone(),
            name: v.name.clone(),
            evidence: v.evidence.clone(),
        })
        .collect()
}

pub fn chart_for(result: &ScanResult) -> ChartData {
    let mut data = [0u32; 5];
    for bucket in result.vulnerabilities.iter().filter_map(|v| v.severity.bucket()) {
        data[bucket] += 1;
    }
    data[4] = result.passed_tests;
    ChartData(data)
}

/// Turns a scan result into stats, table rows and chart data and pushes
/// them through a render port.
pub struct ResultRenderer;

impl ResultRenderer {
    pub fn render(result: &ScanResult, port: &mut dyn RenderPort, log: &mut ActivityLog) {
        Self::paint(result, port);
        log.log(format!(
            "Found {} vulnerabilities. Risk Score: {}",
            result.failed_tests, result.risk_score
        ));
    }

    /// Draw the three views without touching the activity log
    pub fn paint(result: &ScanResult, port: &mut dyn RenderPort) {
        port.render_stats(&stats_for(result));
        port.render_table(&rows_for(result));
        port.render_chart(&chart_for(result));
    }
}
