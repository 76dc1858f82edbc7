use anyhow::Result;
use serde::Serialize;

use crate::report::{ChartData, RenderPort, Stats, TableRow, CHART_LABELS};

/// The rendered dashboard, as captured by [`JsonPort`]
#[derive(Debug, Default, Serialize)]
pub struct DashboardView {
    pub stats: Option<Stats>,
    pub vulnerabilities: Vec<TableRow>,
    pub chart: Option<ChartView>,
}

#[derive(Debug, Serialize)]
pub struct ChartView {
    pub labels: [&'static str; 5],
    pub data: ChartData,
}

/// Captures the rendered view so it can be serialized instead of drawn
#[derive(Debug, Default)]
pub struct JsonPort {
    view: DashboardView,
}

impl JsonPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Render the captured view as pretty-printed JSON
    pub fn to_json(&self) -> Result<String> {
        let json = serde_json::to_string_pretty(&self.view)?;
        Ok(json)
    }
}

impl RenderPort for JsonPort {
    fn render_stats(&mut self, stats: &Stats) {
        self.view.stats = Some(stats.clone());
    }

    fn render_table(&mut self, rows: &[TableRow]) {
        self.view.vulnerabilities = rows.to_vec();
    }

    fn render_chart(&mut self, chart: &ChartData) {
        self.view.chart = Some(ChartView {
            labels: CHART_LABELS,
            data: *chart,
        });
    }
}
