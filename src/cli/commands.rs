use clap::{Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::api::ScanRequest;
use crate::config::TargetConfig;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Open the interactive dashboard (default)
    Dashboard(TargetArgs),

    /// Run one scan and print the results
    Scan(ScanArgs),

    /// Download the PDF report of a scan
    Export(ExportArgs),

    /// List scans recorded by the backend
    History,

    /// Show mitigation recommendations for a scan
    Mitigations(IndexArgs),

    /// Check that the backend is reachable
    Status,

    /// Initialize a .scanboard.toml config file in the current directory
    Init,
}

/// What to scan. Unset values fall back to the [target] config section.
#[derive(clap::Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Target type: "mock" or "api"
    #[arg(long)]
    pub target_type: Option<String>,

    /// Chat completion endpoint of the target LLM (api targets)
    #[arg(long)]
    pub target_url: Option<String>,

    /// API key for the target LLM (api targets)
    #[arg(long)]
    pub api_key: Option<String>,

    /// Model name sent to the target LLM
    #[arg(long)]
    pub model_name: Option<String>,
}

impl TargetArgs {
    pub fn to_request(&self, config: &TargetConfig) -> ScanRequest {
        ScanRequest {
            target_type: self
                .target_type
                .clone()
                .unwrap_or_else(|| config.target_type.clone()),
            target_url: self.target_url.clone().or_else(|| config.target_url.clone()),
            api_key: self.api_key.clone(),
            model_name: self.model_name.clone().or_else(|| config.model_name.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Terminal,
    Json,
}

#[derive(clap::Args, Debug)]
pub struct ScanArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Terminal)]
    pub format: OutputFormat,

    /// Also write the rendered results as JSON to this file
    #[arg(short, long)]
    pub out: Option<PathBuf>,

    /// Download the PDF report once the scan completes
    #[arg(long)]
    pub export: bool,

    /// Directory for the PDF report (overrides [export] out_dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,

    /// Fail (exit code 1) if the rounded risk score is above this value
    #[arg(long)]
    pub fail_above: Option<i64>,
}

#[derive(clap::Args, Debug, Clone, Copy)]
pub struct IndexArgs {
    /// History index of the scan (default: the most recent one)
    #[arg(long)]
    pub index: Option<usize>,
}

#[derive(clap::Args, Debug)]
pub struct ExportArgs {
    #[command(flatten)]
    pub index: IndexArgs,

    /// Directory for the PDF report (overrides [export] out_dir)
    #[arg(long)]
    pub out_dir: Option<PathBuf>,
}
