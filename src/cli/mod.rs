pub mod commands;
pub mod dashboard;

use clap::Parser;

pub use commands::{Commands, ExportArgs, IndexArgs, OutputFormat, ScanArgs, TargetArgs};

/// Scanboard: terminal dashboard for the LLM vulnerability scanner
///
/// Runs OWASP Top 10 scans against an LLM through the scanner backend,
/// shows the findings and downloads PDF reports.
#[derive(Parser, Debug)]
#[command(
    name = "scanboard",
    version,
    about = "🛡 Scanboard — dashboard for the LLM vulnerability scanner",
    long_about = "Scanboard talks to a running LLM vulnerability scanner backend.\nStart scans, review vulnerabilities, read mitigations and download PDF reports.\n\nRun without a command to open the interactive dashboard."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output (debug level)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Backend base URL (overrides .scanboard.toml)
    #[arg(long, global = true)]
    pub server: Option<String>,

    /// Ignore .scanboard.toml files
    #[arg(long, global = true)]
    pub no_config: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_command_opens_dashboard() {
        let cli = Cli::try_parse_from(["scanboard", "-v"]).unwrap();
        assert!(cli.command.is_none());
        assert!(cli.verbose);
    }

    #[test]
    fn test_scan_flags() {
        let cli = Cli::try_parse_from([
            "scanboard",
            "scan",
            "--target-type",
            "api",
            "--target-url",
            "https://llm.example/v1/chat",
            "--format",
            "json",
            "--export",
            "--server",
            "http://scanner:8000",
        ])
        .unwrap();

        assert_eq!(cli.server.as_deref(), Some("http://scanner:8000"));
        match cli.command {
            Some(Commands::Scan(args)) => {
                assert_eq!(args.target.target_type.as_deref(), Some("api"));
                assert_eq!(args.format, OutputFormat::Json);
                assert!(args.export);
                assert_eq!(args.fail_above, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_export_index() {
        let cli = Cli::try_parse_from(["scanboard", "export", "--index", "2"]).unwrap();
        match cli.command {
            Some(Commands::Export(args)) => {
                assert_eq!(args.index.index, Some(2));
                assert_eq!(args.out_dir, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        assert!(Cli::try_parse_from(["scanboard", "scan", "--format", "xml"]).is_err());
    }
}
