use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const CONFIG_FILE_NAME: &str = ".scanboard.toml";

/// Scanboard configuration (loaded from .scanboard.toml)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScanboardConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub target: TargetConfig,

    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Backend base URL, without the `/api/v1` suffix
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout, seconds. Scans on real targets are slow.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Extra attempts for idempotent requests
    #[serde(default = "default_retries")]
    pub retries: u32,

    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            retries: default_retries(),
            retry_backoff_ms: default_retry_backoff_ms(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetConfig {
    /// "mock" or "api"
    #[serde(default = "default_target_type")]
    pub target_type: String,

    #[serde(default)]
    pub target_url: Option<String>,

    #[serde(default)]
    pub model_name: Option<String>,
}

impl Default for TargetConfig {
    fn default() -> Self {
        Self {
            target_type: default_target_type(),
            target_url: None,
            model_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Where downloaded PDF reports are saved
    #[serde(default = "default_out_dir")]
    pub out_dir: PathBuf,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            out_dir: default_out_dir(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retries() -> u32 {
    2
}

fn default_retry_backoff_ms() -> u64 {
    500
}

fn default_target_type() -> String {
    "mock".to_string()
}

fn default_out_dir() -> PathBuf {
    PathBuf::from(".")
}

impl ScanboardConfig {
    /// Try to load .scanboard.toml from the given directory or its parents
    pub fn load(start: &Path) -> Option<Self> {
        let config_path = find_config_file(start)?;
        debug!("Found config: {}", config_path.display());

        match std::fs::read_to_string(&config_path) {
            Ok(content) => match Self::from_toml(&content) {
                Ok(config) => {
                    info!("Loaded config from {}", config_path.display());
                    Some(config)
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}", config_path.display(), e);
                    None
                }
            },
            Err(e) => {
                debug!("Could not read {}: {}", config_path.display(), e);
                None
            }
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Walk up from `start` to find .scanboard.toml
fn find_config_file(start: &Path) -> Option<PathBuf> {
    let mut current = start.to_path_buf();
    loop {
        let config = current.join(CONFIG_FILE_NAME);
        if config.exists() {
            return Some(config);
        }
        if !current.pop() {
            return None;
        }
    }
}

const DEFAULT_CONFIG: &str = r#"# Scanboard configuration

[server]
# Scanner backend
base_url = "http://localhost:8000"

# Per-request timeout in seconds
# timeout_secs = 60

# Extra attempts for read-only requests (history, export, mitigations)
# retries = 2
# retry_backoff_ms = 500

[target]
# "mock" scans the built-in mock LLM, "api" scans a real endpoint
target_type = "mock"
# target_url = "https://api.openai.com/v1/chat/completions"
# model_name = "gpt-3.5-turbo"

[export]
# Directory for downloaded PDF reports
out_dir = "."
"#;

/// Create a default .scanboard.toml in the current directory
pub fn init_config() -> Result<()> {
    let config_path = std::env::current_dir()?.join(CONFIG_FILE_NAME);

    if config_path.exists() {
        println!("⚠️  {} already exists in this directory", CONFIG_FILE_NAME);
        return Ok(());
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;
    println!("✅ Created {}", CONFIG_FILE_NAME);
    println!("   Edit it to point scanboard at your backend.");

    Ok(())
}
