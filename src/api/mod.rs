pub mod client;
pub mod retry;

use serde::Serialize;
use thiserror::Error;

use crate::report::model::{HistoryEntry, MitigationReport, ScanResult};

pub use client::HttpScanApi;
pub use retry::RetryPolicy;

/// Errors talking to the scanning backend
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, timeout, DNS...
    #[error("{0}")]
    Network(String),

    /// The backend answered with a non-success status
    #[error("server returned {status}: {message}")]
    Server { status: u16, message: String },

    /// The body did not have the expected shape
    #[error("invalid response from server: {0}")]
    Decode(String),
}

impl ApiError {
    /// Worth retrying: network failures and 5xx answers
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Network(_) => true,
            ApiError::Server { status, .. } => *status >= 500,
            ApiError::Decode(_) => false,
        }
    }
}

/// Body of `POST /api/v1/scan`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRequest {
    /// "mock" or "api"
    pub target_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_name: Option<String>,
}

impl ScanRequest {
    #[cfg(test)]
    pub fn mock() -> Self {
        Self {
            target_type: "mock".to_string(),
            target_url: None,
            api_key: None,
            model_name: None,
        }
    }

    /// Human-readable target name for status lines
    pub fn describe(&self) -> String {
        match (self.target_type.as_str(), &self.target_url) {
            ("mock", _) => "Mock LLM".to_string(),
            (_, Some(url)) => match &self.model_name {
                Some(model) => format!("{} ({})", url, model),
                None => url.clone(),
            },
            (other, None) => other.to_string(),
        }
    }
}

/// The backend endpoints the dashboard consumes
pub trait ScanApi {
    /// `POST /api/v1/scan`
    fn submit_scan(&self, request: &ScanRequest) -> Result<ScanResult, ApiError>;

    /// `GET /api/v1/history`
    fn history(&self) -> Result<Vec<HistoryEntry>, ApiError>;

    /// `GET /api/v1/export/pdf/{index}`
    fn export_pdf(&self, index: usize) -> Result<Vec<u8>, ApiError>;

    /// `GET /api/v1/mitigations/{index}`
    fn mitigations(&self, index: usize) -> Result<MitigationReport, ApiError>;

    /// `GET /`, the backend's banner message
    fn status(&self) -> Result<String, ApiError>;
}
