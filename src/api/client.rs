use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::debug;
use ureq::http::Response;
use ureq::{Agent, Body};

use super::{ApiError, RetryPolicy, ScanApi, ScanRequest};
use crate::config::ServerConfig;
use crate::report::model::{HistoryEntry, MitigationReport, ScanResult};

/// Upper bound for a downloaded report
const MAX_PDF_BYTES: u64 = 64 * 1024 * 1024;

/// Upper bound for JSON bodies. The history listing carries every past
/// scan in full and the backend never trims it.
const MAX_JSON_BYTES: u64 = 512 * 1024 * 1024;

/// Blocking HTTP client for the scanner backend
pub struct HttpScanApi {
    agent: Agent,
    base_url: String,
    retry: RetryPolicy,
    pdf_limit: u64,
}

impl HttpScanApi {
    pub fn new(server: &ServerConfig) -> Self {
        let config = Agent::config_builder()
            .timeout_global(Some(Duration::from_secs(server.timeout_secs)))
            .http_status_as_error(false)
            .build();

        Self {
            agent: Agent::new_with_config(config),
            base_url: server.base_url.trim_end_matches('/').to_string(),
            retry: RetryPolicy::new(server.retries, Duration::from_millis(server.retry_backoff_ms)),
            pdf_limit: MAX_PDF_BYTES,
        }
    }

    #[cfg(test)]
    fn with_pdf_limit(mut self, limit: u64) -> Self {
        self.pdf_limit = limit;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str) -> Result<Response<Body>, ApiError> {
        let url = self.url(path);
        debug!("GET {}", url);
        let response = self.agent.get(&url).call().map_err(transport_error)?;
        check_status(response)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.retry.run(path, || {
            let mut response = self.get(path)?;
            read_json(&mut response)
        })
    }
}

impl ScanApi for HttpScanApi {
    fn submit_scan(&self, request: &ScanRequest) -> Result<ScanResult, ApiError> {
        // Not idempotent: every accepted POST adds a history entry.
        let url = self.url("/api/v1/scan");
        debug!("POST {} target_type={}", url, request.target_type);
        let response = self
            .agent
            .post(&url)
            .send_json(request)
            .map_err(transport_error)?;
        let mut response = check_status(response)?;
        read_json(&mut response)
    }

    fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
        self.get_json("/api/v1/history")
    }

    fn export_pdf(&self, index: usize) -> Result<Vec<u8>, ApiError> {
        let path = format!("/api/v1/export/pdf/{}", index);
        self.retry.run(&path, || {
            let mut response = self.get(&path)?;
            response
                .body_mut()
                .with_config()
                .limit(self.pdf_limit)
                .read_to_vec()
                .map_err(body_error)
        })
    }

    fn mitigations(&self, index: usize) -> Result<MitigationReport, ApiError> {
        self.get_json(&format!("/api/v1/mitigations/{}", index))
    }

    fn status(&self) -> Result<String, ApiError> {
        let body: serde_json::Value = self.get_json("/")?;
        Ok(body
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| body.to_string()))
    }
}

fn transport_error(e: ureq::Error) -> ApiError {
    ApiError::Network(e.to_string())
}

/// An oversized body will not shrink on retry, so it is not a network error
fn body_error(e: ureq::Error) -> ApiError {
    match e {
        ureq::Error::BodyExceedsLimit(_) => ApiError::Decode(e.to_string()),
        other => transport_error(other),
    }
}

fn read_json<T: DeserializeOwned>(response: &mut Response<Body>) -> Result<T, ApiError> {
    response
        .body_mut()
        .with_config()
        .limit(MAX_JSON_BYTES)
        .read_json::<T>()
        .map_err(|e| ApiError::Decode(e.to_string()))
}

fn check_status(mut response: Response<Body>) -> Result<Response<Body>, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.body_mut().read_to_string().unwrap_or_default();
    let message = error_detail(&body).unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    });
    Err(ApiError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Pull the message out of a FastAPI error body (`{"detail": ...}`)
fn error_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
