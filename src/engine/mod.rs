pub mod export;

use thiserror::Error;
use tracing::{info, warn};

use crate::activity::ActivityLog;
use crate::api::{ApiError, ScanApi, ScanRequest};
use crate::report::model::{HistoryEntry, ScanResult};
use crate::report::{RenderPort, ResultRenderer};

pub use export::{DirectorySink, ExportController};

/// Where the dashboard is in the scan lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    ReadyToExport,
}

/// Dashboard state, owned by the caller and handed to the controllers.
///
/// `last_scan_index` is only ever set after a scan fully succeeded, which
/// is what gates export.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UiState {
    pub scanning: bool,
    pub last_scan_index: Option<usize>,
}

impl UiState {
    pub fn phase(&self) -> Phase {
        match (self.scanning, self.last_scan_index) {
            (true, _) => Phase::Scanning,
            (false, Some(_)) => Phase::ReadyToExport,
            (false, None) => Phase::Idle,
        }
    }

    pub fn can_start(&self) -> bool {
        !self.scanning
    }

    pub fn can_export(&self) -> bool {
        !self.scanning && self.last_scan_index.is_some()
    }
}

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("a scan is already in progress")]
    InProgress,

    #[error("scan result missing from history")]
    Unresolved,

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// A successful scan together with the history index it resolved to
#[derive(Debug, Clone)]
pub struct CompletedScan {
    pub index: usize,
    pub result: ScanResult,
}

/// Drives one scan: submit, resolve the history index, render.
pub struct ScanController<'a, A: ScanApi + ?Sized> {
    api: &'a A,
    request: ScanRequest,
}

impl<'a, A: ScanApi + ?Sized> ScanController<'a, A> {
    pub fn new(api: &'a A, request: ScanRequest) -> Self {
        Self { api, request }
    }

    /// Run a scan and render its result.
    ///
    /// Export eligibility is cleared for the duration and only restored on
    /// success. `state.scanning` is cleared on every path.
    pub fn start_scan(
        &self,
        state: &mut UiState,
        port: &mut dyn RenderPort,
        log: &mut ActivityLog,
    ) -> Result<CompletedScan, ScanError> {
        if !state.can_start() {
            return Err(ScanError::InProgress);
        }

        state.scanning = true;
        state.last_scan_index = None;
        log.log(format!(
            "Initiating vulnerability scan on {}...",
            self.request.describe()
        ));

        let outcome = self.submit_and_resolve();
        state.scanning = false;

        match outcome {
            Ok((result, index)) => {
                state.last_scan_index = Some(index);
                info!("Scan #{} complete, risk score {}", index, result.risk_score);
                log.log("Scan complete. Processing results...");
                ResultRenderer::render(&result, port, log);
                Ok(CompletedScan { index, result })
            }
            Err(e) => {
                warn!("Scan failed: {}", e);
                log.log(format!("Error: {}", e));
                Err(e)
            }
        }
    }

    fn submit_and_resolve(&self) -> Result<(ScanResult, usize), ScanError> {
        let result = self.api.submit_scan(&self.request)?;

        if let Some(id) = result.scan_id {
            return Ok((result, id));
        }

        let history = self.api.history()?;
        let index = resolve_scan_index(&result, &history).ok_or(ScanError::Unresolved)?;
        Ok((result, index))
    }
}

/// Find a scan's position in the history listing.
///
/// Matches on the backend timestamp when both sides carry one, newest
/// match first; otherwise the last entry is assumed to be the new scan.
pub fn resolve_scan_index(result: &ScanResult, history: &[HistoryEntry]) -> Option<usize> {
    if let Some(ts) = result.timestamp.as_deref() {
        if let Some(pos) = history.iter().rposition(|e| e.timestamp() == Some(ts)) {
            return Some(pos);
        }
    }
    history.len().checked_sub(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{Call, FakeApi};
    use crate::report::tests::{result, vuln, RecordingPort};
    use crate::report::ChartData;

    fn stamped(ts: &str) -> ScanResult {
        let mut r = result(12.0, 8, vec![vuln("High", "Leak")]);
        r.timestamp = Some(ts.to_string());
        r
    }

    #[test]
    fn test_successful_scan_enables_export() {
        let api = FakeApi::new();
        api.queue_scan(Ok(result(73.6, 7, vec![vuln("Critical", "a"), vuln("High", "b")])));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut port = RecordingPort::default();
        let mut log = ActivityLog::new();

        assert_eq!(state.phase(), Phase::Idle);
        let done = controller.start_scan(&mut state, &mut port, &mut log).unwrap();

        assert_eq!(done.index, 0);
        assert_eq!(state.phase(), Phase::ReadyToExport);
        assert!(state.can_export());
        assert_eq!(port.chart, Some(ChartData([1, 1, 0, 0, 7])));
        assert_eq!(api.calls(), vec![Call::Scan(ScanRequest::mock()), Call::History]);

        let messages: Vec<_> = log.entries().iter().rev().map(|e| e.message.clone()).collect();
        assert_eq!(
            messages,
            vec![
                "Initiating vulnerability scan on Mock LLM...",
                "Scan complete. Processing results...",
                "Found 2 vulnerabilities. Risk Score: 73.6",
            ]
        );
    }

    #[test]
    fn test_failed_scan_returns_to_idle() {
        let api = FakeApi::new();
        api.queue_scan(Err(ApiError::Network("Connection refused".into())));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut port = RecordingPort::default();
        let mut log = ActivityLog::new();

        let err = controller.start_scan(&mut state, &mut port, &mut log).unwrap_err();

        assert!(matches!(err, ScanError::Api(ApiError::Network(_))));
        assert_eq!(state.phase(), Phase::Idle);
        assert!(state.can_start());
        assert!(!state.can_export());
        assert_eq!(port.calls, 0);
        assert_eq!(log.entries()[0].message, "Error: Connection refused");
    }

    #[test]
    fn test_failure_after_success_clears_export() {
        let api = FakeApi::new();
        api.queue_scan(Ok(result(5.0, 9, Vec::new())));
        api.queue_scan(Err(ApiError::Server { status: 500, message: "boom".into() }));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut log = ActivityLog::new();

        controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut log)
            .unwrap();
        assert_eq!(state.phase(), Phase::ReadyToExport);

        assert!(controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut log)
            .is_err());
        assert_eq!(state.last_scan_index, None);
        assert_eq!(state.phase(), Phase::Idle);
        assert_eq!(log.entries()[0].message, "Error: server returned 500: boom");
    }

    #[test]
    fn test_history_failure_is_a_scan_failure() {
        let api = FakeApi::new();
        api.queue_scan(Ok(result(5.0, 9, Vec::new())));
        *api.history_error.borrow_mut() = Some(ApiError::Decode("expected array".into()));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut port = RecordingPort::default();

        let err = controller
            .start_scan(&mut state, &mut port, &mut ActivityLog::new())
            .unwrap_err();
        assert!(matches!(err, ScanError::Api(ApiError::Decode(_))));
        assert_eq!(state, UiState::default());
        assert!(port.stats.is_none());
    }

    #[test]
    fn test_second_scan_moves_export_target() {
        let api = FakeApi::new();
        api.queue_scan(Ok(result(5.0, 9, Vec::new())));
        api.queue_scan(Ok(result(30.0, 6, vec![vuln("Medium", "m")])));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut log = ActivityLog::new();

        controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut log)
            .unwrap();
        assert_eq!(state.last_scan_index, Some(0));
        controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut log)
            .unwrap();
        assert_eq!(state.last_scan_index, Some(1));
    }

    #[test]
    fn test_scan_id_skips_history_lookup() {
        let api = FakeApi::new();
        let mut r = result(5.0, 9, Vec::new());
        r.scan_id = Some(17);
        api.queue_scan(Ok(r));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();

        let done = controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut ActivityLog::new())
            .unwrap();
        assert_eq!(done.index, 17);
        assert_eq!(state.last_scan_index, Some(17));
        assert!(!api.calls().contains(&Call::History));
    }

    #[test]
    fn test_scan_while_scanning_is_rejected() {
        let api = FakeApi::new();
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState {
            scanning: true,
            last_scan_index: Some(2),
        };

        let err = controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut ActivityLog::new())
            .unwrap_err();
        assert!(matches!(err, ScanError::InProgress));
        assert!(api.calls().is_empty());
        assert_eq!(state.last_scan_index, Some(2));
    }

    #[test]
    fn test_resolve_prefers_matching_timestamp() {
        let history: Vec<HistoryEntry> = ["t0", "t1", "t2"]
            .iter()
            .map(|ts| HistoryEntry(serde_json::json!({ "timestamp": ts })))
            .collect();

        // Another client scanned after us: t2 is not ours.
        assert_eq!(resolve_scan_index(&stamped("t1"), &history), Some(1));
        assert_eq!(resolve_scan_index(&stamped("t9"), &history), Some(2));
        assert_eq!(resolve_scan_index(&result(0.0, 0, Vec::new()), &history), Some(2));
        assert_eq!(resolve_scan_index(&stamped("t1"), &[]), None);
    }

    #[test]
    fn test_empty_history_is_unresolved() {
        // A history that lost our scan (e.g. backend restarted between calls)
        struct Forgetful(FakeApi);
        impl ScanApi for Forgetful {
            fn submit_scan(&self, r: &ScanRequest) -> Result<ScanResult, ApiError> {
                self.0.submit_scan(r)
            }
            fn history(&self) -> Result<Vec<HistoryEntry>, ApiError> {
                Ok(Vec::new())
            }
            fn export_pdf(&self, i: usize) -> Result<Vec<u8>, ApiError> {
                self.0.export_pdf(i)
            }
            fn mitigations(
                &self,
                i: usize,
            ) -> Result<crate::report::model::MitigationReport, ApiError> {
                self.0.mitigations(i)
            }
            fn status(&self) -> Result<String, ApiError> {
                self.0.status()
            }
        }

        let api = Forgetful(FakeApi::new());
        api.0.queue_scan(Ok(result(5.0, 9, Vec::new())));
        let controller = ScanController::new(&api, ScanRequest::mock());
        let mut state = UiState::default();
        let mut log = ActivityLog::new();

        let err = controller
            .start_scan(&mut state, &mut RecordingPort::default(), &mut log)
            .unwrap_err();
        assert!(matches!(err, ScanError::Unresolved));
        assert!(!state.can_export());
        assert_eq!(log.entries()[0].message, "Error: scan result missing from history");
    }
}
