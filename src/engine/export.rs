use std::io;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use thiserror::Error;
use tracing::{info, warn};

use crate::activity::ActivityLog;
use crate::api::{ApiError, ScanApi};
use crate::engine::UiState;

#[derive(Debug, Error)]
pub enum ExportError {
    /// The backend refused to produce the report
    #[error("Failed to generate PDF")]
    Generation { status: u16, detail: String },

    #[error(transparent)]
    Api(ApiError),

    #[error("could not save {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl From<ApiError> for ExportError {
    fn from(e: ApiError) -> Self {
        match e {
            ApiError::Server { status, message } => ExportError::Generation {
                status,
                detail: message,
            },
            other => ExportError::Api(other),
        }
    }
}

/// Where a downloaded report ends up
pub trait DownloadSink {
    /// Where `file_name` would be written
    fn target(&self, file_name: &str) -> PathBuf;

    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf>;
}

/// Saves downloads into a directory, creating it if needed
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl DownloadSink for DirectorySink {
    fn target(&self, file_name: &str) -> PathBuf {
        self.dir.join(file_name)
    }

    fn save(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)?;
        let path = self.target(file_name);
        std::fs::write(&path, bytes)?;
        Ok(path)
    }
}

/// `scan_report_<YYYY-MM-DD>.pdf`, dated on download, not on the scan
pub fn report_file_name(date: NaiveDate) -> String {
    format!("scan_report_{}.pdf", date.format("%Y-%m-%d"))
}

/// Downloads the PDF report of the last completed scan
pub struct ExportController<'a, A: ScanApi + ?Sized> {
    api: &'a A,
}

impl<'a, A: ScanApi + ?Sized> ExportController<'a, A> {
    pub fn new(api: &'a A) -> Self {
        Self { api }
    }

    /// Returns the saved path, or `None` when no scan has completed yet
    /// (nothing is requested in that case). Never touches `state`.
    pub fn export_pdf(
        &self,
        state: &UiState,
        sink: &dyn DownloadSink,
        log: &mut ActivityLog,
    ) -> Result<Option<PathBuf>, ExportError> {
        let Some(index) = state.last_scan_index else {
            return Ok(None);
        };
        self.export_index(index, sink, log).map(Some)
    }

    /// Download the report for an explicit history index
    pub fn export_index(
        &self,
        index: usize,
        sink: &dyn DownloadSink,
        log: &mut ActivityLog,
    ) -> Result<PathBuf, ExportError> {
        log.log("Generating PDF report...");

        match self.download(index, sink) {
            Ok(path) => {
                info!("Saved report for scan #{} to {}", index, path.display());
                log.log("PDF report downloaded successfully.");
                Ok(path)
            }
            Err(e) => {
                if let ExportError::Generation { status, detail } = &e {
                    warn!("PDF export for scan #{} returned {}: {}", index, status, detail);
                }
                log.log(format!("Error downloading PDF: {}", e));
                Err(e)
            }
        }
    }

    fn download(&self, index: usize, sink: &dyn DownloadSink) -> Result<PathBuf, ExportError> {
        let bytes = self.api.export_pdf(index)?;
        let file_name = report_file_name(Utc::now().date_naive());
        sink.save(&file_name, &bytes).map_err(|source| ExportError::Io {
            path: sink.target(&file_name),
            source,
        })
    }
}
