//! Report file output
//!
//! Writes `<scan_id>.html` and `<scan_id>.json` under the reports directory.
//! Files are created owner-only (0600) and the directory 0755 on unix.
//! The two writes are independent: one failing does not prevent the other.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use npmscan_scanner::ScanReport;

use crate::error::CliError;
use crate::report::html::render_html;

#[cfg(unix)]
const FILE_MODE: u32 = 0o600;
#[cfg(unix)]
const DIR_MODE: u32 = 0o755;

/// Paths of the written reports (or the error for each).
#[derive(Debug)]
pub struct WrittenReports {
    pub html: Result<PathBuf, CliError>,
    pub json: Result<PathBuf, CliError>,
}

impl WrittenReports {
    /// `file://` URL for the HTML report, if it was written.
    pub fn html_url(&self) -> Option<String> {
        self.html
            .as_ref()
            .ok()
            .map(|path| format!("file://{}", path.display()))
    }
}

/// Writes the HTML and JSON reports.
#[derive(Debug, Clone)]
pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write both reports. Never fails as a whole.
    pub async fn write_all(&self, report: &ScanReport) -> WrittenReports {
        let html = self.write_html(report).await;
        if let Err(e) = &html {
            warn!(error = %e, "failed to write HTML report");
        }
        let json = self.write_json(report).await;
        if let Err(e) = &json {
            warn!(error = %e, "failed to write JSON report");
        }
        WrittenReports { html, json }
    }

    /// Write `<scan_id>.html` and return its absolute path.
    pub async fn write_html(&self, report: &ScanReport) -> Result<PathBuf, CliError> {
        let path = self.dir.join(format!("{}.html", report.scan_id));
        self.write_file(&path, render_html(report).as_bytes()).await
    }

    /// Write `<scan_id>.json` (pretty, 2-space indent) and return its absolute path.
    pub async fn write_json(&self, report: &ScanReport) -> Result<PathBuf, CliError> {
        let json = serde_json::to_vec_pretty(report)?;
        let path = self.dir.join(format!("{}.json", report.scan_id));
        self.write_file(&path, &json).await
    }

    async fn write_file(&self, path: &Path, contents: &[u8]) -> Result<PathBuf, CliError> {
        use tokio::io::AsyncWriteExt;

        self.ensure_dir().await?;

        let mut options = tokio::fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        options.mode(FILE_MODE);

        let mut file = options.open(path).await.map_err(|e| {
            CliError::Report(format!("failed to create {}: {e}", path.display()))
        })?;
        file.write_all(contents)
            .await
            .map_err(|e| CliError::Report(format!("failed to write {}: {e}", path.display())))?;
        file.flush()
            .await
            .map_err(|e| CliError::Report(format!("failed to write {}: {e}", path.display())))?;

        let absolute = tokio::fs::canonicalize(path)
            .await
            .unwrap_or_else(|_| path.to_path_buf());
        info!(path = %absolute.display(), bytes = contents.len(), "report written");
        Ok(absolute)
    }

    async fn ensure_dir(&self) -> Result<(), CliError> {
        let mut builder = tokio::fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        builder.mode(DIR_MODE);

        builder.create(&self.dir).await.map_err(|e| {
            CliError::Report(format!(
                "failed to create reports directory {}: {e}",
                self.dir.display()
            ))
        })
    }
}
