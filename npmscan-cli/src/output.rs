//! Output formatting abstraction for text vs JSON rendering
//!
//! The finalized report flows through [`OutputWriter`], which switches between
//! the colored terminal summary and pretty JSON. Live progress while the scan
//! runs is printed to stderr by [`ConsoleObserver`].

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use colored::Colorize;
use serde::Serialize;

use npmscan_core::pipeline::{ScanObserver, StepKind};
use npmscan_core::types::{ActionOutcome, ProjectScanResult, ScanStatus, Severity, Vulnerability};
use npmscan_scanner::ScanReport;

use crate::cli::OutputFormat;
use crate::error::CliError;

const SEPARATOR_WIDTH: usize = 80;

/// Abstraction for writing CLI output in different formats.
pub struct OutputWriter {
    format: OutputFormat,
}

impl OutputWriter {
    /// Create a new output writer with the specified format.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Selected format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Render a payload to an arbitrary writer.
    pub fn render_to<T: Render + Serialize>(
        &self,
        payload: &T,
        w: &mut dyn Write,
    ) -> Result<(), CliError> {
        match self.format {
            OutputFormat::Text => {
                payload.render_text(w)?;
            }
            OutputFormat::Json => {
                serde_json::to_writer_pretty(&mut *w, payload)?;
                writeln!(w)?;
            }
        }
        Ok(())
    }
}

/// Trait for human-readable text rendering.
pub trait Render {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()>;
}

impl Render for ScanReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        let rule = "=".repeat(SEPARATOR_WIDTH);
        writeln!(w)?;
        writeln!(w, "{rule}")?;
        writeln!(w, "{}", format!("📊 SCAN REPORT - {}", self.scan_id).cyan().bold())?;
        writeln!(w, "{rule}")?;

        writeln!(
            w,
            "{}",
            format!("⏱️  Total Duration: {}", format_duration(self.total_duration)).cyan()
        )?;
        writeln!(
            w,
            "{}",
            format!("📁 Projects Scanned: {}", self.project_count).cyan()
        )?;
        writeln!(
            w,
            "{}",
            format!("✅ Successful: {}", self.success_count).green()
        )?;
        if self.failure_count > 0 {
            writeln!(w, "{}", format!("❌ Failed: {}", self.failure_count).red())?;
        }
        let mode = if self.audit_tool_enabled {
            "enabled".green()
        } else {
            "demo mode".yellow()
        };
        writeln!(w, "🔒 Audit Tool: {mode}")?;

        let counts = self.severity_counts();
        let vulns = format!(
            "🚨 Vulnerabilities: {} total (C:{} H:{} M:{} L:{}), {} fixed",
            counts.total(),
            counts.critical,
            counts.high,
            counts.moderate,
            counts.low,
            self.fixed_vulnerabilities()
        );
        if counts.total() > 0 {
            writeln!(w, "{}", vulns.red().bold())?;
        } else {
            writeln!(w, "{}", vulns.green())?;
        }
        if self.interrupted {
            writeln!(
                w,
                "{}",
                "⚠️  Scan interrupted: remaining projects were skipped".yellow().bold()
            )?;
        }
        writeln!(w)?;

        let total = self.results.len();
        for (i, result) in self.results.iter().enumerate() {
            render_project(w, i + 1, total, result)?;
            writeln!(w)?;
        }

        writeln!(w, "{rule}")?;
        Ok(())
    }
}

fn render_project(
    w: &mut dyn Write,
    index: usize,
    total: usize,
    result: &ProjectScanResult,
) -> std::io::Result<()> {
    writeln!(
        w,
        "📦 [{index}/{total}] {}",
        result.project_path.display().to_string().bold()
    )?;

    let status = match result.status {
        ScanStatus::Success => "✅ success".green(),
        other => format!("❌ {other}").red(),
    };
    writeln!(
        w,
        "    Status: {status} (Duration: {})",
        format_duration(result.duration)
    )?;

    render_step(w, "🗑️  Node Modules", &result.remove_cache, "Removed")?;
    render_step(w, "📦 NPM Install", &result.install, "Success")?;
    render_step(w, "🔍 Security Scan", &result.audit, "Completed")?;

    if !result.vulnerabilities.is_empty() {
        writeln!(
            w,
            "    🚨 Vulnerabilities: {} found",
            result.vulnerabilities.len()
        )?;
        for vuln in &result.vulnerabilities {
            writeln!(w, "{}", vulnerability_line(vuln))?;
        }
    } else if result.audit.succeeded {
        writeln!(w, "    🛡️  No vulnerabilities detected")?;
    }
    Ok(())
}

fn render_step(
    w: &mut dyn Write,
    label: &str,
    outcome: &ActionOutcome,
    ok_text: &str,
) -> std::io::Result<()> {
    if outcome.succeeded {
        writeln!(w, "    {label}: {}", format!("✅ {ok_text}").green())?;
    } else if let Some(error) = &outcome.error {
        writeln!(w, "    {label}: {}", format!("❌ {error}").red())?;
    }
    Ok(())
}

fn vulnerability_line(vuln: &Vulnerability) -> String {
    let line = format!(
        "      - {}: {} ({})",
        vuln.severity, vuln.package, vuln.description
    );
    let line = match vuln.severity {
        Severity::Critical | Severity::High => line.red().bold(),
        Severity::Moderate => line.yellow(),
        Severity::Low => line.cyan(),
    };
    if vuln.fixed {
        format!("{line}{}", " - FIXED".green().bold())
    } else {
        line.to_string()
    }
}

/// Human-friendly duration, rounded to whole seconds above one second.
pub fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    if total_secs == 0 {
        return format!("{}ms", duration.as_millis());
    }
    let (h, m, s) = (total_secs / 3600, (total_secs % 3600) / 60, total_secs % 60);
    match (h, m) {
        (0, 0) => format!("{s}s"),
        (0, _) => format!("{m}m{s}s"),
        _ => format!("{h}h{m}m{s}s"),
    }
}

/// Live progress printed to stderr while the orchestrator runs.
#[derive(Debug, Default)]
pub struct ConsoleObserver;

impl ConsoleObserver {
    pub fn new() -> Self {
        Self
    }
}

impl ScanObserver for ConsoleObserver {
    fn project_started(&mut self, index: usize, total: usize, path: &Path) {
        eprintln!();
        eprintln!(
            "{}",
            format!("📦 [{}/{}] Scanning {}", index + 1, total, path.display())
                .cyan()
                .bold()
        );
    }

    fn step_finished(&mut self, _path: &Path, step: StepKind, outcome: &ActionOutcome) {
        if outcome.succeeded {
            eprintln!("  {}", format!("✅ {}", step.label()).green());
        } else if let Some(error) = &outcome.error {
            eprintln!("  {}", format!("❌ {}: {error}", step.label()).red());
        }
    }

    fn project_finished(&mut self, _index: usize, _total: usize, result: &ProjectScanResult) {
        let found = result.vulnerabilities.len();
        let line = format!(
            "  {} in {} ({} vulnerabilities)",
            result.status,
            format_duration(result.duration),
            found
        );
        if result.is_success() {
            eprintln!("{}", line.green());
        } else {
            eprintln!("{}", line.red());
        }
    }
}
