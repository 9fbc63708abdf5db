//! `npmscan [target]` command handler
//!
//! Flow: audit tool setup → project discovery → confirmation → per-project
//! pipeline → terminal summary → report files.

use std::io::Write;
use std::path::{Path, PathBuf};

use colored::Colorize;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use npmscan_core::config::NpmscanConfig;
use npmscan_core::pipeline::{CommandLocator, Prompter, ScanObserver};
use npmscan_scanner::{
    AuditToolSetup, CommandRunner, PathLocator, PipelineSteps, ProjectFinder, ReportAggregator,
    ScanOrchestrator, ScanReport, ScannerConfig, SetupStatus, TextAuditParser, TokioCommandRunner,
};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::{ConsoleObserver, OutputWriter};
use crate::prompt::{AutoConfirm, DialoguerPrompter, PROCEED_QUESTION};
use crate::report::{ReportWriter, WrittenReports};

/// What the pre-scan phase decided.
#[derive(Debug, PartialEq, Eq)]
pub enum Preparation {
    /// Projects found and the user agreed to scan them.
    Ready {
        projects: Vec<PathBuf>,
        tool_enabled: bool,
    },
    /// The audit tool was just installed; the terminal must be restarted.
    RestartRequired,
    /// No `package.json` outside `node_modules`.
    NoProjects,
    /// The user declined the scan.
    Declined,
}

/// One scan run over a target directory.
pub struct ScanSession<'a, R, L> {
    config: &'a ScannerConfig,
    runner: R,
    locator: &'a L,
    prompter: &'a dyn Prompter,
    cancel: CancellationToken,
}

impl<'a, R, L> ScanSession<'a, R, L>
where
    R: CommandRunner,
    L: CommandLocator,
{
    pub fn new(
        config: &'a ScannerConfig,
        runner: R,
        locator: &'a L,
        prompter: &'a dyn Prompter,
    ) -> Self {
        Self {
            config,
            runner,
            locator,
            prompter,
            cancel: CancellationToken::new(),
        }
    }

    /// Token checked between projects; cancelling it also stops the running command
    /// when the runner shares it.
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Setup check, discovery and confirmation.
    pub async fn prepare(&self, target: &Path) -> Result<Preparation, CliError> {
        eprintln!("{}", "🔧 Checking audit tool installation...".cyan().bold());
        let setup = AuditToolSetup::new(&self.runner, self.locator, self.config);
        let status = setup.ensure(self.prompter).await?;
        print_setup_status(status, self.config);

        if status == SetupStatus::RestartRequired {
            return Ok(Preparation::RestartRequired);
        }

        eprintln!(
            "{}",
            format!("🔍 Searching for npm projects in {}", target.display())
                .cyan()
                .bold()
        );
        let projects = ProjectFinder::from_config(self.config)
            .discover(target)
            .await?;

        if projects.is_empty() {
            eprintln!(
                "{}",
                "⚠️  No npm projects found in the specified directory"
                    .yellow()
                    .bold()
            );
            return Ok(Preparation::NoProjects);
        }

        eprintln!(
            "{}",
            format!("🎯 Found {} npm project(s):", projects.len())
                .cyan()
                .bold()
        );
        for (i, project) in projects.iter().enumerate() {
            eprintln!("  {}. {}", i + 1, project.display());
        }
        eprintln!();

        if !self.prompter.confirm(PROCEED_QUESTION) {
            eprintln!("{}", "🚫 Scan cancelled by user".cyan());
            return Ok(Preparation::Declined);
        }

        Ok(Preparation::Ready {
            projects,
            tool_enabled: status.tool_enabled(),
        })
    }

    /// Run the pipeline over every project and close the report.
    pub async fn scan(
        self,
        projects: &[PathBuf],
        tool_enabled: bool,
        observer: &mut dyn ScanObserver,
    ) -> ScanReport {
        let mut aggregator = ReportAggregator::init();
        let orchestrator = ScanOrchestrator::new(
            PipelineSteps::new(self.runner, self.config),
            TextAuditParser::new(),
            tool_enabled,
        )
        .with_cancel_token(self.cancel);

        orchestrator.run(projects, &mut aggregator, observer).await;
        aggregator.finalize()
    }
}

/// Execute the scan command with the real process runner and terminal prompts.
pub async fn execute(
    cli: &Cli,
    config: &NpmscanConfig,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let scanner_config = ScannerConfig::from_core(config);
    scanner_config.validate()?;

    eprintln!(
        "{}",
        format!("🔍 npmscan v{}", env!("CARGO_PKG_VERSION"))
            .cyan()
            .bold()
    );
    eprintln!("Target directory: {}\n", cli.target.display());

    let cancel = CancellationToken::new();
    let runner = TokioCommandRunner::new(scanner_config.step_timeout, cancel.clone());
    let prompter: Box<dyn Prompter> = if cli.yes {
        Box::new(AutoConfirm)
    } else {
        Box::new(DialoguerPrompter)
    };

    let session = ScanSession::new(&scanner_config, runner, &PathLocator, prompter.as_ref())
        .with_cancel_token(cancel.clone());

    let (projects, tool_enabled) = match session.prepare(&cli.target).await? {
        Preparation::Ready {
            projects,
            tool_enabled,
        } => (projects, tool_enabled),
        Preparation::RestartRequired => {
            eprintln!("{}", "👋 Exiting for terminal restart...".cyan());
            return Ok(());
        }
        Preparation::NoProjects | Preparation::Declined => return Ok(()),
    };

    let signal_token = cancel.clone();
    let signal_task = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping scan");
            eprintln!(
                "\n{}",
                "⚠️  Interrupt received, stopping after the current step..."
                    .yellow()
                    .bold()
            );
            signal_token.cancel();
        }
    });

    let mut observer = ConsoleObserver::new();
    let report = session.scan(&projects, tool_enabled, &mut observer).await;
    signal_task.abort();

    let reports = ReportWriter::new(&config.scan.reports_dir);
    publish_report(&report, writer, &reports, std::io::stdout()).await?;

    info!(
        scan_id = %report.scan_id,
        succeeded = report.success_count,
        failed = report.failure_count,
        "scan complete"
    );

    if report.interrupted {
        return Err(CliError::Interrupted);
    }
    if report.failure_count == 0 {
        eprintln!("{}", "✅ All projects scanned successfully!".green().bold());
    }
    Ok(())
}

fn print_setup_status(status: SetupStatus, config: &ScannerConfig) {
    match status {
        SetupStatus::Ready {
            shell_integrated: true,
        } => {
            eprintln!(
                "{}",
                "✅ Audit tool is installed and configured".green().bold()
            );
        }
        SetupStatus::Ready {
            shell_integrated: false,
        } => {
            eprintln!(
                "{}",
                "⚠️  Audit tool found, but npm is not wrapped in your shell"
                    .yellow()
                    .bold()
            );
            eprintln!("{}", format!("   Run: {} setup", config.tool).yellow());
            eprintln!("{}", "   Then restart your terminal".yellow());
        }
        SetupStatus::Demo => {
            eprintln!(
                "{}",
                "🔧 Running in demo mode without the audit tool"
                    .yellow()
                    .bold()
            );
            eprintln!("{}", "📋 To install it later:".yellow());
            eprintln!(
                "{}",
                format!(
                    "   1. Run: {} install -g {}",
                    config.package_manager, config.tool_package
                )
                .yellow()
            );
            eprintln!("{}", format!("   2. Run: {} setup", config.tool).yellow());
            eprintln!("{}", "   3. Restart your terminal".yellow());
        }
        SetupStatus::RestartRequired => {
            eprintln!("{}", "✅ Audit tool installation completed".green().bold());
            eprintln!(
                "{}",
                "🔄 Please restart your terminal and run the scanner again"
                    .yellow()
                    .bold()
            );
        }
    }
}

/// Write both report files, then render the summary to `out`.
///
/// A render failure (closed stdout) is returned only after the files exist.
pub async fn publish_report<W: Write>(
    report: &ScanReport,
    writer: &OutputWriter,
    reports: &ReportWriter,
    mut out: W,
) -> Result<WrittenReports, CliError> {
    let written = reports.write_all(report).await;
    let rendered = writer.render_to(report, &mut out);
    if let Err(e) = &rendered {
        warn!(error = %e, "failed to render summary");
    }
    print_report_links(&written);
    rendered.map(|()| written)
}

fn print_report_links(written: &WrittenReports) {
    eprintln!();
    eprintln!("{}", "📄 Generated Reports:".cyan().bold());
    match (&written.html, written.html_url()) {
        (Ok(_), Some(url)) => eprintln!("🌐 HTML Report: {}", url.green()),
        (Err(e), _) => eprintln!("{}", format!("❌ Failed to generate HTML report: {e}").red()),
        (Ok(path), None) => eprintln!("🌐 HTML Report: {}", path.display()),
    }
    match &written.json {
        Ok(path) => eprintln!("📋 JSON Report: {}", path.display().to_string().green()),
        Err(e) => eprintln!("{}", format!("❌ Failed to generate JSON report: {e}").red()),
    }
}
