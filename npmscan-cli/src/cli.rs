//! CLI argument parsing using clap derive API
//!
//! Purely declarative: flag definitions plus the mapping of flags onto
//! the loaded [`NpmscanConfig`]. No I/O happens here.

use std::path::{Path, PathBuf};

use clap::{Parser, ValueEnum};

use npmscan_core::config::{DEFAULT_CONFIG_FILE, NpmscanConfig};

/// npmscan -- reinstall and audit every npm project under a directory.
///
/// Finds each `package.json` outside `node_modules`, then for every project
/// removes `node_modules`, runs `npm install` and `npm audit` (plus
/// `npm audit fix`), and writes HTML and JSON reports.
#[derive(Parser, Debug)]
#[command(name = "npmscan", version, about, long_about = None)]
pub struct Cli {
    /// Directory to scan (default: current directory).
    #[arg(default_value = ".")]
    pub target: PathBuf,

    /// Path to the npmscan.toml configuration file.
    ///
    /// When omitted, `npmscan.toml` is used if it exists.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Summary output format.
    #[arg(long, default_value = "text")]
    pub output: OutputFormat,

    /// Answer prompts automatically: proceed with the scan, never install the audit tool.
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Per-command timeout in seconds (0 disables).
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Directory for the HTML and JSON reports.
    #[arg(long, value_name = "DIR")]
    pub reports_dir: Option<PathBuf>,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable colored summary.
    Text,
    /// The finalized report as pretty JSON.
    Json,
}

impl Cli {
    /// Config file path and whether it was given explicitly.
    pub fn config_path(&self) -> (&Path, bool) {
        match &self.config {
            Some(path) => (path.as_path(), true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        }
    }

    /// Apply flag overrides on top of file and environment values.
    pub fn apply_overrides(&self, config: &mut NpmscanConfig) {
        if let Some(level) = &self.log_level {
            config.general.log_level = level.clone();
        }
        if let Some(secs) = self.timeout {
            config.scan.step_timeout_secs = secs;
        }
        if let Some(dir) = &self.reports_dir {
            config.scan.reports_dir = dir.display().to_string();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_defaults() {
        let cli = Cli::try_parse_from(["npmscan"]).expect("parse succeeded");
        assert_eq!(cli.target, PathBuf::from("."));
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert_eq!(cli.output, OutputFormat::Text);
        assert!(!cli.yes);
        assert!(cli.timeout.is_none());
        assert!(cli.reports_dir.is_none());
    }

    #[test]
    fn test_cli_parse_target_directory() {
        let cli = Cli::try_parse_from(["npmscan", "/work/projects"]).expect("parse succeeded");
        assert_eq!(cli.target, PathBuf::from("/work/projects"));
    }

    #[test]
    fn test_cli_parse_too_many_targets_fails() {
        let args = Cli::try_parse_from(["npmscan", "a", "b"]);
        assert!(args.is_err(), "only one target directory is accepted");
    }

    #[test]
    fn test_cli_parse_custom_config_path() {
        let cli = Cli::try_parse_from(["npmscan", "-c", "/custom/npmscan.toml"])
            .expect("parse succeeded");
        let (path, explicit) = cli.config_path();
        assert_eq!(path, Path::new("/custom/npmscan.toml"));
        assert!(explicit);
    }

    #[test]
    fn test_cli_default_config_path_is_implicit() {
        let cli = Cli::try_parse_from(["npmscan"]).expect("parse succeeded");
        let (path, explicit) = cli.config_path();
        assert_eq!(path, Path::new(DEFAULT_CONFIG_FILE));
        assert!(!explicit);
    }

    #[test]
    fn test_cli_parse_yes_short_and_long() {
        assert!(Cli::try_parse_from(["npmscan", "-y"]).expect("parse").yes);
        assert!(Cli::try_parse_from(["npmscan", "--yes"]).expect("parse").yes);
    }

    #[test]
    fn test_cli_parse_output_format_json() {
        let cli = Cli::try_parse_from(["npmscan", "--output", "json"]).expect("parse succeeded");
        assert_eq!(cli.output, OutputFormat::Json);
    }

    #[test]
    fn test_cli_parse_invalid_output_format_fails() {
        let args = Cli::try_parse_from(["npmscan", "--output", "xml"]);
        assert!(args.is_err(), "should reject unknown output format");
    }

    #[test]
    fn test_cli_parse_invalid_timeout_fails() {
        let args = Cli::try_parse_from(["npmscan", "--timeout", "soon"]);
        assert!(args.is_err(), "timeout must be numeric");
    }

    #[test]
    fn test_apply_overrides() {
        let cli = Cli::try_parse_from([
            "npmscan",
            "--log-level",
            "debug",
            "--timeout",
            "0",
            "--reports-dir",
            "out/reports",
        ])
        .expect("parse succeeded");

        let mut config = NpmscanConfig::default();
        cli.apply_overrides(&mut config);

        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.scan.step_timeout_secs, 0);
        assert_eq!(config.scan.reports_dir, "out/reports");
    }

    #[test]
    fn test_apply_overrides_without_flags_keeps_config() {
        let cli = Cli::try_parse_from(["npmscan"]).expect("parse succeeded");
        let mut config = NpmscanConfig::default();
        config.scan.step_timeout_secs = 42;
        cli.apply_overrides(&mut config);
        assert_eq!(config.scan.step_timeout_secs, 42);
        assert_eq!(config.general.log_level, "warn");
    }

    #[test]
    fn test_cli_verify_command_structure() {
        Cli::command().debug_assert();
        assert_eq!(Cli::command().get_name(), "npmscan");
    }
}
