//! CLI-specific error types and exit code mapping

use npmscan_core::error::NpmscanError;
use npmscan_scanner::ScannerError;

/// CLI-specific error type.
///
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// Audit tool installation failed.
    #[error("audit tool setup failed: {0}")]
    Setup(String),

    /// Project discovery failed before any project was touched.
    #[error("failed to find npm projects: {0}")]
    Discovery(String),

    /// Writing a report file failed.
    #[error("report error: {0}")]
    Report(String),

    /// The scan was stopped by an interrupt.
    #[error("scan interrupted")]
    Interrupted,

    /// A command-level operation failed.
    #[error("{0}")]
    Command(String),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from npmscan-core.
    #[error("{0}")]
    Core(#[from] NpmscanError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                      |
    /// |------|------------------------------|
    /// | 0    | Success or deliberate exit   |
    /// | 1    | General / fatal scan error   |
    /// | 2    | Configuration error          |
    /// | 130  | Interrupted                  |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(NpmscanError::Config(_)) => 2,
            Self::Interrupted => 130,
            Self::Setup(_)
            | Self::Discovery(_)
            | Self::Report(_)
            | Self::Command(_)
            | Self::JsonSerialize(_)
            | Self::Io(_)
            | Self::Core(_) => 1,
        }
    }
}

impl From<ScannerError> for CliError {
    fn from(e: ScannerError) -> Self {
        match e {
            ScannerError::Config { .. } => Self::Config(e.to_string()),
            ScannerError::Discovery { .. } => Self::Discovery(e.to_string()),
            ScannerError::Setup(msg) => Self::Setup(msg),
            ScannerError::Io { .. } => Self::Command(e.to_string()),
        }
    }
}
