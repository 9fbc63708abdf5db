//! npmscan CLI library
//!
//! Argument parsing, configuration layering, logging, prompts, terminal
//! rendering and report files around the `npmscan-scanner` pipeline.
//! The `npmscan` binary in `main.rs` is a thin wrapper over [`run`].

pub mod cli;
pub mod commands;
pub mod error;
pub mod logging;
pub mod output;
pub mod prompt;
pub mod report;

use npmscan_core::config::{IgnoredEnvVar, NpmscanConfig};

use crate::cli::Cli;
use crate::error::CliError;
use crate::output::OutputWriter;

/// Load configuration in layers: defaults, file, environment, then flags.
///
/// A missing file is only an error when the path was given explicitly.
/// Validation runs once, after every layer is applied.
pub async fn load_config(cli: &Cli) -> Result<NpmscanConfig, CliError> {
    load_config_layers(cli).await.map(|(config, _)| config)
}

/// Like [`load_config`], also returning the environment variables that were
/// ignored because their values did not parse.
pub async fn load_config_layers(
    cli: &Cli,
) -> Result<(NpmscanConfig, Vec<IgnoredEnvVar>), CliError> {
    let (path, explicit) = cli.config_path();
    let (mut config, ignored) = NpmscanConfig::load_unvalidated(path, explicit).await?;
    cli.apply_overrides(&mut config);
    config.validate()?;
    Ok((config, ignored))
}

/// Run the CLI after argument parsing.
pub async fn run(cli: Cli) -> Result<(), CliError> {
    let (config, ignored) = load_config_layers(&cli).await?;

    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;
    ignored.iter().for_each(IgnoredEnvVar::warn);
    tracing::debug!(target_dir = %cli.target.display(), "npmscan starting");

    let writer = OutputWriter::new(cli.output);
    commands::scan::execute(&cli, &config, &writer).await
}
