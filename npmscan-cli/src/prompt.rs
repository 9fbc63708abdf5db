//! Confirmation prompts
//!
//! [`DialoguerPrompter`] asks on the terminal; [`AutoConfirm`] backs `--yes`.

use colored::Colorize;
use dialoguer::{Confirm, theme::ColorfulTheme};
use tracing::info;

use npmscan_core::pipeline::Prompter;
use npmscan_scanner::setup::INSTALL_QUESTION;

/// Question asked before the scan pipeline starts.
pub const PROCEED_QUESTION: &str = "Do you want to proceed with the security scan?";

/// Interactive `[y/N]` prompt.
///
/// Defaults to "no". A prompt that cannot be shown (no terminal, closed stdin)
/// counts as "no".
#[derive(Debug, Default)]
pub struct DialoguerPrompter;

impl Prompter for DialoguerPrompter {
    fn confirm(&self, question: &str) -> bool {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(question)
            .default(false)
            .interact()
            .unwrap_or(false)
    }
}

/// Non-interactive answers for `--yes`.
///
/// Proceeds with the scan but never installs the audit tool, so an
/// unattended run falls back to demo mode instead of touching global packages.
#[derive(Debug, Default)]
pub struct AutoConfirm;

impl Prompter for AutoConfirm {
    fn confirm(&self, question: &str) -> bool {
        let answer = question != INSTALL_QUESTION;
        info!(question, answer, "answered prompt automatically");
        eprintln!(
            "{} {}",
            question,
            if answer { "yes".green() } else { "no".yellow() }
        );
        answer
    }
}
