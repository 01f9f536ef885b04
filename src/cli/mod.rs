//! cli
//!
//! Command-line interface layer.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments
//! - Merge flags over configuration into [`RecreateOptions`]
//! - Pick the confirmation policy and progress renderer
//! - Map outcomes to exit codes
//! - Does NOT perform repository mutations directly

pub mod args;
pub mod progress;

pub use args::Cli;
pub use progress::CliProgress;

use std::process::ExitCode;

use anyhow::{Context, Result};

use crate::core::config::Config;
use crate::core::types::BranchName;
use crate::engine::{RecreateError, RecreateOptions, RecreateOutcome, RecoveryPlan, Recreator};
use crate::git::Git;
use crate::ui::output::{self, format_list, Verbosity};
use crate::ui::prompts::{AlwaysYes, Confirm, NonInteractive, TerminalConfirm};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`. Returns exit code 0
/// for a recreation, a listing or nothing to do, and 1 for anything else.
pub fn run(cli: Cli) -> ExitCode {
    match execute(&cli) {
        Ok(outcome) if outcome.is_success() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(err) => {
            output::error(format!("{:#}", err));
            if let Some(RecreateError::Interrupted { recovery, .. }) =
                err.downcast_ref::<RecreateError>()
            {
                output::always(recovery_instructions(recovery));
            }
            ExitCode::FAILURE
        }
    }
}

/// Commands for the operator after an interrupted run.
fn recovery_instructions(recovery: &RecoveryPlan) -> String {
    let heading = if recovery.restores_source() {
        "To restore the repository run:"
    } else {
        "To finish the recreation run:"
    };
    format!("{}\n\n  {}\n", heading, recovery)
}

fn execute(cli: &Cli) -> Result<RecreateOutcome> {
    let cwd = match &cli.cwd {
        Some(path) => path.clone(),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let git = Git::open(&cwd).context("failed to open repository")?;
    let config = Config::load(Some(&git.paths())).context("failed to load configuration")?;
    if let Some(path) = config.repo_config_loaded_from() {
        tracing::debug!(path = %path.display(), "loaded repo config");
    }

    let options = build_options(cli, &config)?;
    tracing::debug!(?options, "resolved options");

    let verbosity = Verbosity::from_flags(cli.quiet, cli.verbose);
    let progress = CliProgress::new(verbosity);
    let mut confirm: Box<dyn Confirm> = if cli.yes {
        Box::new(AlwaysYes)
    } else if config.interactive() {
        Box::new(TerminalConfirm)
    } else {
        Box::new(NonInteractive)
    };

    let outcome = Recreator::new(&git, confirm.as_mut(), &progress).run(&options)?;
    report(&outcome, verbosity);
    Ok(outcome)
}

/// Flags over repo config over global config over defaults.
fn build_options(cli: &Cli, config: &Config) -> Result<RecreateOptions> {
    let mut options = RecreateOptions::new(cli.source.clone());
    options.target = cli.target.clone();
    options.base = cli
        .base
        .clone()
        .unwrap_or_else(|| config.base().to_string());
    options.remote = cli
        .remote
        .clone()
        .unwrap_or_else(|| config.remote().to_string());
    options.exclude = if cli.exclude.is_empty() {
        config.exclude().to_vec()
    } else {
        cli.exclude.clone()
    };
    options.integration = if cli.integration.is_empty() {
        config
            .integration()
            .iter()
            .map(BranchName::new)
            .collect::<Result<Vec<_>, _>>()
            .context("invalid integration branch in configuration")?
    } else {
        cli.integration.clone()
    };
    options.list_only = cli.list;
    options.discard = cli.discard;
    options.prefill_cache = !cli.no_rerere_cache && config.prefill_cache();
    options.backup_prefix = config.backup_prefix().to_string();
    Ok(options)
}

fn report(outcome: &RecreateOutcome, verbosity: Verbosity) {
    match outcome {
        RecreateOutcome::NothingToRecreate {
            source,
            base,
            discovery,
        } => {
            if discovery.found.is_empty() {
                output::print(
                    format!(
                        "No feature branches detected, '{}' matches '{}'. Nothing to recreate.",
                        source, base
                    ),
                    verbosity,
                );
            } else {
                output::print(
                    format!(
                        "Every feature branch of '{}' is excluded. Nothing to recreate.",
                        source
                    ),
                    verbosity,
                );
            }
        }
        RecreateOutcome::Listed { discovery } => {
            output::always(format!(
                "Branches to be merged:\n{}",
                format_list(discovery.accepted.as_slice(), "  ")
            ));
            if !discovery.excluded.is_empty() {
                output::always(format!(
                    "Excluded:\n{}",
                    format_list(&discovery.excluded, "  ")
                ));
            }
        }
        RecreateOutcome::Recreated { plan, replayed, .. } => {
            output::print(
                format!(
                    "Recreated '{}' from '{}' with {} merge(s).",
                    plan.target,
                    plan.base,
                    replayed.len()
                ),
                verbosity,
            );
        }
        RecreateOutcome::ConflictPaused { branch, .. } => {
            output::error(format!("replay paused on a conflict merging '{}'", branch));
        }
    }
}
