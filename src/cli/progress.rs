//! cli::progress
//!
//! Terminal rendering of engine progress.

use crate::core::types::{BranchName, MergeCommit};
use crate::engine::{MergeOutcome, Phase, Progress, RecoveryPlan, RecreationPlan, TrainingReport};
use crate::ui::output::{self, format_list, Verbosity};

/// Prints progress to stdout.
#[derive(Debug, Clone, Copy)]
pub struct CliProgress {
    verbosity: Verbosity,
}

impl CliProgress {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    fn print(&self, message: impl std::fmt::Display) {
        output::print(message, self.verbosity);
    }
}

fn phase_heading(phase: Phase) -> Option<&'static str> {
    match phase {
        Phase::Validate => None,
        Phase::Analyze => Some("Processing merge history..."),
        Phase::Train => Some("Pre-filling the rerere cache..."),
        Phase::Backup => Some("Creating backup of the source branch..."),
        Phase::CreateTarget => Some("Creating the new branch from the base..."),
        Phase::ReplayMerges => Some("Merging in feature branches..."),
        Phase::Finalize => Some("Cleaning up temporary branches..."),
    }
}

impl Progress for CliProgress {
    fn on_phase(&self, phase: Phase) {
        if let Some(heading) = phase_heading(phase) {
            self.print(format!("* {}", heading));
        }
    }

    fn on_message(&self, message: &str) {
        self.print(message);
    }

    fn on_training_branch(&self, branch: &BranchName, merges: usize) {
        if merges == 0 {
            self.print(format!("  '{}': no merge commits to learn from", branch));
        } else {
            self.print(format!("  '{}': {} merge commit(s)", branch, merges));
        }
    }

    fn on_learned(&self, merge: &MergeCommit) {
        if self.verbosity == Verbosity::Verbose {
            self.print(format!("    learning from {}", merge.oid.short(7)));
        }
    }

    fn on_training_done(&self, report: &TrainingReport) {
        for missing in &report.missing {
            output::warn(
                format!("learning branch '{}' does not exist", missing),
                self.verbosity,
            );
        }
        if report.octopus > 0 {
            output::warn(
                format!(
                    "{} octopus merge(s) were trained on their first two parents only",
                    report.octopus
                ),
                self.verbosity,
            );
        }
        self.print(format!(
            "  {} merge(s) examined, {} learned, {} new cache entr{}",
            report.merges_examined,
            report.learned,
            report.entries_added(),
            if report.entries_added() == 1 { "y" } else { "ies" }
        ));
    }

    fn on_plan(&self, plan: &RecreationPlan) {
        let branches = format_list(plan.branches.as_slice(), "  ");
        self.print(format!(
            "\nThe following branches will be merged when the new '{target}' branch is created:\n\n\
             {branches}\n\n\
             If you see something unexpected check:\n  \
             a) that your '{source}' branch is up to date\n  \
             b) if '{base}' is a branch, make sure it is also up to date.\n\n\
             If there are any non-merge commits in '{source}', they will not be included in '{target}'. \
             You have been warned.\n",
            target = plan.target,
            source = plan.source,
            base = plan.base,
        ));
        if !plan.excluded.is_empty() {
            self.print(format!(
                "Excluded:\n{}\n",
                format_list(&plan.excluded, "  ")
            ));
        }
    }

    fn on_replay(&self, index: usize, total: usize, branch: &str) {
        self.print(format!(" - '{}' ({}/{})", branch, index + 1, total));
    }

    fn on_merge_outcome(&self, _branch: &str, outcome: &MergeOutcome) {
        match outcome {
            MergeOutcome::Clean => {}
            MergeOutcome::AutoResolved { paths } => self.print(format!(
                "   conflict has been resolved automatically ({})",
                paths.join(", ")
            )),
            MergeOutcome::Unresolved { paths } => output::always(format!(
                "   conflict could not be resolved automatically:\n{}",
                format_list(paths, "     ")
            )),
            MergeOutcome::Failed { message } => {
                output::always(format!("   merge could not be started: {}", message))
            }
        }
    }

    fn on_recovery(&self, recovery: &RecoveryPlan, paused: bool) {
        if !paused {
            self.print(format!(
                "  To abandon this attempt at any point, run:\n\n    {}\n",
                recovery
            ));
            return;
        }

        output::always(format!(
            "\nThere is a merge conflict on '{target}' that has no recorded resolution.\n\
             Record a resolution by resolving the conflict and committing it.\n\
             Then run the following command to return your repository to its original state:\n\n  \
             {recovery}\n\n\
             If you do not want to resolve the conflict, it is safe to just run the above command \
             to restore your repository to the state it was in before this run.",
            target = recovery.target,
        ));
    }
}
