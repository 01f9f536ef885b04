//! engine::train
//!
//! Resolution Cache Trainer: teach git's rerere cache how historical merges
//! were resolved, without touching any branch.
//!
//! # Invariants
//!
//! - No branch ref and no HEAD position differs between entry and exit.
//!   Every attempt happens detached and is hard-reset afterwards, and the
//!   starting position is restored after each branch, on error too.
//! - Only the resolution cache gains entries.

use crate::core::types::{BranchName, MergeCommit, Oid, Ref};
use crate::git::{
    Gateway, GitError, GitState, MergeAttempt, MergeStyle, RevRange, WorkspacePosition,
};

use super::Progress;

/// What happened to one historical merge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TrainingOutcome {
    /// Re-merged without conflicts; nothing to learn.
    Clean,
    /// Conflicted and the recorded resolution was taught to the cache.
    Learned { paths: Vec<String> },
    /// Conflicted but rerere tracked no path (e.g. only delete/modify conflicts).
    NotLearnable { paths: Vec<String> },
    /// git refused to attempt the merge.
    Skipped { reason: String },
}

/// Totals for one training pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingReport {
    /// Learning branches walked.
    pub branches: usize,
    /// Learning branches that do not exist locally.
    pub missing: Vec<BranchName>,
    /// Merge commits re-attempted.
    pub merges_examined: usize,
    /// Attempts that merged cleanly.
    pub clean: usize,
    /// Attempts whose resolution was recorded.
    pub learned: usize,
    /// Conflicted attempts rerere could not track.
    pub not_learnable: usize,
    /// Attempts git refused to start.
    pub skipped: usize,
    /// Merges with more than two parents (trained on the first two only).
    pub octopus: usize,
    /// Entries in the cache before training.
    pub cache_entries_before: usize,
    /// Entries in the cache after training.
    pub cache_entries_after: usize,
}

impl TrainingReport {
    /// Cache entries created by this pass.
    pub fn entries_added(&self) -> usize {
        self.cache_entries_after
            .saturating_sub(self.cache_entries_before)
    }

    fn record(&mut self, outcome: &TrainingOutcome) {
        self.merges_examined += 1;
        match outcome {
            TrainingOutcome::Clean => self.clean += 1,
            TrainingOutcome::Learned { .. } => self.learned += 1,
            TrainingOutcome::NotLearnable { .. } => self.not_learnable += 1,
            TrainingOutcome::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Replay every merge in `base..branch` for each learning branch and record
/// the conflict resolutions they contain.
///
/// # Errors
///
/// Any gateway failure. The starting position is restored before the error
/// is returned.
pub fn train(
    gateway: &dyn Gateway,
    base: &Oid,
    branches: &[BranchName],
    progress: &dyn Progress,
) -> Result<TrainingReport, GitError> {
    gateway.ensure_resolution_cache()?;

    let start = gateway.position()?;
    let mut report = TrainingReport {
        cache_entries_before: gateway.resolution_cache_entries()?.len(),
        ..Default::default()
    };

    for branch in branches {
        // Integration branches often exist only as remote-tracking refs.
        let tip = match gateway.resolve(&Ref::local(branch))? {
            Some(tip) => Some(tip),
            None => gateway.resolve(&Ref::revision(branch.as_str()))?,
        };
        let Some(tip) = tip else {
            tracing::warn!(%branch, "learning branch does not exist, skipping");
            report.missing.push(branch.clone());
            continue;
        };
        report.branches += 1;

        let result = train_branch(gateway, base, branch, &tip, progress, &mut report);
        let restored = restore(gateway, &start);
        result?;
        restored?;
    }

    report.cache_entries_after = gateway.resolution_cache_entries()?.len();
    tracing::debug!(?report, "training finished");
    Ok(report)
}

fn train_branch(
    gateway: &dyn Gateway,
    base: &Oid,
    branch: &BranchName,
    tip: &Oid,
    progress: &dyn Progress,
    report: &mut TrainingReport,
) -> Result<(), GitError> {
    let merges = gateway.merge_commits(&RevRange::Exclusive {
        from: base.clone(),
        to: tip.clone(),
    })?;
    progress.on_training_branch(branch, merges.len());

    for merge in &merges {
        if merge.is_octopus() {
            report.octopus += 1;
            tracing::warn!(
                merge = %merge.oid.short(7),
                ignored = merge.parents.len() - 2,
                "octopus merge: training on the first two parents only"
            );
        }
        let outcome = train_merge(gateway, merge)?;
        tracing::debug!(merge = %merge.oid.short(7), ?outcome, "trained");
        if matches!(outcome, TrainingOutcome::Learned { .. }) {
            progress.on_learned(merge);
        }
        report.record(&outcome);
    }
    Ok(())
}

/// Re-attempt one merge detached at its first parent.
fn train_merge(gateway: &dyn Gateway, merge: &MergeCommit) -> Result<TrainingOutcome, GitError> {
    let [first, second, ..] = merge.parents.as_slice() else {
        return Ok(TrainingOutcome::Skipped {
            reason: format!("{} has fewer than two parents", merge.oid.short(7)),
        });
    };

    gateway.checkout(&WorkspacePosition::Detached(first.clone()))?;

    let outcome = match gateway.merge(second.as_str(), MergeStyle::Trial)? {
        MergeAttempt::Clean => TrainingOutcome::Clean,
        MergeAttempt::Conflicted { paths } => {
            if gateway.rerere_status()?.is_empty() {
                TrainingOutcome::NotLearnable { paths }
            } else {
                gateway.rerere_record()?;
                gateway.checkout_tree(&merge.oid)?;
                gateway.rerere_record()?;
                TrainingOutcome::Learned { paths }
            }
        }
        MergeAttempt::Refused { message } => TrainingOutcome::Skipped { reason: message },
    };

    gateway.reset_hard()?;
    Ok(outcome)
}

/// Put the workspace back where training found it.
fn restore(gateway: &dyn Gateway, start: &WorkspacePosition) -> Result<(), GitError> {
    if gateway.state() == GitState::Merge {
        gateway.abort_merge()?;
    }
    if gateway.state().is_in_progress() || !gateway.is_worktree_clean()? {
        gateway.reset_hard()?;
    }
    gateway.checkout(start)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_counts_outcomes() {
        let mut report = TrainingReport::default();
        report.record(&TrainingOutcome::Clean);
        report.record(&TrainingOutcome::Learned {
            paths: vec!["a.txt".into()],
        });
        report.record(&TrainingOutcome::NotLearnable { paths: vec![] });
        report.record(&TrainingOutcome::Skipped {
            reason: "refused".into(),
        });

        assert_eq!(report.merges_examined, 4);
        assert_eq!(report.clean, 1);
        assert_eq!(report.learned, 1);
        assert_eq!(report.not_learnable, 1);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn entries_added_never_underflows() {
        let report = TrainingReport {
            cache_entries_before: 3,
            cache_entries_after: 1,
            ..Default::default()
        };
        assert_eq!(report.entries_added(), 0);
    }
}
