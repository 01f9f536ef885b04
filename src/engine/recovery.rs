//! engine::recovery
//!
//! The literal command sequence that undoes a recreation attempt.
//!
//! Printed before the first replay merge, again when replay pauses, and
//! with any failure after the source branch was renamed, so the operator
//! always holds a way back once refs have moved.
//!
//! The commands depend on how far the rebuild got: a target that was never
//! created must not be deleted, and a finished replay only needs the last
//! step completed.

use std::fmt;

use crate::core::types::BranchName;

/// How far the rebuild got after the source was renamed to its backup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoveryStage {
    /// The target branch does not exist yet.
    BeforeTarget,
    /// The target exists and merges are being replayed onto it.
    Replaying,
    /// Every merge was replayed; only the backup is left to resolve.
    Finalizing,
}

/// Commands that restore the source branch from its backup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPlan {
    /// Original name of the branch being recreated.
    pub source: BranchName,
    /// The branch being built.
    pub target: BranchName,
    /// Where the source branch is parked meanwhile.
    pub backup: BranchName,
    /// Whether a merge must be aborted first.
    pub abort_merge: bool,
    pub stage: RecoveryStage,
}

impl RecoveryPlan {
    /// Plan for a rebuild whose target already exists.
    pub fn new(source: BranchName, target: BranchName, backup: BranchName) -> Self {
        Self {
            source,
            target,
            backup,
            abort_merge: false,
            stage: RecoveryStage::Replaying,
        }
    }

    /// Same plan, starting with `git merge --abort`.
    pub fn with_merge_abort(mut self, abort: bool) -> Self {
        self.abort_merge = abort;
        self
    }

    /// Same plan for a rebuild that stopped at `stage`.
    pub fn at_stage(mut self, stage: RecoveryStage) -> Self {
        self.stage = stage;
        self
    }

    /// Whether running the commands brings back the original source branch.
    /// False once replay finished: the commands then complete the recreation.
    pub fn restores_source(&self) -> bool {
        self.stage != RecoveryStage::Finalizing || self.target != self.source
    }

    /// The commands, in order.
    ///
    /// # Example
    ///
    /// ```
    /// use recreate_branch::core::types::BranchName;
    /// use recreate_branch::engine::recovery::RecoveryPlan;
    ///
    /// let name = |s: &str| BranchName::new(s).unwrap();
    /// let plan = RecoveryPlan::new(name("release"), name("release"), name("BPF-PREFIX-release"));
    /// assert_eq!(
    ///     plan.to_string(),
    ///     "git checkout BPF-PREFIX-release && git branch -D release && git branch -m BPF-PREFIX-release release"
    /// );
    /// ```
    pub fn commands(&self) -> Vec<String> {
        let rename = format!("git branch -m {} {}", self.backup, self.source);
        match self.stage {
            // The source name is free and nothing else was created.
            RecoveryStage::BeforeTarget => vec![rename],
            RecoveryStage::Replaying => {
                let mut commands = Vec::with_capacity(4);
                if self.abort_merge {
                    commands.push("git merge --abort".to_string());
                }
                commands.push(format!("git checkout {}", self.backup));
                commands.push(format!("git branch -D {}", self.target));
                commands.push(rename);
                commands
            }
            RecoveryStage::Finalizing if self.target == self.source => {
                vec![format!("git branch -D {}", self.backup)]
            }
            RecoveryStage::Finalizing => vec![rename],
        }
    }
}

impl fmt::Display for RecoveryPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.commands().join(" && "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> BranchName {
        BranchName::new(s).unwrap()
    }

    #[test]
    fn abort_comes_first() {
        let plan = RecoveryPlan::new(name("release"), name("release"), name("BPF-PREFIX-release"))
            .with_merge_abort(true);
        let commands = plan.commands();
        assert_eq!(commands.len(), 4);
        assert_eq!(commands[0], "git merge --abort");
        assert_eq!(commands[1], "git checkout BPF-PREFIX-release");
    }

    #[test]
    fn missing_target_is_never_deleted() {
        let plan = RecoveryPlan::new(name("release"), name("release"), name("BPF-PREFIX-release"))
            .at_stage(RecoveryStage::BeforeTarget);
        assert_eq!(plan.commands(), vec!["git branch -m BPF-PREFIX-release release"]);
        assert!(plan.restores_source());
    }

    #[test]
    fn finished_replay_keeps_the_target() {
        let in_place = RecoveryPlan::new(name("release"), name("release"), name("BPF-PREFIX-release"))
            .at_stage(RecoveryStage::Finalizing);
        assert_eq!(in_place.commands(), vec!["git branch -D BPF-PREFIX-release"]);
        assert!(!in_place.restores_source());

        let separate =
            RecoveryPlan::new(name("release"), name("release-new"), name("BPF-PREFIX-release"))
                .at_stage(RecoveryStage::Finalizing);
        assert_eq!(separate.commands(), vec!["git branch -m BPF-PREFIX-release release"]);
        assert!(separate.restores_source());
    }

    #[test]
    fn distinct_target_is_deleted_and_backup_renamed() {
        let plan = RecoveryPlan::new(name("release"), name("release-new"), name("BPF-PREFIX-release"));
        assert_eq!(
            plan.commands(),
            vec![
                "git checkout BPF-PREFIX-release",
                "git branch -D release-new",
                "git branch -m BPF-PREFIX-release release",
            ]
        );
    }
}
