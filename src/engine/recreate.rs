//! engine::recreate
//!
//! Branch Recreation Engine.
//!
//! # State machine
//!
//! ```text
//! Validate -> Analyze -> [Train] -> Backup -> CreateTarget -> ReplayMerges -> Finalize
//!     \           \                   \                           \
//!      Aborted     NothingToRecreate   Aborted                     ConflictPause
//! ```
//!
//! # Invariants
//!
//! - No ref moves before Validate and Analyze have succeeded and the
//!   operator has confirmed the plan.
//! - Once the source branch is parked under its backup name, every exit
//!   that is not Finalize carries a [`RecoveryPlan`].

use thiserror::Error;

use super::analyze::{discover_feature_branches, Discovery, FeatureBranchList};
use super::recovery::{RecoveryPlan, RecoveryStage};
use super::train::{train, TrainingReport};
use super::{Phase, Progress};
use crate::core::config::{DEFAULT_BASE, DEFAULT_REMOTE};
use crate::core::naming::{backup_name, DEFAULT_BACKUP_PREFIX};
use crate::core::types::{BranchName, Oid, Ref, TypeError};
use crate::git::{Gateway, GitError, GitState, MergeAttempt, MergeStyle, WorkspacePosition};
use crate::ui::prompts::{Confirm, PromptError};

/// Repository config key that makes git record resolutions on commit.
const RERERE_ENABLED: &str = "rerere.enabled";

/// Validation failures, all raised before any mutation.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("base ref '{0}' does not exist")]
    BaseNotFound(String),

    #[error("cannot recreate branch '{0}' as it doesn't exist")]
    SourceNotFound(BranchName),

    #[error("cannot create branch '{0}' as it already exists")]
    TargetExists(BranchName),

    #[error("target branch '{0}' collides with the backup branch name")]
    TargetIsBackup(BranchName),

    #[error("{0} in progress; finish or abort it first")]
    OperationInProgress(GitState),

    #[error("working tree has uncommitted changes; commit or stash them first")]
    DirtyWorktree,
}

/// Errors from a recreation run.
#[derive(Debug, Error)]
pub enum RecreateError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("aborted: {0}")]
    ConfirmationDeclined(String),

    #[error("could not fetch from remote '{remote}'")]
    Fetch {
        remote: String,
        #[source]
        source: GitError,
    },

    /// A gateway step failed after refs were moved.
    #[error("recreation interrupted after '{}' was moved to '{}'", .recovery.source, .recovery.backup)]
    Interrupted {
        recovery: RecoveryPlan,
        #[source]
        source: GitError,
    },

    #[error(transparent)]
    Gateway(#[from] GitError),

    #[error(transparent)]
    Prompt(#[from] PromptError),

    #[error(transparent)]
    Type(#[from] TypeError),
}

/// Inputs to one recreation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecreateOptions {
    /// Branch to recreate.
    pub source: BranchName,
    /// Name for the rebuilt branch; the source name when `None`.
    pub target: Option<BranchName>,
    /// Revision the rebuilt branch starts from.
    pub base: String,
    /// Branches never replayed.
    pub exclude: Vec<String>,
    /// Stop after analysis.
    pub list_only: bool,
    /// Replace the local source with the remote's before starting.
    pub discard: bool,
    /// Remote used by `discard`.
    pub remote: String,
    /// Extra branches whose merges train the cache.
    pub integration: Vec<BranchName>,
    /// Train the resolution cache before replay.
    pub prefill_cache: bool,
    /// Prefix of the backup branch name.
    pub backup_prefix: String,
}

impl RecreateOptions {
    /// Options with defaults for everything but the source.
    pub fn new(source: BranchName) -> Self {
        Self {
            source,
            target: None,
            base: DEFAULT_BASE.to_string(),
            exclude: Vec::new(),
            list_only: false,
            discard: false,
            remote: DEFAULT_REMOTE.to_string(),
            integration: Vec::new(),
            prefill_cache: true,
            backup_prefix: DEFAULT_BACKUP_PREFIX.to_string(),
        }
    }

    /// The branch being built.
    pub fn target(&self) -> &BranchName {
        self.target.as_ref().unwrap_or(&self.source)
    }

    /// Source first, then integration branches, without repeats.
    pub fn learning_branches(&self) -> Vec<BranchName> {
        let mut branches = vec![self.source.clone()];
        for branch in &self.integration {
            if !branches.contains(branch) {
                branches.push(branch.clone());
            }
        }
        branches
    }
}

/// Everything needed to rebuild the branch. Fixed once computed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecreationPlan {
    /// Base ref as given.
    pub base: Ref,
    /// Commit the base resolved to during validation.
    pub base_oid: Oid,
    pub source: BranchName,
    pub target: BranchName,
    pub backup: BranchName,
    /// Names removed by exclusion.
    pub excluded: Vec<String>,
    /// Replay order.
    pub branches: FeatureBranchList,
}

impl RecreationPlan {
    /// Commands that undo the attempt.
    pub fn recovery(&self) -> RecoveryPlan {
        RecoveryPlan::new(
            self.source.clone(),
            self.target.clone(),
            self.backup.clone(),
        )
    }
}

/// How replaying one feature branch went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeOutcome {
    /// Merged without conflicts.
    Clean,
    /// Conflicted, every conflict resolved from the cache and committed.
    AutoResolved { paths: Vec<String> },
    /// Conflicts the cache could not resolve.
    Unresolved { paths: Vec<String> },
    /// git refused to merge.
    Failed { message: String },
}

impl MergeOutcome {
    /// Replay cannot continue past this outcome.
    pub fn pauses(&self) -> bool {
        matches!(
            self,
            MergeOutcome::Unresolved { .. } | MergeOutcome::Failed { .. }
        )
    }
}

/// Terminal states that are not errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecreateOutcome {
    /// Analysis found no feature branch to replay. Nothing was mutated.
    NothingToRecreate {
        source: BranchName,
        base: String,
        discovery: Discovery,
    },
    /// List-only run.
    Listed { discovery: Discovery },
    /// Every branch replayed and the backup resolved.
    Recreated {
        plan: RecreationPlan,
        replayed: Vec<(String, MergeOutcome)>,
        training: Option<TrainingReport>,
    },
    /// Replay stopped on a conflict; the repository is left as the merge left it.
    ConflictPaused {
        plan: RecreationPlan,
        branch: String,
        outcome: MergeOutcome,
        replayed: Vec<(String, MergeOutcome)>,
        recovery: RecoveryPlan,
    },
}

impl RecreateOutcome {
    /// Whether the run ended successfully (exit code 0).
    pub fn is_success(&self) -> bool {
        !matches!(self, RecreateOutcome::ConflictPaused { .. })
    }
}

/// Drives one recreation through its phases.
pub struct Recreator<'a> {
    gateway: &'a dyn Gateway,
    confirm: &'a mut dyn Confirm,
    progress: &'a dyn Progress,
}

impl<'a> Recreator<'a> {
    pub fn new(
        gateway: &'a dyn Gateway,
        confirm: &'a mut dyn Confirm,
        progress: &'a dyn Progress,
    ) -> Self {
        Self {
            gateway,
            confirm,
            progress,
        }
    }

    /// Run the whole state machine.
    ///
    /// # Errors
    ///
    /// - [`RecreateError::Validation`] and [`RecreateError::ConfirmationDeclined`]
    ///   before any ref moves
    /// - [`RecreateError::Fetch`] when discard-and-refetch cannot fetch
    /// - [`RecreateError::Interrupted`] when git fails after refs moved
    pub fn run(&mut self, options: &RecreateOptions) -> Result<RecreateOutcome, RecreateError> {
        self.progress.on_phase(Phase::Validate);
        let base = Ref::revision(options.base.clone());
        let base_oid = self.validate(options, &base)?;

        self.progress.on_phase(Phase::Analyze);
        let discovery =
            discover_feature_branches(self.gateway, &base, &options.source, &options.exclude)?;

        if discovery.found.is_empty() {
            return Ok(nothing_to_recreate(options, discovery));
        }
        if options.list_only {
            return Ok(RecreateOutcome::Listed { discovery });
        }
        if discovery.is_nothing_to_recreate() {
            return Ok(nothing_to_recreate(options, discovery));
        }

        let plan = RecreationPlan {
            base,
            base_oid,
            source: options.source.clone(),
            target: options.target().clone(),
            backup: backup_name(&options.backup_prefix, &options.source)?,
            excluded: discovery.excluded.clone(),
            branches: discovery.accepted.clone(),
        };
        if plan.target == plan.backup {
            return Err(ValidationError::TargetIsBackup(plan.target.clone()).into());
        }

        self.progress.on_plan(&plan);
        let prompt = format!("Proceed with {} branch recreation?", plan.source);
        if !self.confirm.confirm(&prompt, true)? {
            return Err(RecreateError::ConfirmationDeclined(
                "recreation not confirmed".to_string(),
            ));
        }

        self.enable_rerere()?;

        let training = if options.prefill_cache {
            self.progress.on_phase(Phase::Train);
            let report = train(
                self.gateway,
                &plan.base_oid,
                &options.learning_branches(),
                self.progress,
            )?;
            self.progress.on_training_done(&report);
            Some(report)
        } else {
            None
        };

        self.progress.on_phase(Phase::Backup);
        self.backup(&plan)?;

        let mut stage = RecoveryStage::BeforeTarget;
        match self.rebuild(&plan, &mut stage) {
            Ok(Rebuilt::Done(replayed)) => Ok(RecreateOutcome::Recreated {
                plan,
                replayed,
                training,
            }),
            Ok(Rebuilt::Paused {
                branch,
                outcome,
                replayed,
            }) => {
                let recovery = plan
                    .recovery()
                    .at_stage(stage)
                    .with_merge_abort(self.gateway.state() == GitState::Merge);
                self.progress.on_recovery(&recovery, true);
                Ok(RecreateOutcome::ConflictPaused {
                    plan,
                    branch,
                    outcome,
                    replayed,
                    recovery,
                })
            }
            Err(source) => {
                let recovery = plan
                    .recovery()
                    .at_stage(stage)
                    .with_merge_abort(self.gateway.state() == GitState::Merge);
                tracing::warn!(?stage, error = %source, "rebuild failed");
                Err(RecreateError::Interrupted { recovery, source })
            }
        }
    }

    // =========================================================================
    // Validate
    // =========================================================================

    /// Check every precondition; returns the base commit.
    fn validate(&mut self, options: &RecreateOptions, base: &Ref) -> Result<Oid, RecreateError> {
        let state = self.gateway.state();
        if state.is_in_progress() {
            return Err(ValidationError::OperationInProgress(state).into());
        }
        if !self.gateway.is_worktree_clean()? {
            return Err(ValidationError::DirtyWorktree.into());
        }

        let base_oid = self
            .gateway
            .resolve(base)?
            .ok_or_else(|| ValidationError::BaseNotFound(options.base.clone()))?;

        if options.discard {
            self.discard_and_refetch(options, &base_oid)?;
        }

        if !self.gateway.branch_exists(&options.source)? {
            return Err(ValidationError::SourceNotFound(options.source.clone()).into());
        }

        let target = options.target();
        if target != &options.source && self.gateway.branch_exists(target)? {
            return Err(ValidationError::TargetExists(target.clone()).into());
        }

        tracing::debug!(base = %base, base_oid = %base_oid.short(7), source = %options.source, %target, "validated");
        Ok(base_oid)
    }

    /// Replace the local source branch with the remote's copy.
    fn discard_and_refetch(
        &mut self,
        options: &RecreateOptions,
        base_oid: &Oid,
    ) -> Result<(), RecreateError> {
        let remote = options.remote.as_str();
        let source = &options.source;

        self.gateway
            .fetch(remote)
            .map_err(|source| RecreateError::Fetch {
                remote: remote.to_string(),
                source,
            })?;

        if !self.gateway.remote_branch_exists(remote, source)? {
            self.progress.on_message(&format!(
                "Remote '{}' has no '{}' branch; keeping the local one.",
                remote, source
            ));
            return Ok(());
        }

        let prompt = format!(
            "This will delete your local '{}' branch if it exists and create it afresh from the {} remote. Continue?",
            source, remote
        );
        if !self.confirm.confirm(&prompt, false)? {
            return Err(RecreateError::ConfirmationDeclined(format!(
                "local '{}' kept",
                source
            )));
        }

        self.gateway
            .checkout(&WorkspacePosition::Detached(base_oid.clone()))?;
        if self.gateway.branch_exists(source)? {
            self.gateway.delete_branch(source)?;
        }
        self.gateway
            .create_branch(source, &Ref::remote(remote, source))?;
        tracing::info!(%source, remote, "recreated local branch from remote");
        Ok(())
    }

    /// Make sure resolutions the operator records after a pause are kept.
    fn enable_rerere(&mut self) -> Result<(), RecreateError> {
        if self.gateway.config_bool(RERERE_ENABLED)? != Some(true) {
            self.progress
                .on_message("Enabling git rerere for this repository");
            self.gateway.set_config_bool(RERERE_ENABLED, true)?;
        }
        Ok(())
    }

    // =========================================================================
    // Backup
    // =========================================================================

    fn backup(&mut self, plan: &RecreationPlan) -> Result<(), RecreateError> {
        if self.gateway.branch_exists(&plan.backup)? {
            let prompt = format!(
                "Branch '{}' already exists. Would you like to forcefully destroy it and continue?",
                plan.backup
            );
            if !self.confirm.confirm(&prompt, true)? {
                return Err(RecreateError::ConfirmationDeclined(format!(
                    "stale backup '{}' kept",
                    plan.backup
                )));
            }
            self.gateway.delete_branch(&plan.backup)?;
            tracing::info!(backup = %plan.backup, "destroyed stale backup branch");
        }

        self.gateway.rename_branch(&plan.source, &plan.backup)?;
        Ok(())
    }

    // =========================================================================
    // CreateTarget, ReplayMerges, Finalize
    // =========================================================================

    /// Build the target; `stage` tracks how far it got for recovery.
    fn rebuild(
        &mut self,
        plan: &RecreationPlan,
        stage: &mut RecoveryStage,
    ) -> Result<Rebuilt, GitError> {
        self.progress.on_phase(Phase::CreateTarget);
        self.gateway.checkout_new_branch(&plan.target, &plan.base_oid)?;
        *stage = RecoveryStage::Replaying;

        self.progress.on_phase(Phase::ReplayMerges);
        self.progress.on_recovery(&plan.recovery(), false);

        let total = plan.branches.len();
        let mut replayed = Vec::with_capacity(total);
        for (index, branch) in plan.branches.iter().enumerate() {
            self.progress.on_replay(index, total, branch);
            let outcome = self.replay(branch)?;
            self.progress.on_merge_outcome(branch, &outcome);
            tracing::debug!(%branch, ?outcome, "replayed");

            if outcome.pauses() {
                return Ok(Rebuilt::Paused {
                    branch: branch.clone(),
                    outcome,
                    replayed,
                });
            }
            replayed.push((branch.clone(), outcome));
        }

        *stage = RecoveryStage::Finalizing;
        self.progress.on_phase(Phase::Finalize);
        if plan.target == plan.source {
            self.gateway.delete_branch(&plan.backup)?;
        } else {
            self.gateway.rename_branch(&plan.backup, &plan.source)?;
        }

        Ok(Rebuilt::Done(replayed))
    }

    /// Merge one feature branch into the target, consulting the cache.
    fn replay(&mut self, branch: &str) -> Result<MergeOutcome, GitError> {
        let outcome = match self.gateway.merge(branch, MergeStyle::Replay)? {
            MergeAttempt::Clean => MergeOutcome::Clean,
            MergeAttempt::Conflicted { paths } => {
                let remaining = self.gateway.rerere_remaining()?;
                if paths.is_empty() && remaining.is_empty() {
                    let resolved = self.gateway.rerere_status()?;
                    self.gateway.commit_merge()?;
                    MergeOutcome::AutoResolved { paths: resolved }
                } else {
                    let mut unresolved = paths;
                    for path in remaining {
                        if !unresolved.contains(&path) {
                            unresolved.push(path);
                        }
                    }
                    MergeOutcome::Unresolved { paths: unresolved }
                }
            }
            MergeAttempt::Refused { message } => MergeOutcome::Failed { message },
        };
        Ok(outcome)
    }
}

enum Rebuilt {
    Done(Vec<(String, MergeOutcome)>),
    Paused {
        branch: String,
        outcome: MergeOutcome,
        replayed: Vec<(String, MergeOutcome)>,
    },
}

fn nothing_to_recreate(options: &RecreateOptions, discovery: Discovery) -> RecreateOutcome {
    RecreateOutcome::NothingToRecreate {
        source: options.source.clone(),
        base: options.base.clone(),
        discovery,
    }
}
