//! engine
//!
//! Rebuilds an integration branch from the merges that built it.
//!
//! # Architecture
//!
//! - [`analyze`] - Merge Graph Analyzer: ordered feature branches of a branch
//! - [`train`] - Resolution Cache Trainer: seeds rerere from history
//! - [`recreate`] - Branch Recreation Engine: the backup/rebuild/replay state machine
//! - [`recovery`] - The command sequence that undoes an attempt
//!
//! All repository access goes through [`crate::git::Gateway`]; operator
//! interaction goes through [`crate::ui::prompts::Confirm`] and [`Progress`].
//!
//! # Example
//!
//! ```ignore
//! use recreate_branch::engine::{recreate::{RecreateOptions, Recreator}, NoProgress};
//! use recreate_branch::ui::prompts::AlwaysYes;
//!
//! let mut confirm = AlwaysYes;
//! let outcome = Recreator::new(&git, &mut confirm, &NoProgress)
//!     .run(&RecreateOptions::new(source))?;
//! ```

pub mod analyze;
pub mod recovery;
pub mod recreate;
pub mod train;

pub use analyze::{discover_feature_branches, Discovery, FeatureBranchList};
pub use recovery::{RecoveryPlan, RecoveryStage};
pub use recreate::{
    MergeOutcome, RecreateError, RecreateOptions, RecreateOutcome, RecreationPlan, Recreator,
    ValidationError,
};
pub use train::{train, TrainingReport};

use crate::core::types::{BranchName, MergeCommit};

/// Steps of a recreation, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Validate,
    Analyze,
    Train,
    Backup,
    CreateTarget,
    ReplayMerges,
    Finalize,
}

/// Receives progress while the engine runs.
///
/// Every method has a no-op default, so implementors pick what they show.
pub trait Progress {
    /// A new phase starts.
    fn on_phase(&self, _phase: Phase) {}

    /// Free-form status line.
    fn on_message(&self, _message: &str) {}

    /// Training starts on a learning branch with `merges` merge commits.
    fn on_training_branch(&self, _branch: &BranchName, _merges: usize) {}

    /// A historical resolution was taught to the cache.
    fn on_learned(&self, _merge: &MergeCommit) {}

    /// Training finished.
    fn on_training_done(&self, _report: &TrainingReport) {}

    /// The plan is about to be confirmed.
    fn on_plan(&self, _plan: &RecreationPlan) {}

    /// Replaying branch `index` (0-based) of `total`.
    fn on_replay(&self, _index: usize, _total: usize, _branch: &str) {}

    /// A replay merge finished.
    fn on_merge_outcome(&self, _branch: &str, _outcome: &MergeOutcome) {}

    /// The way back. `paused` is false for the copy printed before replay.
    fn on_recovery(&self, _recovery: &RecoveryPlan, _paused: bool) {}
}

/// Discards all progress.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl Progress for NoProgress {}
