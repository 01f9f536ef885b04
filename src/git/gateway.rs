//! git::gateway
//!
//! The version-control collaborator the engine drives.
//!
//! Every engine step talks to git through [`Gateway`]. The trait is bound to
//! one working directory at construction time, so no call depends on the
//! process's current directory.

use std::fmt;

use crate::core::types::{BranchName, MergeCommit, Oid, Ref};

use super::{GitError, GitState};

/// A range of history to enumerate merges in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevRange {
    /// `from...to`: reachable from either tip but not from both.
    Symmetric { from: Oid, to: Oid },
    /// `from..to`: reachable from `to` but not from `from`.
    Exclusive { from: Oid, to: Oid },
}

impl fmt::Display for RevRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RevRange::Symmetric { from, to } => write!(f, "{}...{}", from.short(7), to.short(7)),
            RevRange::Exclusive { from, to } => write!(f, "{}..{}", from.short(7), to.short(7)),
        }
    }
}

/// Where the workspace is checked out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspacePosition {
    /// On a named branch.
    Branch(BranchName),
    /// Detached at a commit.
    Detached(Oid),
}

impl fmt::Display for WorkspacePosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkspacePosition::Branch(name) => write!(f, "branch '{}'", name),
            WorkspacePosition::Detached(oid) => write!(f, "detached at {}", oid.short(7)),
        }
    }
}

/// How a merge is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStyle {
    /// Throwaway attempt: never commits, rerere forced on.
    Trial,
    /// Real replay: non fast-forward, default message, commits when clean.
    /// Paths rerere resolves from the cache are staged.
    Replay,
}

/// What a merge attempt left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MergeAttempt {
    /// Merged without conflicts.
    Clean,
    /// Stopped in merge state.
    Conflicted {
        /// Paths still unmerged in the index (possibly none, once rerere
        /// has staged its resolutions).
        paths: Vec<String>,
    },
    /// git refused to merge and no merge is in progress.
    Refused {
        /// git's explanation.
        message: String,
    },
}

/// Operations recreation needs from git.
pub trait Gateway {
    // Ref resolution

    /// Resolve a ref to the commit it names, or `None` if it does not resolve.
    fn resolve(&self, r: &Ref) -> Result<Option<Oid>, GitError>;

    /// Whether `refs/heads/<name>` exists.
    fn branch_exists(&self, name: &BranchName) -> Result<bool, GitError> {
        Ok(self.resolve(&Ref::local(name))?.is_some())
    }

    /// Whether `refs/remotes/<remote>/<name>` exists.
    fn remote_branch_exists(&self, remote: &str, name: &BranchName) -> Result<bool, GitError> {
        Ok(self.resolve(&Ref::remote(remote, name))?.is_some())
    }

    // History

    /// Merge commits in `range`, parents before children.
    fn merge_commits(&self, range: &RevRange) -> Result<Vec<MergeCommit>, GitError>;

    /// Nearest named ancestor plus offset (`feature~2`), `None` if unnamed.
    fn name_rev(&self, oid: &Oid) -> Result<Option<String>, GitError>;

    // Workspace

    /// Current workspace position.
    fn position(&self) -> Result<WorkspacePosition, GitError>;

    /// Move the workspace to a position.
    fn checkout(&self, position: &WorkspacePosition) -> Result<(), GitError>;

    /// Create `name` at `start` and check it out.
    fn checkout_new_branch(&self, name: &BranchName, start: &Oid) -> Result<(), GitError>;

    /// Overwrite every tracked path with its content in `oid`'s tree.
    fn checkout_tree(&self, oid: &Oid) -> Result<(), GitError>;

    /// Discard index and worktree changes, clearing any merge state.
    fn reset_hard(&self) -> Result<(), GitError>;

    /// In-progress operation, if any.
    fn state(&self) -> GitState;

    /// No staged or unstaged changes to tracked files.
    fn is_worktree_clean(&self) -> Result<bool, GitError>;

    // Merging and the resolution cache

    /// Merge `rev` into the current position.
    fn merge(&self, rev: &str, style: MergeStyle) -> Result<MergeAttempt, GitError>;

    /// Abort an in-progress merge.
    fn abort_merge(&self) -> Result<(), GitError>;

    /// Commit the current merge with its default message, staging tracked files.
    fn commit_merge(&self) -> Result<Oid, GitError>;

    /// Paths rerere recorded a preimage for in the current conflict.
    fn rerere_status(&self) -> Result<Vec<String>, GitError>;

    /// Conflicted paths rerere could not resolve from the cache.
    fn rerere_remaining(&self) -> Result<Vec<String>, GitError>;

    /// Record resolutions for conflicted paths that no longer carry markers.
    fn rerere_record(&self) -> Result<(), GitError>;

    /// Conflict signatures currently stored in the resolution cache.
    fn resolution_cache_entries(&self) -> Result<Vec<String>, GitError>;

    /// Create the resolution cache storage if missing.
    fn ensure_resolution_cache(&self) -> Result<(), GitError>;

    // Branches

    /// Create `name` at `start` without checking it out.
    fn create_branch(&self, name: &BranchName, start: &Ref) -> Result<(), GitError>;

    /// Rename a branch; fails if `to` already exists.
    fn rename_branch(&self, from: &BranchName, to: &BranchName) -> Result<(), GitError>;

    /// Delete a branch regardless of merge status.
    fn delete_branch(&self, name: &BranchName) -> Result<(), GitError>;

    // Config and remotes

    /// Read a boolean from the repository configuration.
    fn config_bool(&self, key: &str) -> Result<Option<bool>, GitError>;

    /// Write a boolean to the repository-local configuration.
    fn set_config_bool(&self, key: &str, value: bool) -> Result<(), GitError>;

    /// Fetch from a named remote.
    fn fetch(&self, remote: &str) -> Result<(), GitError>;
}
