//! git::interface
//!
//! The `Git` handle: reads through `git2`, workspace mutations through the
//! `git` executable run in the repository's working directory.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use super::gateway::{Gateway, MergeAttempt, MergeStyle, RevRange, WorkspacePosition};
use crate::core::paths::RepoPaths;
use crate::core::types::{BranchName, MergeCommit, Oid, Ref, RefKind, TypeError};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// Requested ref does not exist.
    #[error("ref not found: {refname}")]
    RefNotFound {
        /// The ref that was not found
        refname: String,
    },

    /// Object not found in repository.
    #[error("object not found: {oid}")]
    ObjectNotFound {
        /// The OID that was not found
        oid: String,
    },

    /// Invalid object id format.
    #[error("invalid object id: {oid}")]
    InvalidOid {
        /// The invalid OID string
        oid: String,
    },

    /// Invalid ref name format.
    #[error("invalid ref name: {message}")]
    InvalidRefName {
        /// Description of the problem
        message: String,
    },

    /// A `git` subprocess exited unsuccessfully.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line, without the leading `git`
        command: String,
        /// What git printed on stderr
        stderr: String,
    },

    /// The `git` executable could not be started.
    #[error("failed to run git: {source}")]
    Spawn {
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Permission or filesystem error.
    #[error("repository access error: {message}")]
    AccessError {
        /// Description of the error
        message: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

impl GitError {
    /// Create a GitError from a git2::Error with richer context.
    fn from_git2(err: git2::Error, context: &str) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => {
                if context.starts_with("refs/") || context.contains("ref") {
                    GitError::RefNotFound {
                        refname: context.to_string(),
                    }
                } else {
                    GitError::ObjectNotFound {
                        oid: context.to_string(),
                    }
                }
            }
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: context.to_string(),
            },
            git2::ErrorCode::Locked => GitError::AccessError {
                message: format!("repository is locked: {}", err.message()),
            },
            _ => GitError::Internal {
                message: format!("{}: {}", context, err.message()),
            },
        }
    }
}

impl From<git2::Error> for GitError {
    fn from(err: git2::Error) -> Self {
        match err.code() {
            git2::ErrorCode::NotFound => GitError::RefNotFound {
                refname: err.message().to_string(),
            },
            git2::ErrorCode::InvalidSpec => GitError::InvalidOid {
                oid: err.message().to_string(),
            },
            _ => GitError::Internal {
                message: err.message().to_string(),
            },
        }
    }
}

impl From<TypeError> for GitError {
    fn from(err: TypeError) -> Self {
        match err {
            TypeError::InvalidOid(msg) => GitError::InvalidOid { oid: msg },
            TypeError::InvalidBranchName(msg) => GitError::InvalidRefName { message: msg },
        }
    }
}

/// Information about a Git repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoInfo {
    /// Path to .git directory (per worktree)
    pub git_dir: PathBuf,
    /// Path to the shared git directory
    pub common_dir: PathBuf,
    /// Path to working directory
    pub work_dir: PathBuf,
}

/// State of in-progress Git operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GitState {
    /// No operation in progress.
    Clean,
    /// Rebase in progress.
    Rebase,
    /// Merge in progress.
    Merge,
    /// Cherry-pick in progress.
    CherryPick,
    /// Revert in progress.
    Revert,
    /// Bisect in progress.
    Bisect,
    /// Apply mailbox in progress.
    ApplyMailbox,
}

impl GitState {
    /// Check if any operation is in progress.
    ///
    /// # Example
    ///
    /// ```
    /// use recreate_branch::git::GitState;
    ///
    /// assert!(!GitState::Clean.is_in_progress());
    /// assert!(GitState::Merge.is_in_progress());
    /// ```
    pub fn is_in_progress(&self) -> bool {
        !matches!(self, GitState::Clean)
    }

    /// Get a human-readable description of the state.
    pub fn description(&self) -> &'static str {
        match self {
            GitState::Clean => "clean",
            GitState::Rebase => "rebase",
            GitState::Merge => "merge",
            GitState::CherryPick => "cherry-pick",
            GitState::Revert => "revert",
            GitState::Bisect => "bisect",
            GitState::ApplyMailbox => "apply-mailbox",
        }
    }
}

impl std::fmt::Display for GitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Summary of working tree status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorktreeStatus {
    /// Number of staged changes
    pub staged: usize,
    /// Number of unstaged changes to tracked files
    pub unstaged: usize,
    /// Whether there are unresolved conflicts
    pub has_conflicts: bool,
}

impl WorktreeStatus {
    /// Check if the worktree is clean (untracked files are ignored).
    pub fn is_clean(&self) -> bool {
        self.staged == 0 && self.unstaged == 0 && !self.has_conflicts
    }
}

/// The Git interface.
///
/// Bound to one working directory: every subprocess runs there and every
/// read goes through the repository discovered from it.
pub struct Git {
    /// The underlying git2 repository
    repo: git2::Repository,
    /// Working directory git commands run in
    work_dir: PathBuf,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("path", &self.repo.path())
            .field("work_dir", &self.work_dir)
            .finish()
    }
}

impl Git {
    // =========================================================================
    // Repository Opening and Info
    // =========================================================================

    /// Open a repository at the given path.
    ///
    /// Uses `git2::Repository::discover`, so `path` can be any directory
    /// within the repository.
    ///
    /// # Errors
    ///
    /// - [`GitError::NotARepo`] if no repository is found
    /// - [`GitError::BareRepo`] if the repository has no working directory
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|_| GitError::NotARepo {
            path: path.to_path_buf(),
        })?;

        let work_dir = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();

        Ok(Self { repo, work_dir })
    }

    /// Get repository information.
    pub fn info(&self) -> RepoInfo {
        RepoInfo {
            git_dir: self.repo.path().to_path_buf(),
            common_dir: self.repo.commondir().to_path_buf(),
            work_dir: self.work_dir.clone(),
        }
    }

    /// Storage paths for this repository.
    pub fn paths(&self) -> RepoPaths {
        RepoPaths::from_repo_info(&self.info())
    }

    /// The working directory commands run in.
    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    // =========================================================================
    // Subprocess
    // =========================================================================

    /// Run `git <args>` in the working directory and return its stdout.
    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let output = self.output(args)?;
        if output.status.success() {
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        } else {
            Err(command_failed(args, &output))
        }
    }

    /// Run `git <args>` and hand back the raw output whatever the exit status.
    fn output(&self, args: &[&str]) -> Result<std::process::Output, GitError> {
        tracing::debug!(command = %args.join(" "), "git");
        let output = Command::new("git")
            .args(args)
            .current_dir(&self.work_dir)
            .env("GIT_MERGE_AUTOEDIT", "no")
            .output()
            .map_err(|source| GitError::Spawn { source })?;
        if !output.status.success() {
            tracing::debug!(
                command = %args.join(" "),
                status = ?output.status.code(),
                stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                "git exited unsuccessfully"
            );
        }
        Ok(output)
    }

    // =========================================================================
    // State Detection
    // =========================================================================

    /// Get working tree status summary, ignoring untracked files.
    pub fn worktree_status(&self) -> Result<WorktreeStatus, GitError> {
        let mut opts = git2::StatusOptions::new();
        opts.include_untracked(false).include_ignored(false);

        let statuses = self
            .repo
            .statuses(Some(&mut opts))
            .map_err(|e| GitError::from_git2(e, "status"))?;

        let mut result = WorktreeStatus::default();

        for entry in statuses.iter() {
            let status = entry.status();

            if status.is_conflicted() {
                result.has_conflicts = true;
            }

            if status.is_index_new()
                || status.is_index_modified()
                || status.is_index_deleted()
                || status.is_index_renamed()
                || status.is_index_typechange()
            {
                result.staged += 1;
            }

            if status.is_wt_modified()
                || status.is_wt_deleted()
                || status.is_wt_renamed()
                || status.is_wt_typechange()
            {
                result.unstaged += 1;
            }
        }

        Ok(result)
    }

    /// Paths with unmerged entries in the index.
    pub fn conflicted_paths(&self) -> Result<Vec<String>, GitError> {
        let mut index = self.repo.index()?;
        index.read(true)?;

        let mut paths = Vec::new();
        for conflict in index.conflicts()? {
            let conflict = conflict?;
            let entry = conflict.our.or(conflict.their).or(conflict.ancestor);
            if let Some(entry) = entry {
                let path = String::from_utf8_lossy(&entry.path).into_owned();
                if !paths.contains(&path) {
                    paths.push(path);
                }
            }
        }
        Ok(paths)
    }

    fn to_git2_oid(oid: &Oid) -> Result<git2::Oid, GitError> {
        git2::Oid::from_str(oid.as_str()).map_err(|e| GitError::from_git2(e, oid.as_str()))
    }

    fn from_git2_oid(oid: git2::Oid) -> Result<Oid, GitError> {
        Ok(Oid::new(oid.to_string())?)
    }
}

impl Gateway for Git {
    // =========================================================================
    // Ref Resolution
    // =========================================================================

    fn resolve(&self, r: &Ref) -> Result<Option<Oid>, GitError> {
        let spec = r.full_name();
        let object = match self.repo.revparse_single(&spec) {
            Ok(object) => object,
            Err(e)
                if matches!(
                    e.code(),
                    git2::ErrorCode::NotFound
                        | git2::ErrorCode::InvalidSpec
                        | git2::ErrorCode::UnbornBranch
                ) =>
            {
                return Ok(None)
            }
            Err(e) => return Err(GitError::from_git2(e, &spec)),
        };

        match object.peel_to_commit() {
            Ok(commit) => Ok(Some(Self::from_git2_oid(commit.id())?)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) if e.class() == git2::ErrorClass::Object => Ok(None),
            Err(e) => Err(GitError::from_git2(e, &spec)),
        }
    }

    fn branch_exists(&self, name: &BranchName) -> Result<bool, GitError> {
        Ok(self
            .repo
            .find_reference(&Ref::local(name).full_name())
            .is_ok())
    }

    fn remote_branch_exists(&self, remote: &str, name: &BranchName) -> Result<bool, GitError> {
        Ok(self
            .repo
            .find_reference(&Ref::remote(remote, name).full_name())
            .is_ok())
    }

    // =========================================================================
    // History
    // =========================================================================

    fn merge_commits(&self, range: &RevRange) -> Result<Vec<MergeCommit>, GitError> {
        let mut walk = self.repo.revwalk()?;
        walk.set_sorting(git2::Sort::TOPOLOGICAL | git2::Sort::REVERSE)?;

        match range {
            RevRange::Symmetric { from, to } => {
                let from = Self::to_git2_oid(from)?;
                let to = Self::to_git2_oid(to)?;
                walk.push(from)?;
                walk.push(to)?;
                match self.repo.merge_bases(from, to) {
                    Ok(bases) => {
                        for base in bases.iter() {
                            walk.hide(*base)?;
                        }
                    }
                    Err(e) if e.code() == git2::ErrorCode::NotFound => {}
                    Err(e) => return Err(GitError::from_git2(e, "merge-base")),
                }
            }
            RevRange::Exclusive { from, to } => {
                walk.push(Self::to_git2_oid(to)?)?;
                walk.hide(Self::to_git2_oid(from)?)?;
            }
        }

        let mut merges = Vec::new();
        for id in walk {
            let commit = self.repo.find_commit(id?)?;
            if commit.parent_count() < 2 {
                continue;
            }
            let parents = commit
                .parent_ids()
                .map(Self::from_git2_oid)
                .collect::<Result<Vec<_>, _>>()?;
            merges.push(MergeCommit {
                oid: Self::from_git2_oid(commit.id())?,
                parents,
            });
        }

        tracing::debug!(%range, count = merges.len(), "enumerated merge commits");
        Ok(merges)
    }

    fn name_rev(&self, oid: &Oid) -> Result<Option<String>, GitError> {
        let out = self.run(&["name-rev", "--name-only", oid.as_str()])?;
        let name = out.trim();
        if name.is_empty() || name == "undefined" {
            Ok(None)
        } else {
            Ok(Some(name.to_string()))
        }
    }

    // =========================================================================
    // Workspace
    // =========================================================================

    fn position(&self) -> Result<WorkspacePosition, GitError> {
        let head = self
            .repo
            .head()
            .map_err(|e| GitError::from_git2(e, "HEAD ref"))?;

        if head.is_branch() {
            if let Some(name) = head.shorthand() {
                return Ok(WorkspacePosition::Branch(BranchName::new(name)?));
            }
        }

        let commit = head
            .peel_to_commit()
            .map_err(|e| GitError::from_git2(e, "HEAD ref"))?;
        Ok(WorkspacePosition::Detached(Self::from_git2_oid(commit.id())?))
    }

    fn checkout(&self, position: &WorkspacePosition) -> Result<(), GitError> {
        match position {
            WorkspacePosition::Branch(name) => self.run(&["checkout", "-q", name.as_str()])?,
            WorkspacePosition::Detached(oid) => {
                self.run(&["checkout", "-q", "--detach", oid.as_str()])?
            }
        };
        Ok(())
    }

    fn checkout_new_branch(&self, name: &BranchName, start: &Oid) -> Result<(), GitError> {
        self.run(&["checkout", "-q", "-b", name.as_str(), start.as_str()])?;
        Ok(())
    }

    fn checkout_tree(&self, oid: &Oid) -> Result<(), GitError> {
        self.run(&["checkout", "-q", oid.as_str(), "--", "."])?;
        Ok(())
    }

    fn reset_hard(&self) -> Result<(), GitError> {
        self.run(&["reset", "-q", "--hard"])?;
        Ok(())
    }

    fn state(&self) -> GitState {
        match self.repo.state() {
            git2::RepositoryState::Clean => GitState::Clean,
            git2::RepositoryState::Rebase
            | git2::RepositoryState::RebaseInteractive
            | git2::RepositoryState::RebaseMerge => GitState::Rebase,
            git2::RepositoryState::Merge => GitState::Merge,
            git2::RepositoryState::CherryPick | git2::RepositoryState::CherryPickSequence => {
                GitState::CherryPick
            }
            git2::RepositoryState::Revert | git2::RepositoryState::RevertSequence => {
                GitState::Revert
            }
            git2::RepositoryState::Bisect => GitState::Bisect,
            git2::RepositoryState::ApplyMailbox | git2::RepositoryState::ApplyMailboxOrRebase => {
                GitState::ApplyMailbox
            }
        }
    }

    fn is_worktree_clean(&self) -> Result<bool, GitError> {
        Ok(self.worktree_status()?.is_clean())
    }

    // =========================================================================
    // Merging and the resolution cache
    // =========================================================================

    fn merge(&self, rev: &str, style: MergeStyle) -> Result<MergeAttempt, GitError> {
        let args: Vec<&str> = match style {
            MergeStyle::Trial => vec![
                "-c",
                "rerere.enabled=true",
                "merge",
                "-q",
                "--no-commit",
                "--no-ff",
                rev,
            ],
            MergeStyle::Replay => vec![
                "-c",
                "rerere.enabled=true",
                "-c",
                "rerere.autoupdate=true",
                "merge",
                "-q",
                "--no-ff",
                "--no-edit",
                rev,
            ],
        };

        let output = self.output(&args)?;
        if output.status.success() {
            return Ok(MergeAttempt::Clean);
        }

        if self.state() == GitState::Merge {
            return Ok(MergeAttempt::Conflicted {
                paths: self.conflicted_paths()?,
            });
        }

        let mut message = String::from_utf8_lossy(&output.stderr).trim().to_string();
        if message.is_empty() {
            message = String::from_utf8_lossy(&output.stdout).trim().to_string();
        }
        Ok(MergeAttempt::Refused { message })
    }

    fn abort_merge(&self) -> Result<(), GitError> {
        self.run(&["merge", "--abort"])?;
        Ok(())
    }

    fn commit_merge(&self) -> Result<Oid, GitError> {
        self.run(&["commit", "-q", "-a", "--no-edit"])?;
        let head = self.repo.head()?.peel_to_commit()?;
        Self::from_git2_oid(head.id())
    }

    fn rerere_status(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["-c", "rerere.enabled=true", "rerere", "status"])?;
        Ok(lines(&out))
    }

    fn rerere_remaining(&self) -> Result<Vec<String>, GitError> {
        let out = self.run(&["-c", "rerere.enabled=true", "rerere", "remaining"])?;
        Ok(lines(&out))
    }

    fn rerere_record(&self) -> Result<(), GitError> {
        self.run(&["-c", "rerere.enabled=true", "rerere"])?;
        Ok(())
    }

    fn resolution_cache_entries(&self) -> Result<Vec<String>, GitError> {
        let dir = self.paths().resolution_cache_dir();
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(GitError::AccessError {
                    message: format!("{}: {}", dir.display(), e),
                })
            }
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| GitError::AccessError {
                message: format!("{}: {}", dir.display(), e),
            })?;
            if entry.path().is_dir() {
                names.push(entry.file_name().to_string_lossy().into_owned());
            }
        }
        names.sort();
        Ok(names)
    }

    fn ensure_resolution_cache(&self) -> Result<(), GitError> {
        let paths = self.paths();
        paths
            .ensure_resolution_cache()
            .map_err(|e| GitError::AccessError {
                message: format!("{}: {}", paths.resolution_cache_dir().display(), e),
            })?;
        Ok(())
    }

    // =========================================================================
    // Branches
    // =========================================================================

    fn create_branch(&self, name: &BranchName, start: &Ref) -> Result<(), GitError> {
        let start_name = start.full_name();
        let mut args = vec!["branch"];
        if matches!(start.kind, RefKind::RemoteBranch { .. }) {
            args.push("--track");
        }
        args.push(name.as_str());
        args.push(&start_name);
        self.run(&args)?;
        Ok(())
    }

    fn rename_branch(&self, from: &BranchName, to: &BranchName) -> Result<(), GitError> {
        self.run(&["branch", "-m", from.as_str(), to.as_str()])?;
        Ok(())
    }

    fn delete_branch(&self, name: &BranchName) -> Result<(), GitError> {
        self.run(&["branch", "-D", name.as_str()])?;
        Ok(())
    }

    // =========================================================================
    // Config and remotes
    // =========================================================================

    fn config_bool(&self, key: &str) -> Result<Option<bool>, GitError> {
        let config = self.repo.config()?;
        match config.get_bool(key) {
            Ok(value) => Ok(Some(value)),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::from_git2(e, key)),
        }
    }

    fn set_config_bool(&self, key: &str, value: bool) -> Result<(), GitError> {
        let mut config = self
            .repo
            .config()?
            .open_level(git2::ConfigLevel::Local)?;
        config.set_bool(key, value)?;
        Ok(())
    }

    fn fetch(&self, remote: &str) -> Result<(), GitError> {
        self.run(&["fetch", "-q", remote])?;
        Ok(())
    }
}

fn command_failed(args: &[&str], output: &std::process::Output) -> GitError {
    let mut stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    if stderr.is_empty() {
        stderr = format!("exit status {}", output.status);
    }
    GitError::CommandFailed {
        command: format!("git {}", args.join(" ")),
        stderr,
    }
}

fn lines(out: &str) -> Vec<String> {
    out.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(String::from)
        .collect()
}
