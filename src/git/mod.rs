//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. No other module imports
//! `git2` or spawns the `git` executable.
//!
//! - Reads (ref resolution, history walks, index conflicts, config) go
//!   through `git2`.
//! - Workspace mutations that need git's own machinery (merge with rerere,
//!   rerere itself, `name-rev`, fetch with the user's credentials) run the
//!   `git` executable inside the repository's working directory.
//!
//! The engine depends on the [`Gateway`] trait, not on [`Git`] directly.
//!
//! # Example
//!
//! ```ignore
//! use recreate_branch::core::types::Ref;
//! use recreate_branch::git::{Gateway, Git};
//! use std::path::Path;
//!
//! let git = Git::open(Path::new("."))?;
//! let tip = git.resolve(&Ref::revision("main"))?;
//! ```

mod gateway;
mod interface;

pub use gateway::{Gateway, MergeAttempt, MergeStyle, RevRange, WorkspacePosition};
pub use interface::{Git, GitError, GitState, RepoInfo, WorktreeStatus};
