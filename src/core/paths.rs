//! core::paths
//!
//! Centralized path routing for the files recreation reads and writes.
//!
//! # Storage Layout
//!
//! Everything lives under the *common* git directory, so linked worktrees
//! share it with the main checkout:
//! - `<common_dir>/recreate-branch/config.toml` - Repository configuration
//! - `<common_dir>/rr-cache/` - git's rerere store, our resolution cache
//!
//! No code outside this module should join these names onto a git dir.
//!
//! # Example
//!
//! ```
//! use recreate_branch::core::paths::RepoPaths;
//! use std::path::PathBuf;
//!
//! let paths = RepoPaths::new(PathBuf::from("/repo/.git"));
//! assert_eq!(paths.repo_config_path(), PathBuf::from("/repo/.git/recreate-branch/config.toml"));
//! assert_eq!(paths.resolution_cache_dir(), PathBuf::from("/repo/.git/rr-cache"));
//! ```

use std::path::PathBuf;

use crate::git::RepoInfo;

/// Directory name for our own metadata under the common git dir.
const TOOL_DIR: &str = "recreate-branch";

/// Path routing for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepoPaths {
    /// Shared git directory holding refs, objects, config and `rr-cache`.
    pub common_dir: PathBuf,
}

impl RepoPaths {
    /// Create paths rooted at a common git dir.
    pub fn new(common_dir: PathBuf) -> Self {
        Self { common_dir }
    }

    /// Create paths from an opened repository's info. Linked worktrees
    /// resolve to the main repository's common dir.
    pub fn from_repo_info(info: &RepoInfo) -> Self {
        Self::new(info.common_dir.clone())
    }

    /// `<common_dir>/recreate-branch`
    pub fn tool_dir(&self) -> PathBuf {
        self.common_dir.join(TOOL_DIR)
    }

    /// `<common_dir>/recreate-branch/config.toml`
    pub fn repo_config_path(&self) -> PathBuf {
        self.tool_dir().join("config.toml")
    }

    /// `<common_dir>/rr-cache`, where git keeps recorded resolutions.
    pub fn resolution_cache_dir(&self) -> PathBuf {
        self.common_dir.join("rr-cache")
    }

    /// Make sure the resolution cache directory exists.
    ///
    /// git only records resolutions once `rr-cache` exists (or rerere is
    /// enabled in config), so training creates it up front.
    pub fn ensure_resolution_cache(&self) -> std::io::Result<PathBuf> {
        let dir = self.resolution_cache_dir();
        std::fs::create_dir_all(&dir)?;
        Ok(dir)
    }
}
