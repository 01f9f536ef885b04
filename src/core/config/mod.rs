//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Two configuration scopes:
//! - **Global**: User-level settings
//! - **Repo**: Repository-level overrides
//!
//! # Precedence
//!
//! Configuration values are resolved in this order (later overrides earlier):
//! 1. Default values
//! 2. Global config file
//! 3. Repo config file
//! 4. CLI flags (not handled here)
//!
//! # Global Config Locations
//!
//! Searched in order:
//! 1. `$RECREATE_BRANCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/recreate-branch/config.toml`
//! 3. `~/.recreate-branch/config.toml`
//!
//! # Example
//!
//! ```no_run
//! use recreate_branch::core::config::Config;
//!
//! let config = Config::load(None).unwrap();
//! println!("Base: {}", config.base());
//! println!("Remote: {}", config.remote());
//! ```

pub mod schema;

pub use schema::{GlobalConfig, RepoConfig};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use crate::core::naming::DEFAULT_BACKUP_PREFIX;
use crate::core::paths::RepoPaths;

/// Environment variable naming an explicit global config file.
pub const CONFIG_ENV: &str = "RECREATE_BRANCH_CONFIG";

/// Base ref used when neither config nor flags name one.
pub const DEFAULT_BASE: &str = "master";

/// Remote used when neither config nor flags name one.
pub const DEFAULT_REMOTE: &str = "origin";

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("invalid config value: {0}")]
    InvalidValue(String),
}

/// Merged configuration from all sources.
///
/// Accessors apply precedence rules. Repo config overrides global config.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Global configuration
    pub global: GlobalConfig,
    /// Repository configuration (if present)
    pub repo: Option<RepoConfig>,
    global_path: Option<PathBuf>,
    repo_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from default locations.
    ///
    /// If `paths` is provided, also loads the repository's config.
    ///
    /// # Errors
    ///
    /// Returns an error if config files exist but cannot be parsed or hold
    /// invalid values. Missing config files are not an error.
    pub fn load(paths: Option<&RepoPaths>) -> Result<Self, ConfigError> {
        let global = Self::find_global();
        let repo = paths.map(RepoPaths::repo_config_path);
        Self::load_from(global.as_deref(), repo.as_deref())
    }

    /// Load configuration from explicit file locations.
    ///
    /// Paths that do not exist are skipped.
    pub fn load_from(global: Option<&Path>, repo: Option<&Path>) -> Result<Self, ConfigError> {
        let global_path = global.filter(|p| p.exists()).map(Path::to_path_buf);
        let repo_path = repo.filter(|p| p.exists()).map(Path::to_path_buf);

        let global: GlobalConfig = match &global_path {
            Some(path) => read_toml(path)?,
            None => GlobalConfig::default(),
        };
        let repo: Option<RepoConfig> = repo_path.as_deref().map(read_toml).transpose()?;

        global.validate()?;
        if let Some(ref r) = repo {
            r.validate()?;
        }

        Ok(Config {
            global,
            repo,
            global_path,
            repo_path,
        })
    }

    /// Configuration that was not read from disk.
    pub fn new(global: GlobalConfig, repo: Option<RepoConfig>) -> Self {
        Config {
            global,
            repo,
            ..Default::default()
        }
    }

    /// First existing global config file, if any.
    fn find_global() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(CONFIG_ENV) {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("recreate-branch/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        dirs::home_dir()
            .map(|home| home.join(".recreate-branch/config.toml"))
            .filter(|path| path.exists())
    }

    // =========================================================================
    // Accessor methods with precedence
    // =========================================================================

    /// Base ref. Defaults to "master".
    pub fn base(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.base.as_deref())
            .unwrap_or(DEFAULT_BASE)
    }

    /// Remote name. Defaults to "origin".
    pub fn remote(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.remote.as_deref())
            .unwrap_or(DEFAULT_REMOTE)
    }

    /// Backup branch prefix; repo beats global beats `BPF-PREFIX`.
    pub fn backup_prefix(&self) -> &str {
        self.repo
            .as_ref()
            .and_then(|r| r.backup_prefix.as_deref())
            .or(self.global.backup_prefix.as_deref())
            .unwrap_or(DEFAULT_BACKUP_PREFIX)
    }

    /// Extra integration branches to train from.
    pub fn integration(&self) -> &[String] {
        self.repo
            .as_ref()
            .and_then(|r| r.integration.as_deref())
            .unwrap_or(&[])
    }

    /// Branches excluded from replay.
    pub fn exclude(&self) -> &[String] {
        self.repo
            .as_ref()
            .and_then(|r| r.exclude.as_deref())
            .unwrap_or(&[])
    }

    /// Check if interactive mode is enabled by default.
    ///
    /// Defaults to `true` if not configured.
    pub fn interactive(&self) -> bool {
        self.global.interactive.unwrap_or(true)
    }

    /// Check if the resolution cache is trained before replay.
    ///
    /// Defaults to `true` if not configured.
    pub fn prefill_cache(&self) -> bool {
        self.global.prefill_cache.unwrap_or(true)
    }

    /// Get the path to the loaded global config file.
    pub fn global_config_loaded_from(&self) -> Option<&Path> {
        self.global_path.as_deref()
    }

    /// Get the path to the loaded repo config file.
    pub fn repo_config_loaded_from(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }
}

fn read_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}
