//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Global Config
//!
//! Located at (in order of precedence):
//! 1. `$RECREATE_BRANCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/recreate-branch/config.toml`
//! 3. `~/.recreate-branch/config.toml`
//!
//! # Repo Config
//!
//! Located at `<common git dir>/recreate-branch/config.toml`.
//!
//! # Validation
//!
//! Values are validated after parsing: branch names must be valid refs and
//! the backup prefix must produce valid backup branch names.

use serde::{Deserialize, Serialize};

use super::ConfigError;
use crate::core::naming::backup_name;
use crate::core::types::BranchName;

/// Global configuration (user scope).
///
/// # Example
///
/// ```toml
/// interactive = true
/// prefill_cache = true
/// backup_prefix = "BPF-PREFIX"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct GlobalConfig {
    /// Ask before destructive steps
    pub interactive: Option<bool>,

    /// Train the resolution cache from history before replaying
    pub prefill_cache: Option<bool>,

    /// Prefix for the temporary backup branch
    pub backup_prefix: Option<String>,
}

impl GlobalConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_prefix(self.backup_prefix.as_deref())
    }
}

/// Repository configuration.
///
/// # Example
///
/// ```toml
/// base = "main"
/// remote = "upstream"
/// integration = ["next", "staging"]
/// exclude = ["wip-experiment"]
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct RepoConfig {
    /// Base ref the integration branch is rebuilt from
    pub base: Option<String>,

    /// Remote used by discard-and-refetch (default: "origin")
    pub remote: Option<String>,

    /// Prefix for the temporary backup branch
    pub backup_prefix: Option<String>,

    /// Extra integration branches whose merges train the cache
    pub integration: Option<Vec<String>>,

    /// Branches never replayed
    pub exclude: Option<Vec<String>>,
}

impl RepoConfig {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(base) = &self.base {
            if base.trim().is_empty() {
                return Err(ConfigError::InvalidValue("base cannot be empty".to_string()));
            }
        }

        if let Some(remote) = &self.remote {
            if remote.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "remote cannot be empty".to_string(),
                ));
            }
        }

        for name in self.integration.iter().flatten() {
            BranchName::new(name).map_err(|e| {
                ConfigError::InvalidValue(format!("invalid integration branch name: {}", e))
            })?;
        }

        validate_prefix(self.backup_prefix.as_deref())
    }
}

fn validate_prefix(prefix: Option<&str>) -> Result<(), ConfigError> {
    let Some(prefix) = prefix else {
        return Ok(());
    };
    let probe = BranchName::new("probe")
        .map_err(|e| ConfigError::InvalidValue(e.to_string()))?;
    backup_name(prefix, &probe).map_err(|e| {
        ConfigError::InvalidValue(format!("invalid backup prefix '{}': {}", prefix, e))
    })?;
    Ok(())
}
