//! core::naming
//!
//! Branch naming rules used while reading merge history.
//!
//! # Features
//!
//! - Canonicalize `name-rev` output (`feature~3` -> `feature`)
//! - Recognize synthetic remote HEAD names (`remotes/origin/HEAD`)
//! - Exclusion matching (case-insensitive, remote-prefix stripped)
//! - Backup branch naming

use std::sync::LazyLock;

use regex::Regex;

use crate::core::types::{BranchName, TypeError};

/// Default prefix for the temporary backup branch.
pub const DEFAULT_BACKUP_PREFIX: &str = "BPF-PREFIX";

/// Everything up to the last `~` is the name, the rest is an offset.
static OFFSET_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)~.*$").expect("offset pattern is valid"));

/// `remotes/<remote>/<branch>`
static REMOTE_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^remotes/[^/]+/(.+)$").expect("remote pattern is valid"));

/// `remotes/<remote>/HEAD`, tolerating the singular `remote/` spelling.
static REMOTE_HEAD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^remotes?/[^/]+/HEAD\b").expect("remote HEAD pattern is valid"));

/// Strip a trailing offset suffix from a `name-rev` style name.
///
/// Only the part after the last `~` is removed, so a name that still carries
/// a `^N` step after stripping keeps it.
///
/// # Example
///
/// ```
/// use recreate_branch::core::naming::strip_offset;
///
/// assert_eq!(strip_offset("feature-a~2"), "feature-a");
/// assert_eq!(strip_offset("feature-a"), "feature-a");
/// assert_eq!(strip_offset("main~3^2~1"), "main~3^2");
/// ```
pub fn strip_offset(name: &str) -> &str {
    OFFSET_SUFFIX
        .captures(name)
        .and_then(|c| c.get(1))
        .map_or(name, |m| m.as_str())
}

/// Strip a leading `remotes/<remote>/` prefix.
///
/// # Example
///
/// ```
/// use recreate_branch::core::naming::strip_remote_prefix;
///
/// assert_eq!(strip_remote_prefix("remotes/origin/feature-x"), "feature-x");
/// assert_eq!(strip_remote_prefix("feature-x"), "feature-x");
/// ```
pub fn strip_remote_prefix(name: &str) -> &str {
    REMOTE_PREFIX
        .captures(name)
        .and_then(|c| c.get(1))
        .map_or(name, |m| m.as_str())
}

/// Whether a name is the synthetic symbolic HEAD of a remote.
pub fn is_remote_head(name: &str) -> bool {
    REMOTE_HEAD.is_match(name)
}

/// Whether `name` matches any entry of `excluded`.
///
/// Comparison is case-insensitive and ignores a leading remote-tracking
/// prefix on `name`.
///
/// # Example
///
/// ```
/// use recreate_branch::core::naming::is_excluded;
///
/// let excluded = vec!["Feature-X".to_string()];
/// assert!(is_excluded("remotes/origin/feature-x", &excluded));
/// assert!(!is_excluded("feature-y", &excluded));
/// ```
pub fn is_excluded(name: &str, excluded: &[String]) -> bool {
    let bare = strip_remote_prefix(name).to_lowercase();
    excluded.iter().any(|e| e.trim().to_lowercase() == bare)
}

/// Name of the backup branch that holds `source` during recreation.
///
/// # Errors
///
/// Returns `TypeError::InvalidBranchName` if the prefix produces an invalid name.
///
/// # Example
///
/// ```
/// use recreate_branch::core::naming::backup_name;
/// use recreate_branch::core::types::BranchName;
///
/// let source = BranchName::new("release").unwrap();
/// assert_eq!(backup_name("BPF-PREFIX", &source).unwrap().as_str(), "BPF-PREFIX-release");
/// ```
pub fn backup_name(prefix: &str, source: &BranchName) -> Result<BranchName, TypeError> {
    BranchName::new(format!("{prefix}-{source}"))
}
