//! core::types
//!
//! Strong types for the objects recreation reasons about.
//!
//! # Types
//!
//! - [`BranchName`] - Validated Git branch name
//! - [`Oid`] - Git object identifier (SHA)
//! - [`Ref`] / [`RefKind`] - A name plus what kind of ref it denotes
//! - [`MergeCommit`] - A commit with two or more parents
//!
//! # Validation
//!
//! Names and ids are validated at construction time, so an engine step
//! holding a `BranchName` never has to re-check it before handing it to git.
//!
//! # Examples
//!
//! ```
//! use recreate_branch::core::types::{BranchName, Oid, Ref};
//!
//! let branch = BranchName::new("release/2.1").unwrap();
//! let oid = Oid::new("abc123def4567890abc123def4567890abc12345").unwrap();
//! assert_eq!(Ref::local(&branch).full_name(), "refs/heads/release/2.1");
//! assert_eq!(oid.short(7), "abc123d");
//!
//! assert!(BranchName::new("invalid..name").is_err());
//! assert!(Oid::new("not-a-sha").is_err());
//! ```

use thiserror::Error;

/// Errors from type validation.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid branch name: {0}")]
    InvalidBranchName(String),

    #[error("invalid object id: {0}")]
    InvalidOid(String),
}

/// A validated Git branch name.
///
/// Follows the subset of `git check-ref-format --branch` rules that matter
/// for names we create or rename to:
/// - not empty, not exactly `@`
/// - no leading `.` or `-`, no trailing `/` or `.lock`
/// - no `..`, `@{`, `//`, control characters, or any of `` ~^:\?*[`` and space
/// - no path component starting with `.` or ending with `.lock`
///
/// # Example
///
/// ```
/// use recreate_branch::core::types::BranchName;
///
/// let name = BranchName::new("feature/login").unwrap();
/// assert_eq!(name.as_str(), "feature/login");
///
/// assert!(BranchName::new("").is_err());
/// assert!(BranchName::new("feature~2").is_err());
/// assert!(BranchName::new("has space").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BranchName(String);

impl BranchName {
    /// Create a new validated branch name.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidBranchName` if the name violates Git's refname rules.
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        Self::validate(&name)?;
        Ok(Self(name))
    }

    fn validate(name: &str) -> Result<(), TypeError> {
        let reject = |why: &str| Err(TypeError::InvalidBranchName(format!("'{name}': {why}")));

        if name.is_empty() {
            return reject("cannot be empty");
        }
        if name == "@" {
            return reject("'@' is reserved");
        }
        if name.starts_with('-') {
            return reject("cannot start with '-'");
        }
        if name.ends_with('/') {
            return reject("cannot end with '/'");
        }
        for forbidden in ["..", "@{", "//"] {
            if name.contains(forbidden) {
                return reject(&format!("cannot contain '{forbidden}'"));
            }
        }
        if let Some(c) = name
            .chars()
            .find(|c| c.is_ascii_control() || " ~^:\\?*[".contains(*c))
        {
            return reject(&format!("cannot contain {c:?}"));
        }
        for component in name.split('/') {
            if component.starts_with('.') {
                return reject("path component cannot start with '.'");
            }
            if component.ends_with(".lock") {
                return reject("path component cannot end with '.lock'");
            }
        }

        Ok(())
    }

    /// Get the branch name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BranchName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BranchName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A Git object identifier (SHA-1 or SHA-256), normalized to lowercase.
///
/// # Example
///
/// ```
/// use recreate_branch::core::types::Oid;
///
/// let oid = Oid::new("ABC123DEF4567890ABC123DEF4567890ABC12345").unwrap();
/// assert_eq!(oid.as_str(), "abc123def4567890abc123def4567890abc12345");
/// assert_eq!(oid.short(7), "abc123d");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Oid(String);

impl Oid {
    /// Create a new validated object id.
    ///
    /// # Errors
    ///
    /// Returns `TypeError::InvalidOid` if the string is not a 40 or 64 digit hex id.
    pub fn new(oid: impl Into<String>) -> Result<Self, TypeError> {
        let oid = oid.into().to_ascii_lowercase();
        if oid.len() != 40 && oid.len() != 64 {
            return Err(TypeError::InvalidOid(format!(
                "expected 40 or 64 hex characters, got {}",
                oid.len()
            )));
        }
        if !oid.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(TypeError::InvalidOid(
                "object id must be hexadecimal".into(),
            ));
        }
        Ok(Self(oid))
    }

    /// Get an abbreviated form of the OID (at most `len` characters).
    pub fn short(&self, len: usize) -> &str {
        &self.0[..len.min(self.0.len())]
    }

    /// Get the object id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Oid {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Oid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// What kind of reference a [`Ref`] denotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefKind {
    /// A local branch head (`refs/heads/<name>`).
    LocalBranch,
    /// A remote-tracking branch head (`refs/remotes/<remote>/<name>`).
    RemoteBranch {
        /// Remote the branch is tracked from.
        remote: String,
    },
    /// Any revision expression git can resolve (`HEAD~2`, a sha, `main^2`...).
    Revision,
}

/// A ref: a name plus a kind. Resolvable to a commit id or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ref {
    /// Short name, as the operator typed it.
    pub name: String,
    /// What the name refers to.
    pub kind: RefKind,
}

impl Ref {
    /// A local branch head.
    pub fn local(branch: &BranchName) -> Self {
        Self {
            name: branch.to_string(),
            kind: RefKind::LocalBranch,
        }
    }

    /// A remote-tracking branch head.
    pub fn remote(remote: &str, branch: &BranchName) -> Self {
        Self {
            name: branch.to_string(),
            kind: RefKind::RemoteBranch {
                remote: remote.to_string(),
            },
        }
    }

    /// An arbitrary revision expression.
    pub fn revision(expr: impl Into<String>) -> Self {
        Self {
            name: expr.into(),
            kind: RefKind::Revision,
        }
    }

    /// The expression handed to git to resolve this ref.
    ///
    /// ```
    /// use recreate_branch::core::types::{BranchName, Ref};
    ///
    /// let b = BranchName::new("topic").unwrap();
    /// assert_eq!(Ref::remote("origin", &b).full_name(), "refs/remotes/origin/topic");
    /// assert_eq!(Ref::revision("HEAD~1").full_name(), "HEAD~1");
    /// ```
    pub fn full_name(&self) -> String {
        match &self.kind {
            RefKind::LocalBranch => format!("refs/heads/{}", self.name),
            RefKind::RemoteBranch { remote } => format!("refs/remotes/{remote}/{}", self.name),
            RefKind::Revision => self.name.clone(),
        }
    }
}

impl std::fmt::Display for Ref {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.kind {
            RefKind::RemoteBranch { remote } => write!(f, "{remote}/{}", self.name),
            _ => f.write_str(&self.name),
        }
    }
}

/// A commit with two or more parents.
///
/// `parents[0]` is the mainline side; the rest are the merged-in sides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeCommit {
    /// The merge commit itself.
    pub oid: Oid,
    /// Parent ids in recorded order.
    pub parents: Vec<Oid>,
}

impl MergeCommit {
    /// Parents other than the first (the merged-in sides).
    pub fn merged_parents(&self) -> &[Oid] {
        self.parents.get(1..).unwrap_or(&[])
    }

    /// Whether this merge joins more than two histories.
    pub fn is_octopus(&self) -> bool {
        self.parents.len() > 2
    }
}
