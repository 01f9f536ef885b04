//! engine::analyze
//!
//! Merge Graph Analyzer: which feature branches went into a branch, and in
//! what order.
//!
//! # Architecture
//!
//! - [`collect_feature_branches`] is pure: merge commits plus a name for
//!   each parent in, ordered distinct branch names out.
//! - [`discover_feature_branches`] gathers that data through the
//!   [`Gateway`] and applies exclusions.
//!
//! # Algorithm
//!
//! Merge commits in `base...source` are walked oldest first. Every parent
//! but the first is named by its nearest named ancestor (`feature~2`).
//! Names that contain the source name or the base's name, and synthetic
//! remote HEADs, are dropped. The offset suffix is stripped and the name is
//! kept the first time it is seen.

use std::collections::HashMap;

use crate::core::naming::{is_excluded, is_remote_head, strip_offset};
use crate::core::types::{BranchName, MergeCommit, Oid, Ref};
use crate::git::{Gateway, GitError, RevRange};

/// Ordered, duplicate-free branch names in first-merge order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeatureBranchList(Vec<String>);

impl FeatureBranchList {
    /// An empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `name` unless it is already present. Returns whether it was added.
    pub fn push(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.0.contains(&name) {
            return false;
        }
        self.0.push(name);
        true
    }

    /// Split into (kept, dropped) by case-insensitive, remote-prefix-stripped
    /// match against `excluded`.
    ///
    /// # Example
    ///
    /// ```
    /// use recreate_branch::engine::analyze::FeatureBranchList;
    ///
    /// let list: FeatureBranchList = ["remotes/origin/feature-x", "feature-y"].into_iter().collect();
    /// let (kept, dropped) = list.exclude(&["Feature-X".to_string()]);
    /// assert_eq!(kept.as_slice(), ["feature-y"]);
    /// assert_eq!(dropped, ["remotes/origin/feature-x"]);
    /// ```
    pub fn exclude(&self, excluded: &[String]) -> (FeatureBranchList, Vec<String>) {
        let (dropped, kept): (Vec<String>, Vec<String>) = self
            .0
            .iter()
            .cloned()
            .partition(|name| is_excluded(name, excluded));
        (FeatureBranchList(kept), dropped)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FeatureBranchList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut list = FeatureBranchList::new();
        for name in iter {
            list.push(name);
        }
        list
    }
}

impl<'a> IntoIterator for &'a FeatureBranchList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Result of analyzing a source branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Discovery {
    /// Every feature branch found, before exclusion.
    pub found: FeatureBranchList,
    /// The replay plan: `found` minus exclusions.
    pub accepted: FeatureBranchList,
    /// Names removed by exclusion, in discovery order.
    pub excluded: Vec<String>,
    /// Merge commits examined.
    pub merges_examined: usize,
}

impl Discovery {
    /// Nothing left to replay.
    pub fn is_nothing_to_recreate(&self) -> bool {
        self.accepted.is_empty()
    }
}

/// Whether a parent's name refers to a feature branch worth replaying.
fn is_feature_name(name: &str, source: &str, base_name: Option<&str>) -> bool {
    if name.contains(source) {
        return false;
    }
    if let Some(base) = base_name.filter(|b| !b.is_empty()) {
        if name.contains(base) {
            return false;
        }
    }
    !is_remote_head(name)
}

/// Ordered distinct feature branches merged by `merges` (PURE).
///
/// `names` maps a parent id to its `name-rev` style name; unnamed parents
/// are skipped. `merges` must be ordered oldest first.
pub fn collect_feature_branches(
    merges: &[MergeCommit],
    names: &HashMap<Oid, String>,
    source: &str,
    base_name: Option<&str>,
) -> FeatureBranchList {
    let mut branches = FeatureBranchList::new();
    for merge in merges {
        for parent in merge.merged_parents() {
            let Some(name) = names.get(parent) else {
                continue;
            };
            if !is_feature_name(name, source, base_name) {
                continue;
            }
            branches.push(strip_offset(name));
        }
    }
    branches
}

/// Find the feature branches merged into `source` since `base` (EFFECTFUL).
///
/// # Errors
///
/// [`GitError::RefNotFound`] if `base` or `source` does not resolve, or any
/// gateway failure while walking history.
pub fn discover_feature_branches(
    gateway: &dyn Gateway,
    base: &Ref,
    source: &BranchName,
    excluded: &[String],
) -> Result<Discovery, GitError> {
    let base_oid = gateway
        .resolve(base)?
        .ok_or_else(|| GitError::RefNotFound {
            refname: base.to_string(),
        })?;
    let source_oid = gateway
        .resolve(&Ref::local(source))?
        .ok_or_else(|| GitError::RefNotFound {
            refname: source.to_string(),
        })?;

    let merges = gateway.merge_commits(&RevRange::Symmetric {
        from: base_oid.clone(),
        to: source_oid,
    })?;

    let mut names = HashMap::new();
    for parent in merges.iter().flat_map(MergeCommit::merged_parents) {
        if names.contains_key(parent) {
            continue;
        }
        if let Some(name) = gateway.name_rev(parent)? {
            names.insert(parent.clone(), name);
        }
    }
    let base_name = gateway.name_rev(&base_oid)?;

    let found = collect_feature_branches(&merges, &names, source.as_str(), base_name.as_deref());
    let (accepted, dropped) = found.exclude(excluded);

    tracing::debug!(
        merges = merges.len(),
        found = found.len(),
        accepted = accepted.len(),
        base_name = base_name.as_deref().unwrap_or("<unnamed>"),
        "analyzed merge history"
    );

    Ok(Discovery {
        found,
        accepted,
        excluded: dropped,
        merges_examined: merges.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(n: u8) -> Oid {
        Oid::new(format!("{:040x}", n)).unwrap()
    }

    fn merge(id: u8, parents: &[u8]) -> MergeCommit {
        MergeCommit {
            oid: oid(id),
            parents: parents.iter().copied().map(oid).collect(),
        }
    }

    fn names(pairs: &[(u8, &str)]) -> HashMap<Oid, String> {
        pairs
            .iter()
            .map(|(id, name)| (oid(*id), name.to_string()))
            .collect()
    }

    mod list {
        use super::*;

        #[test]
        fn push_dedups() {
            let mut list = FeatureBranchList::new();
            assert!(list.push("a"));
            assert!(list.push("b"));
            assert!(!list.push("a"));
            assert_eq!(list.as_slice(), ["a", "b"]);
        }

        #[test]
        fn exclude_everything_leaves_empty() {
            let list: FeatureBranchList = ["a", "b"].into_iter().collect();
            let (kept, dropped) = list.exclude(&["A".into(), "B".into()]);
            assert!(kept.is_empty());
            assert_eq!(dropped, ["a", "b"]);
        }
    }

    mod collect {
        use super::*;

        #[test]
        fn first_merge_order_without_duplicates() {
            let merges = vec![
                merge(10, &[1, 2]),
                merge(11, &[10, 3]),
                merge(12, &[11, 4]),
            ];
            let names = names(&[(2, "feature-a~1"), (3, "feature-b"), (4, "feature-a")]);

            let list = collect_feature_branches(&merges, &names, "release", Some("master"));
            assert_eq!(list.as_slice(), ["feature-a", "feature-b"]);
        }

        #[test]
        fn drops_source_base_and_remote_head() {
            let merges = vec![merge(10, &[1, 2]), merge(11, &[10, 3]), merge(12, &[11, 4])];
            let names = names(&[
                (2, "release~3"),
                (3, "master~1^2"),
                (4, "remotes/origin/HEAD~2"),
            ]);

            let list = collect_feature_branches(&merges, &names, "release", Some("master"));
            assert!(list.is_empty());
        }

        #[test]
        fn unnamed_parents_are_skipped() {
            let merges = vec![merge(10, &[1, 2]), merge(11, &[10, 3])];
            let names = names(&[(3, "feature-c~4")]);

            let list = collect_feature_branches(&merges, &names, "release", None);
            assert_eq!(list.as_slice(), ["feature-c"]);
        }

        #[test]
        fn first_parent_is_never_a_feature() {
            let merges = vec![merge(10, &[1, 2])];
            let names = names(&[(1, "feature-mainline"), (2, "feature-side")]);

            let list = collect_feature_branches(&merges, &names, "release", Some("master"));
            assert_eq!(list.as_slice(), ["feature-side"]);
        }

        #[test]
        fn octopus_contributes_every_merged_parent() {
            let merges = vec![merge(10, &[1, 2, 3, 4])];
            let names = names(&[(2, "a"), (3, "b"), (4, "c")]);

            let list = collect_feature_branches(&merges, &names, "release", Some("master"));
            assert_eq!(list.as_slice(), ["a", "b", "c"]);
        }

        #[test]
        fn remote_tracking_names_are_kept_whole() {
            let merges = vec![merge(10, &[1, 2])];
            let names = names(&[(2, "remotes/origin/feature-x~1")]);

            let list = collect_feature_branches(&merges, &names, "release", Some("master"));
            assert_eq!(list.as_slice(), ["remotes/origin/feature-x"]);
        }

        #[test]
        fn empty_base_name_filters_nothing() {
            let merges = vec![merge(10, &[1, 2])];
            let names = names(&[(2, "feature")]);

            let list = collect_feature_branches(&merges, &names, "release", Some(""));
            assert_eq!(list.as_slice(), ["feature"]);
        }

        #[test]
        fn no_merges_is_empty() {
            let list = collect_feature_branches(&[], &HashMap::new(), "release", Some("master"));
            assert!(list.is_empty());
        }
    }
}
