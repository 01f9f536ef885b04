//! Shared fixture: real git repositories in temporary directories.

#![allow(dead_code)]

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

use recreate_branch::git::Git;

/// A throwaway repository with one commit on `master`.
pub struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    pub fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");

        run_git(dir.path(), &["init", "-q", "-b", "master"]);
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        run_git(dir.path(), &["config", "commit.gpgsign", "false"]);
        run_git(dir.path(), &["config", "core.editor", "true"]);
        run_git(dir.path(), &["config", "rerere.enabled", "false"]);

        let repo = Self { dir };
        repo.commit_file("file.txt", "base\n", "Initial commit");
        repo
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn git(&self) -> Git {
        Git::open(self.path()).expect("failed to open test repo")
    }

    pub fn run(&self, args: &[&str]) {
        run_git(self.path(), args);
    }

    /// Run git and return trimmed stdout.
    pub fn output(&self, args: &[&str]) -> String {
        let output = Command::new("git")
            .args(args)
            .current_dir(self.path())
            .output()
            .expect("git command failed");
        assert!(
            output.status.success(),
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap().trim().to_string()
    }

    pub fn commit_file(&self, path: &str, content: &str, message: &str) {
        std::fs::write(self.path().join(path), content).unwrap();
        self.run(&["add", path]);
        self.run(&["commit", "-q", "-m", message]);
    }

    pub fn read_file(&self, path: &str) -> String {
        std::fs::read_to_string(self.path().join(path)).unwrap()
    }

    pub fn checkout(&self, name: &str) {
        self.run(&["checkout", "-q", name]);
    }

    /// Branch `name` off `from` with one commit touching `path`.
    pub fn feature(&self, name: &str, from: &str, path: &str, content: &str) {
        self.run(&["checkout", "-q", "-b", name, from]);
        self.commit_file(path, content, &format!("Work on {name}"));
    }

    /// Merge `branch` into the current branch with a merge commit.
    pub fn merge(&self, branch: &str) {
        self.run(&[
            "merge",
            "-q",
            "--no-ff",
            "-m",
            &format!("Merge branch '{branch}'"),
            branch,
        ]);
    }

    /// Merge `branch`, expect a conflict, and commit `resolution` for `path`.
    pub fn merge_resolving(&self, branch: &str, path: &str, resolution: &str) {
        let status = Command::new("git")
            .args(["merge", "-q", "--no-ff", "-m", "conflicting merge", branch])
            .current_dir(self.path())
            .output()
            .expect("git merge failed to start");
        assert!(!status.status.success(), "expected a conflict merging {branch}");

        std::fs::write(self.path().join(path), resolution).unwrap();
        self.run(&["add", path]);
        self.run(&["commit", "-q", "--no-edit"]);
    }

    pub fn rev_parse(&self, rev: &str) -> String {
        self.output(&["rev-parse", rev])
    }

    pub fn branch_exists(&self, name: &str) -> bool {
        Command::new("git")
            .args(["show-ref", "--verify", "--quiet", &format!("refs/heads/{name}")])
            .current_dir(self.path())
            .status()
            .expect("git show-ref failed")
            .success()
    }

    pub fn current_branch(&self) -> String {
        self.output(&["rev-parse", "--abbrev-ref", "HEAD"])
    }

    /// Number of recorded resolutions in the rerere cache.
    pub fn cache_entries(&self) -> usize {
        let dir = self.path().join(".git/rr-cache");
        std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
    }

    /// Bare repository registered as `origin`, holding `branches`.
    ///
    /// The returned directory must outlive the test.
    pub fn bare_remote(&self, branches: &[&str]) -> TempDir {
        let dir = TempDir::new().expect("failed to create temp dir");
        run_git(dir.path(), &["init", "-q", "--bare"]);
        let url = dir.path().to_string_lossy().to_string();
        self.run(&["remote", "add", "origin", &url]);
        for branch in branches {
            self.run(&["push", "-q", "origin", branch]);
        }
        dir
    }

    /// `release` with clean merges of `feature-a`, `feature-b`, then a
    /// follow-up commit on `feature-a` merged again.
    pub fn with_clean_release() -> Self {
        let repo = Self::new();
        repo.feature("feature-a", "master", "a.txt", "a\n");
        repo.feature("feature-b", "master", "b.txt", "b\n");
        repo.run(&["checkout", "-q", "-b", "release", "master"]);
        repo.merge("feature-a");
        repo.merge("feature-b");
        repo.checkout("feature-a");
        repo.commit_file("a.txt", "a\nmore a\n", "More work on feature-a");
        repo.checkout("release");
        repo.merge("feature-a");
        repo.checkout("master");
        repo
    }

    /// `release` where merging `feature-b` after `feature-a` conflicts on
    /// `file.txt` and was resolved to "a and b".
    pub fn with_conflicting_release() -> Self {
        let repo = Self::new();
        repo.feature("feature-a", "master", "file.txt", "a\n");
        repo.feature("feature-b", "master", "file.txt", "b\n");
        repo.run(&["checkout", "-q", "-b", "release", "master"]);
        repo.merge("feature-a");
        repo.merge_resolving("feature-b", "file.txt", "a and b\n");
        repo.checkout("master");
        repo
    }
}

pub fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("git command failed");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}
