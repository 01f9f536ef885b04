//! The binary end to end.

mod common;

use assert_cmd::Command;
use predicates::prelude::*;

use common::TestRepo;

fn recreate_branch() -> Command {
    let mut cmd = Command::cargo_bin("recreate-branch").unwrap();
    cmd.env("RECREATE_BRANCH_CONFIG", "/nonexistent/config.toml");
    cmd
}

#[test]
fn help_describes_tool() {
    recreate_branch()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("feature branches"));
}

#[test]
fn source_is_required() {
    recreate_branch().assert().failure();
}

#[test]
fn list_prints_branches_in_order() {
    let repo = TestRepo::with_clean_release();

    recreate_branch()
        .args(["--list", "release"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::is_match("(?s)feature-a.*feature-b").unwrap());
}

#[test]
fn list_shows_excluded() {
    let repo = TestRepo::with_clean_release();

    recreate_branch()
        .args(["-l", "-x", "feature-a", "release"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Excluded:"));
}

#[test]
fn yes_recreates_without_prompting() {
    let repo = TestRepo::with_clean_release();

    recreate_branch()
        .args(["--yes", "release"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Recreated 'release'"));

    assert!(!repo.branch_exists("BPF-PREFIX-release"));
}

#[test]
fn unresolved_conflict_exits_nonzero_with_recovery() {
    let repo = TestRepo::with_conflicting_release();

    recreate_branch()
        .args(["--yes", "--no-rerere-cache", "release"])
        .current_dir(repo.path())
        .assert()
        .failure()
        .stdout(predicate::str::contains("git branch -m BPF-PREFIX-release release"));
}

#[test]
fn nothing_to_recreate_exits_zero() {
    let repo = TestRepo::new();
    repo.run(&["branch", "release"]);

    recreate_branch()
        .args(["--yes", "release"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to recreate"));
}

#[test]
fn missing_source_exits_one() {
    let repo = TestRepo::new();

    recreate_branch()
        .args(["--yes", "release"])
        .current_dir(repo.path())
        .assert()
        .code(1)
        .stderr(predicate::str::contains("release"));
}

#[test]
fn without_terminal_confirmation_is_refused() {
    let repo = TestRepo::with_clean_release();
    let before = repo.rev_parse("release");

    recreate_branch()
        .arg("release")
        .current_dir(repo.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("--yes"));

    assert_eq!(repo.rev_parse("release"), before);
}

#[test]
fn repo_config_supplies_exclusions() {
    let repo = TestRepo::with_clean_release();
    let dir = repo.path().join(".git/recreate-branch");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "exclude = [\"feature-b\"]\n").unwrap();

    recreate_branch()
        .args(["--list", "release"])
        .current_dir(repo.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Excluded:\n  feature-b"));
}

#[test]
fn interrupted_run_prints_recovery_on_stdout() {
    let repo = TestRepo::with_clean_release();
    repo.commit_file("u.txt", "tracked on master\n", "Add u.txt");
    repo.checkout("release");
    std::fs::write(repo.path().join("u.txt"), "untracked\n").unwrap();

    recreate_branch()
        .args(["--yes", "--quiet", "-C", "release"])
        .current_dir(repo.path())
        .assert()
        .code(1)
        .stdout(predicate::str::contains(
            "git branch -m BPF-PREFIX-release release",
        ))
        .stderr(predicate::str::contains("recreation interrupted"))
        .stderr(predicate::str::contains("git branch").not());

    assert!(repo.branch_exists("BPF-PREFIX-release"));
}
