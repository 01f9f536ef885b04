//! End-to-end branch recreation against real repositories.

mod common;

use std::cell::RefCell;

use common::TestRepo;

use recreate_branch::core::types::BranchName;
use recreate_branch::engine::{
    MergeOutcome, NoProgress, RecreateError, RecreateOptions, RecreateOutcome, Recreator,
    RecoveryStage, ValidationError,
};
use recreate_branch::ui::prompts::{AlwaysNo, AlwaysYes};

fn name(s: &str) -> BranchName {
    BranchName::new(s).unwrap()
}

fn options(source: &str) -> RecreateOptions {
    RecreateOptions::new(name(source))
}

fn run(repo: &TestRepo, options: &RecreateOptions) -> Result<RecreateOutcome, RecreateError> {
    let git = repo.git();
    let mut confirm = AlwaysYes;
    Recreator::new(&git, &mut confirm, &NoProgress).run(options)
}

/// Run the printed recovery commands as an operator would.
fn run_recovery(repo: &TestRepo, commands: &[String]) {
    for command in commands {
        let args: Vec<&str> = command.split_whitespace().skip(1).collect();
        repo.run(&args);
    }
}

#[test]
fn recreates_branch_in_place() {
    let repo = TestRepo::with_clean_release();

    let outcome = run(&repo, &options("release")).unwrap();

    let RecreateOutcome::Recreated { plan, replayed, .. } = outcome else {
        panic!("expected a recreation");
    };
    assert_eq!(plan.branches.as_slice(), ["feature-a", "feature-b"]);
    assert!(replayed.iter().all(|(_, o)| *o == MergeOutcome::Clean));
    assert_eq!(repo.current_branch(), "release");
    assert!(!repo.branch_exists("BPF-PREFIX-release"));

    // Only the two replayed merges sit on top of master.
    let merges = repo.output(&["rev-list", "--merges", "--count", "master..release"]);
    assert_eq!(merges, "2");
    assert_eq!(repo.read_file("a.txt"), "a\nmore a\n");
    assert_eq!(repo.read_file("b.txt"), "b\n");
}

#[test]
fn non_merge_commits_are_not_carried_over() {
    let repo = TestRepo::with_clean_release();
    repo.checkout("release");
    repo.commit_file("hotfix.txt", "direct\n", "Direct commit on release");
    repo.checkout("master");

    run(&repo, &options("release")).unwrap();

    assert!(!repo.path().join("hotfix.txt").exists());
}

#[test]
fn separate_target_keeps_source() {
    let repo = TestRepo::with_clean_release();
    let source_before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.target = Some(name("release-next"));

    let outcome = run(&repo, &opts).unwrap();

    assert!(matches!(outcome, RecreateOutcome::Recreated { .. }));
    assert_eq!(repo.rev_parse("release"), source_before);
    assert_eq!(repo.current_branch(), "release-next");
    assert!(!repo.branch_exists("BPF-PREFIX-release"));
}

#[test]
fn recreation_is_repeatable() {
    let repo = TestRepo::with_clean_release();

    run(&repo, &options("release")).unwrap();
    let first_tree = repo.rev_parse("release^{tree}");
    repo.checkout("master");
    let outcome = run(&repo, &options("release")).unwrap();

    let RecreateOutcome::Recreated { plan, .. } = outcome else {
        panic!("expected a recreation");
    };
    assert_eq!(plan.branches.as_slice(), ["feature-a", "feature-b"]);
    assert_eq!(repo.rev_parse("release^{tree}"), first_tree);
}

#[test]
fn trained_conflict_resolves_itself() {
    let repo = TestRepo::with_conflicting_release();

    let outcome = run(&repo, &options("release")).unwrap();

    let RecreateOutcome::Recreated {
        replayed, training, ..
    } = outcome
    else {
        panic!("expected a recreation");
    };
    assert_eq!(training.map(|t| t.learned), Some(1));
    assert_eq!(replayed[0].1, MergeOutcome::Clean);
    assert!(matches!(replayed[1].1, MergeOutcome::AutoResolved { .. }));
    assert_eq!(repo.read_file("file.txt"), "a and b\n");
    assert_eq!(repo.output(&["status", "--porcelain"]), "");
}

#[test]
fn untrained_conflict_pauses_with_working_recovery() {
    let repo = TestRepo::with_conflicting_release();
    let source_before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.prefill_cache = false;

    let outcome = run(&repo, &opts).unwrap();

    let RecreateOutcome::ConflictPaused {
        branch,
        outcome,
        recovery,
        replayed,
        ..
    } = outcome
    else {
        panic!("expected a pause");
    };
    assert_eq!(branch, "feature-b");
    assert!(matches!(outcome, MergeOutcome::Unresolved { ref paths } if paths == &["file.txt"]));
    assert_eq!(replayed.len(), 1);
    assert!(recovery.abort_merge);
    assert!(repo.branch_exists("BPF-PREFIX-release"));
    assert_eq!(repo.current_branch(), "release");

    run_recovery(&repo, &recovery.commands());

    assert_eq!(repo.rev_parse("release"), source_before);
    assert!(!repo.branch_exists("BPF-PREFIX-release"));
}

#[test]
fn list_only_changes_nothing() {
    let repo = TestRepo::with_clean_release();
    let before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.list_only = true;

    let outcome = run(&repo, &opts).unwrap();

    let RecreateOutcome::Listed { discovery } = outcome else {
        panic!("expected a listing");
    };
    assert_eq!(discovery.accepted.as_slice(), ["feature-a", "feature-b"]);
    assert_eq!(repo.rev_parse("release"), before);
    assert_eq!(repo.current_branch(), "master");
}

#[test]
fn nothing_to_recreate_when_source_matches_base() {
    let repo = TestRepo::new();
    repo.run(&["branch", "release"]);

    let outcome = run(&repo, &options("release")).unwrap();

    assert!(matches!(outcome, RecreateOutcome::NothingToRecreate { .. }));
    assert!(outcome.is_success());
}

#[test]
fn declined_confirmation_mutates_nothing() {
    let repo = TestRepo::with_clean_release();
    let before = repo.rev_parse("release");
    let git = repo.git();
    let mut confirm = AlwaysNo;

    let result = Recreator::new(&git, &mut confirm, &NoProgress).run(&options("release"));

    assert!(matches!(result, Err(RecreateError::ConfirmationDeclined(_))));
    assert_eq!(repo.rev_parse("release"), before);
    assert!(!repo.branch_exists("BPF-PREFIX-release"));
    assert_eq!(repo.cache_entries(), 0);
}

#[test]
fn existing_target_fails_validation() {
    let repo = TestRepo::with_clean_release();
    repo.run(&["branch", "release-next", "master"]);
    let mut opts = options("release");
    opts.target = Some(name("release-next"));

    let result = run(&repo, &opts);

    assert!(matches!(
        result,
        Err(RecreateError::Validation(ValidationError::TargetExists(_)))
    ));
}

#[test]
fn missing_source_fails_validation() {
    let repo = TestRepo::new();

    let result = run(&repo, &options("release"));

    assert!(matches!(
        result,
        Err(RecreateError::Validation(ValidationError::SourceNotFound(_)))
    ));
}

#[test]
fn dirty_worktree_fails_validation() {
    let repo = TestRepo::with_clean_release();
    std::fs::write(repo.path().join("file.txt"), "edited\n").unwrap();

    let result = run(&repo, &options("release"));

    assert!(matches!(
        result,
        Err(RecreateError::Validation(ValidationError::DirtyWorktree))
    ));
}

#[test]
fn stale_backup_is_destroyed_after_confirmation() {
    let repo = TestRepo::with_clean_release();
    repo.run(&["branch", "BPF-PREFIX-release", "master"]);
    let asked = RefCell::new(Vec::new());
    let git = repo.git();
    let mut confirm = |prompt: &str, _default: bool| {
        asked.borrow_mut().push(prompt.to_string());
        true
    };

    let outcome = Recreator::new(&git, &mut confirm, &NoProgress)
        .run(&options("release"))
        .unwrap();

    assert!(matches!(outcome, RecreateOutcome::Recreated { .. }));
    assert!(!repo.branch_exists("BPF-PREFIX-release"));
    assert!(asked
        .borrow()
        .iter()
        .any(|p| p.contains("forcefully destroy")));
}

#[test]
fn kept_stale_backup_stops_before_touching_source() {
    let repo = TestRepo::with_clean_release();
    repo.run(&["branch", "BPF-PREFIX-release", "master"]);
    let before = repo.rev_parse("release");
    let git = repo.git();
    let mut confirm = |prompt: &str, _default: bool| !prompt.contains("forcefully destroy");
    let mut opts = options("release");
    opts.prefill_cache = false;

    let result = Recreator::new(&git, &mut confirm, &NoProgress).run(&opts);

    assert!(matches!(result, Err(RecreateError::ConfirmationDeclined(_))));
    assert_eq!(repo.rev_parse("release"), before);
    assert!(repo.branch_exists("BPF-PREFIX-release"));
}

#[test]
fn failed_target_creation_recovers_without_deleting_anything() {
    let repo = TestRepo::with_clean_release();
    repo.commit_file("u.txt", "tracked on master\n", "Add u.txt");
    repo.checkout("release");
    std::fs::write(repo.path().join("u.txt"), "untracked\n").unwrap();
    let source_before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.prefill_cache = false;

    let result = run(&repo, &opts);

    let Err(RecreateError::Interrupted { recovery, .. }) = result else {
        panic!("expected an interrupted recreation");
    };
    assert_eq!(recovery.stage, RecoveryStage::BeforeTarget);
    assert!(!repo.branch_exists("release"));
    assert_eq!(
        recovery.commands(),
        vec!["git branch -m BPF-PREFIX-release release"]
    );

    run_recovery(&repo, &recovery.commands());

    assert_eq!(repo.rev_parse("release"), source_before);
    assert!(!repo.branch_exists("BPF-PREFIX-release"));
    assert_eq!(repo.current_branch(), "release");
}

#[test]
fn discard_with_unknown_remote_fails_before_mutation() {
    let repo = TestRepo::with_clean_release();
    let before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.discard = true;
    opts.remote = "nowhere".to_string();

    let result = run(&repo, &opts);

    assert!(matches!(result, Err(RecreateError::Fetch { ref remote, .. }) if remote == "nowhere"));
    assert_eq!(repo.rev_parse("release"), before);
    assert_eq!(repo.current_branch(), "master");
}

#[test]
fn declined_discard_keeps_local_branch() {
    let repo = TestRepo::with_clean_release();
    let _remote = repo.bare_remote(&["master", "release"]);
    repo.checkout("release");
    repo.commit_file("local.txt", "local only\n", "Local work");
    repo.checkout("master");
    let before = repo.rev_parse("release");
    let asked = RefCell::new(Vec::new());
    let git = repo.git();
    let mut confirm = |prompt: &str, default: bool| {
        asked.borrow_mut().push((prompt.to_string(), default));
        !prompt.contains("afresh")
    };
    let mut opts = options("release");
    opts.discard = true;

    let result = Recreator::new(&git, &mut confirm, &NoProgress).run(&opts);

    assert!(matches!(result, Err(RecreateError::ConfirmationDeclined(_))));
    assert_eq!(repo.rev_parse("release"), before);
    assert_eq!(repo.current_branch(), "master");
    let asked = asked.borrow();
    assert_eq!(asked.len(), 1);
    assert!(!asked[0].1, "discarding must default to no");
}

#[test]
fn discard_keeps_local_branch_missing_on_remote() {
    let repo = TestRepo::with_clean_release();
    let _remote = repo.bare_remote(&["master"]);
    let before = repo.rev_parse("release");
    let mut opts = options("release");
    opts.discard = true;
    opts.list_only = true;

    let outcome = run(&repo, &opts).unwrap();

    assert!(matches!(outcome, RecreateOutcome::Listed { .. }));
    assert_eq!(repo.rev_parse("release"), before);
}

#[test]
fn discard_replaces_local_branch_with_remote_copy() {
    let repo = TestRepo::with_clean_release();
    let _remote = repo.bare_remote(&["master", "release"]);
    let remote_tip = repo.rev_parse("release");
    repo.checkout("release");
    repo.commit_file("local.txt", "local only\n", "Local work");
    repo.checkout("master");
    let mut opts = options("release");
    opts.discard = true;
    opts.list_only = true;

    let outcome = run(&repo, &opts).unwrap();

    let RecreateOutcome::Listed { discovery } = outcome else {
        panic!("expected a listing");
    };
    assert_eq!(discovery.accepted.as_slice(), ["feature-a", "feature-b"]);
    assert_eq!(repo.rev_parse("release"), remote_tip);
    assert_eq!(
        repo.output(&["rev-parse", "--abbrev-ref", "release@{upstream}"]),
        "origin/release"
    );
}
