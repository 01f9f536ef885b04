//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! Flags left unset fall back to the repository config, then the global
//! config, then built-in defaults.

use std::path::PathBuf;

use clap::Parser;

use crate::core::types::BranchName;

/// Recreate an integration branch from the feature branches merged into it
#[derive(Parser, Debug)]
#[command(name = "recreate-branch")]
#[command(
    author,
    version,
    about,
    long_about = "Recreate an integration branch from the feature branches merged into it.\n\n\
        The source branch's merge history is read to find every feature branch merged \
        into it since the base, in the order they were first merged. A fresh branch is \
        then created from the base and each feature branch is merged into it again. \
        Non-merge commits on the source branch are not carried over.\n\n\
        Before replaying, historical merges are re-attempted in a detached workspace to \
        teach git rerere how their conflicts were resolved, so the same conflicts resolve \
        themselves during replay.",
    after_help = "\
EXAMPLES:
    # Show which branches would be merged, change nothing
    recreate-branch --list release

    # Rebuild release from main, leaving out two branches
    recreate-branch -a main -x feature-a,feature-b release

    # Build release-next next to release instead of replacing it
    recreate-branch -b release-next release

    # Start from the remote's release and learn from staging's merges too
    recreate-branch -d -r upstream -i staging release

ON CONFLICT:
    Replay stops at the first conflict rerere cannot resolve and prints the
    commands that restore the original branch. Resolve and commit the conflict
    to record its resolution, restore, and run again."
)]
pub struct Cli {
    /// The branch to recreate
    #[arg(value_name = "SOURCE", value_parser = parse_branch)]
    pub source: BranchName,

    /// Ref the source branch is based on [default: master]
    #[arg(short = 'a', long, value_name = "REF")]
    pub base: Option<String>,

    /// Create this branch instead of replacing the source branch
    #[arg(short = 'b', long = "branch", value_name = "NAME", value_parser = parse_branch)]
    pub target: Option<BranchName>,

    /// Comma separated branches to leave out
    #[arg(short = 'x', long, value_name = "A,B", value_delimiter = ',')]
    pub exclude: Vec<String>,

    /// List the branches that would be merged and exit without changes
    #[arg(short, long)]
    pub list: bool,

    /// Replace the local source branch with the remote's before starting
    #[arg(short, long)]
    pub discard: bool,

    /// Remote used by --discard [default: origin]
    #[arg(short, long, value_name = "NAME")]
    pub remote: Option<String>,

    /// Comma separated integration branches to pre-fill the rerere cache from
    #[arg(short, long, value_name = "A,B", value_delimiter = ',', value_parser = parse_branch)]
    pub integration: Vec<BranchName>,

    /// Show additional (debug) information
    #[arg(short, long)]
    pub verbose: bool,

    /// Minimal output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Do not pre-fill the rerere cache
    #[arg(short = 'C', long = "no-rerere-cache")]
    pub no_rerere_cache: bool,

    /// Answer yes to every confirmation
    #[arg(short, long)]
    pub yes: bool,

    /// Run as if started in this directory
    #[arg(long, value_name = "PATH")]
    pub cwd: Option<PathBuf>,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

fn parse_branch(s: &str) -> Result<BranchName, String> {
    BranchName::new(s.trim()).map_err(|e| e.to_string())
}
