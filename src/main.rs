//! recreate-branch binary entry point.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

use recreate_branch::cli::{self, Cli};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    // RUST_LOG wins over -v
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    cli::run(cli)
}
