//! ui::output
//!
//! Human-readable output.
//!
//! # Design
//!
//! Operator-facing text goes to stdout (stderr for warnings and errors) and
//! respects the quiet flag. Diagnostics go through `tracing`, not here.

use std::fmt::Display;

/// Output verbosity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// Quiet mode - minimal output
    Quiet,
    /// Normal mode - standard output
    Normal,
    /// Verbose mode - extra detail alongside debug logging
    Verbose,
}

impl Verbosity {
    /// Create verbosity from flags.
    pub fn from_flags(quiet: bool, verbose: bool) -> Self {
        if quiet {
            Verbosity::Quiet
        } else if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

/// Print a message (respects quiet mode).
pub fn print(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        println!("{}", message);
    }
}

/// Print a message that must reach the operator even in quiet mode.
pub fn always(message: impl Display) {
    println!("{}", message);
}

/// Print an error message (always shown).
pub fn error(message: impl Display) {
    eprintln!("error: {}", message);
}

/// Print a warning message (respects quiet mode).
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if verbosity != Verbosity::Quiet {
        eprintln!("warning: {}", message);
    }
}

/// Format a list of items, one per line.
///
/// # Example
///
/// ```
/// use recreate_branch::ui::output::format_list;
///
/// assert_eq!(format_list(&["a", "b"], "  "), "  a\n  b");
/// ```
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    items
        .iter()
        .map(|item| format!("{}{}", prefix, item))
        .collect::<Vec<_>>()
        .join("\n")
}
