//! ui
//!
//! User interaction utilities.
//!
//! # Modules
//!
//! - [`prompts`] - The injectable yes/no confirmation capability
//! - [`output`] - Output formatting and display
//!
//! # Design
//!
//! All operator-facing output and prompts go through this module, so the
//! engine stays free of terminal concerns.

pub mod output;
pub mod prompts;
