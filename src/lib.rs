//! recreate-branch - rebuild an integration branch from its feature branches
//!
//! An integration branch accumulates merges of feature branches over time.
//! This crate reads that merge history, finds the feature branches in the
//! order they were first merged, and rebuilds the branch from a base by
//! merging each of them again. Historical conflict resolutions are taught to
//! git rerere first, so conflicts resolved once resolve themselves on replay.
//!
//! # Architecture
//!
//! The codebase follows a strict layered architecture:
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Analyze → Train → Backup → CreateTarget → ReplayMerges → Finalize
//! - [`core`] - Domain types, naming rules, paths and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`ui`] - Output and confirmation prompts
//!
//! # Correctness Invariants
//!
//! 1. Nothing is mutated before the operator confirms the plan
//! 2. The source branch is never deleted before its backup exists
//! 3. Every stop after the backup reports the commands that restore it
//! 4. Training leaves the workspace where it found it

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod ui;
