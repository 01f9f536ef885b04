//! core
//!
//! Core domain types and rules for branch recreation.
//!
//! # Modules
//!
//! - [`types`] - Strong types: BranchName, Oid, Ref, MergeCommit
//! - [`naming`] - Branch name canonicalization, exclusion and backup names
//! - [`config`] - Configuration schema and loading
//! - [`paths`] - Path routing for tool and resolution-cache storage
//!
//! # Design Principles
//!
//! - Strong typing prevents invalid states at compile time
//! - Nothing here talks to git

pub mod config;
pub mod naming;
pub mod paths;
pub mod types;
