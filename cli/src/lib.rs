//! Dotfile synchronization engine.
//!
//! Keeps a set of tracked files in the home directory in step with a
//! repository, either a plain directory or a git remote.  Changes are found
//! by comparing content digests on both sides against a per-machine snapshot
//! of the last sync, so `push` and `pull` only move files that actually
//! changed and stop on conflicts.
//!
//! The public API is organised into four layers:
//!
//! - **[`config`]**: parse and validate the `dotdex` TOML file
//! - **[`resources`]**: idempotent `check + apply` primitives for synced files
//! - **[`tasks`]**: named, dependency-ordered units of work wired to resources
//! - **[`commands`]**: top-level subcommand orchestration (`push`, `pull`, `status`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod detect;
pub mod error;
pub mod logging;
pub mod paths;
pub mod repository;
pub mod resources;
pub mod snapshot;
pub mod tasks;
