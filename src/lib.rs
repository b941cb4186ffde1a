//! gh-contrib - idempotent fork-to-pull-request contribution workflows
//!
//! Turns a single high-level request ("contribute this change upstream")
//! into a correct, idempotent sequence of fork/branch/commit/PR operations
//! against the GitHub API, tolerating partial prior state (fork already
//! exists, branch already exists) and partial failure.
//!
//! The entry point is [`workflow::run_workflow`]; everything it touches goes
//! through the [`remote::RemoteRepository`] trait, so tests (and alternative
//! hosting services) can supply their own client.

pub mod auth;
pub mod branch;
pub mod commit;
pub mod error;
pub mod fork;
pub mod pr;
pub mod remote;
pub mod types;
pub mod workflow;
