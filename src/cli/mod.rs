//! CLI commands
//!
//! Command implementations for the `gh-contrib` binary.

mod auth;
mod contribute;
mod progress;
mod style;

pub use auth::{AuthAction, run_auth};
pub use contribute::{ContributeArgs, run_contribute};
