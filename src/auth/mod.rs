//! Authentication for GitHub
//!
//! Supports CLI-based auth (gh) and environment variables. Used by the CLI
//! only; the library core takes an explicit token and never reads ambient
//! credential state.

mod github;

pub use github::{GitHubAuthConfig, get_github_auth, test_github_auth};

/// Source of authentication token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthSource {
    /// Token from the gh CLI
    Cli,
    /// Token from an environment variable
    EnvVar,
}
