//! Error types for gh-contrib

use crate::workflow::WorkflowStep;

/// Result alias using the crate error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during contribution workflows
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The upstream repository cannot be forked (private repo, org policy)
    #[error("forking {upstream} was denied: {reason}")]
    ForkCreationDenied {
        /// Upstream repository that refused the fork
        upstream: String,
        /// Reason reported by the hosting service
        reason: String,
    },

    /// A newly created fork never became ready within the polling bound
    #[error("fork {fork} was not ready after {attempts} attempts")]
    ForkTimeout {
        /// Fork repository that was being polled
        fork: String,
        /// Number of readiness attempts made
        attempts: u32,
    },

    /// The base ref for a new branch could not be resolved
    #[error("base ref {base} not found in {repo}")]
    BaseRefNotFound {
        /// Repository the base was resolved against
        repo: String,
        /// Base ref that was requested
        base: String,
    },

    /// Branch creation lost a race with a concurrent creator.
    ///
    /// Recovered internally by `ensure_branch`; callers should not see it.
    #[error("branch {branch} already exists")]
    BranchExists {
        /// Branch name that already exists
        branch: String,
    },

    /// A branch expected to exist could not be resolved
    #[error("branch {branch} not found in {repo}")]
    BranchNotFound {
        /// Repository the branch was resolved against
        repo: String,
        /// Branch name that was requested
        branch: String,
    },

    /// A commit batch contained no changes
    #[error("commit batch contains no changes")]
    EmptyBatch,

    /// A commit batch contained the same path twice
    #[error("duplicate path in commit batch: {path}")]
    DuplicatePath {
        /// Offending path
        path: String,
    },

    /// A commit batch contained a path escaping the repository root
    #[error("path traversal in commit batch: {path}")]
    PathTraversal {
        /// Offending path
        path: String,
    },

    /// The branch head moved between observation and the ref update
    #[error("branch {branch} was updated concurrently")]
    ConcurrentBranchUpdate {
        /// Branch whose compare-and-swap was rejected
        branch: String,
    },

    /// Head and base repositories are neither identical nor fork-related
    #[error("{head} is not {base} and not a fork of it")]
    UnrelatedRepositories {
        /// Head repository of the proposed pull request
        head: String,
        /// Base repository of the proposed pull request
        base: String,
    },

    /// Head and base resolve to the same commit, nothing to propose
    #[error("no difference between {head} and {base}")]
    NoDiff {
        /// Head branch spec
        head: String,
        /// Base branch spec
        base: String,
    },

    /// A write operation against the hosting service failed
    #[error("remote write failed: {cause}")]
    RemoteWrite {
        /// Underlying cause reported by the client
        cause: String,
    },

    /// The hosting service refused the operation (403-class)
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// The hosting service could not find the target (404-class)
    #[error("not found: {0}")]
    NotFound(String),

    /// The hosting service reported a conflict (409/422-class)
    #[error("conflict: {0}")]
    Conflict(String),

    /// The hosting service is rate limiting us (429-class)
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Authentication error
    #[error("authentication error: {0}")]
    Auth(String),

    /// GitHub API error outside the mapped classes
    #[error("GitHub API error: {0}")]
    GitHubApi(String),

    /// The caller cancelled the operation
    #[error("operation cancelled")]
    Cancelled,

    /// Internal invariant violation
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error is a pre-flight validation failure.
    ///
    /// Validation failures are raised before any remote call is made, so no
    /// partial side effects exist when one is returned.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::EmptyBatch
                | Self::DuplicatePath { .. }
                | Self::PathTraversal { .. }
                | Self::UnrelatedRepositories { .. }
        )
    }
}

/// A workflow failure: which step failed and why.
///
/// Carried inside a [`crate::workflow::ContributionResult`] so callers see
/// the failing step together with everything that was already created.
#[derive(Debug, thiserror::Error)]
#[error("workflow failed at {step}: {error}")]
pub struct WorkflowFailure {
    /// The step the workflow was attempting to reach
    pub step: WorkflowStep,
    /// The underlying error
    #[source]
    pub error: Error,
}
