//! Workflow execution
//!
//! The orchestrator is a linear state machine with no backward transitions
//! and no rollback: a fork or branch created during a failed run stays in
//! place, because deleting a user's repository without explicit confirmation
//! is worse than a partially completed contribution.

use crate::branch::ensure_branch;
use crate::commit::{commit_batch, validate_changes};
use crate::error::{Error, Result, WorkflowFailure};
use crate::fork::{ForkPollPolicy, ensure_fork};
use crate::pr::{PullRequestSpec, compose_pull_request};
use crate::remote::RemoteRepository;
use crate::types::{
    BranchRef, CommitAuthor, CommitSpec, FileChange, PullRequest, RepoRef, Repository,
};
use crate::workflow::WorkflowProgress;
use std::fmt;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// A step of the contribution state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum WorkflowStep {
    /// A fork of the upstream exists and is ready (or the upstream itself
    /// is writable by the acting identity)
    ForkEnsured,
    /// The working branch exists in the head repository
    BranchEnsured,
    /// The batch commit landed on the working branch
    Committed,
    /// The pull request exists (created or reused)
    PrComposed,
}

impl fmt::Display for WorkflowStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ForkEnsured => "fork",
            Self::BranchEnsured => "branch",
            Self::Committed => "commit",
            Self::PrComposed => "pull request",
        };
        write!(f, "{name}")
    }
}

/// A single high-level contribution request
#[derive(Debug, Clone)]
pub struct ContributionRequest {
    /// Upstream repository the contribution targets
    pub upstream: RepoRef,
    /// Working branch name to create or reuse in the head repository
    pub branch: String,
    /// Base branch for the PR; the upstream default branch when `None`
    pub base_branch: Option<String>,
    /// File changes, applied as one commit
    pub changes: Vec<FileChange>,
    /// Commit message
    pub message: String,
    /// PR title
    pub title: String,
    /// PR body
    pub body: String,
    /// Commit author identity; the token identity when `None`
    pub author: Option<CommitAuthor>,
    /// Open the PR as a draft
    pub draft: bool,
    /// Bounds for fork readiness polling
    pub fork_poll: ForkPollPolicy,
}

/// Everything a contribution workflow produced, complete or not.
///
/// Built incrementally; returned even when a step fails so the caller can
/// see exactly how far the contribution got and decide whether to resume,
/// redo, or abandon.
#[derive(Debug, Default)]
pub struct ContributionResult {
    /// Head repository used for the contribution (fork or upstream itself)
    pub fork: Option<Repository>,
    /// Working branch in the head repository
    pub branch: Option<BranchRef>,
    /// The batch commit
    pub commit_sha: Option<String>,
    /// The pull request (created or reused)
    pub pull_request: Option<PullRequest>,
    /// Steps completed, in order
    pub steps_completed: Vec<WorkflowStep>,
    /// The step that failed, when the workflow did not finish
    pub failure: Option<WorkflowFailure>,
}

impl ContributionResult {
    /// Whether the workflow reached DONE
    #[must_use]
    pub const fn succeeded(&self) -> bool {
        self.failure.is_none()
    }

    fn fail(mut self, step: WorkflowStep, error: Error) -> Self {
        self.failure = Some(WorkflowFailure { step, error });
        self
    }
}

/// Run a contribution workflow end to end.
///
/// `identity` is the login the token acts as; it is passed explicitly so a
/// single process can run workflows for several identities. Batch validation
/// errors are returned as `Err` before any remote call. Failures in a remote
/// step are reported inside `Ok(result)` with `failure` set; the steps
/// already completed (and the fork/branch/commit they produced) stay in the
/// result. The cancellation token is checked between transitions and during
/// fork polling.
pub async fn run_workflow(
    remote: &dyn RemoteRepository,
    identity: &str,
    request: &ContributionRequest,
    progress: &dyn WorkflowProgress,
    cancel: &CancellationToken,
) -> Result<ContributionResult> {
    // Fail fast on malformed batches: no remote call has happened yet, so
    // an Err here guarantees zero side effects.
    validate_changes(&request.changes)?;

    let mut result = ContributionResult::default();

    // FORK_ENSURED
    let step = WorkflowStep::ForkEnsured;
    progress.on_step_started(step).await;
    if cancel.is_cancelled() {
        return Ok(result.fail(step, Error::Cancelled));
    }
    let head_repo = if request.upstream.owner == identity {
        // Contributing to a repository the identity already owns: no fork,
        // same-repository PR.
        debug!(upstream = %request.upstream, "identity owns upstream, skipping fork");
        remote.get_repository(&request.upstream).await
    } else {
        ensure_fork(
            remote,
            &request.upstream,
            identity,
            &request.fork_poll,
            progress,
            cancel,
        )
        .await
    };
    let head_repo = match head_repo {
        Ok(repo) => repo,
        Err(error) => return Ok(result.fail(step, error)),
    };
    result.fork = Some(head_repo.clone());
    result.steps_completed.push(step);
    progress.on_step_completed(step).await;

    // BRANCH_ENSURED
    let step = WorkflowStep::BranchEnsured;
    progress.on_step_started(step).await;
    if cancel.is_cancelled() {
        return Ok(result.fail(step, Error::Cancelled));
    }
    let branch = match ensure_branch(
        remote,
        &head_repo.repo,
        &request.branch,
        request.base_branch.as_deref(),
    )
    .await
    {
        Ok(branch) => branch,
        Err(error) => return Ok(result.fail(step, error)),
    };
    result.branch = Some(branch.clone());
    result.steps_completed.push(step);
    progress.on_step_completed(step).await;

    // COMMITTED
    let step = WorkflowStep::Committed;
    progress.on_step_started(step).await;
    if cancel.is_cancelled() {
        return Ok(result.fail(step, Error::Cancelled));
    }
    let spec = CommitSpec {
        branch: branch.clone(),
        changes: request.changes.clone(),
        message: request.message.clone(),
        author: request.author.clone(),
    };
    let commit_sha = match commit_batch(remote, &spec).await {
        Ok(sha) => sha,
        Err(error) => return Ok(result.fail(step, error)),
    };
    result.commit_sha = Some(commit_sha);
    result.steps_completed.push(step);
    progress.on_step_completed(step).await;

    // PR_COMPOSED
    let step = WorkflowStep::PrComposed;
    progress.on_step_started(step).await;
    if cancel.is_cancelled() {
        return Ok(result.fail(step, Error::Cancelled));
    }
    // The fallback base is the upstream's default branch as it is now. A
    // fork's copy only mirrors it at fork time and goes stale if the
    // upstream renames its default branch later.
    let base_branch = match &request.base_branch {
        Some(name) => name.clone(),
        None if head_repo.repo == request.upstream => head_repo.default_branch.clone(),
        None => match remote.get_repository(&request.upstream).await {
            Ok(upstream) => upstream.default_branch,
            Err(error) => return Ok(result.fail(step, error)),
        },
    };
    let pr_spec = PullRequestSpec {
        head: &branch,
        base_repo: &request.upstream,
        base_branch: &base_branch,
        title: &request.title,
        body: &request.body,
        draft: request.draft,
    };
    let pull_request = match compose_pull_request(remote, &pr_spec).await {
        Ok(pr) => pr,
        Err(error) => return Ok(result.fail(step, error)),
    };
    progress.on_pull_request(&pull_request).await;
    result.pull_request = Some(pull_request);
    result.steps_completed.push(step);
    progress.on_step_completed(step).await;

    Ok(result)
}
