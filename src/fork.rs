//! Fork state resolver
//!
//! Reconciles desired fork state with whatever already exists: reuse a fork
//! owned by the acting identity, or create one and wait for the service to
//! finish materializing it. Fork creation is asynchronous on GitHub; the
//! create call returns before the fork is clonable.

use crate::error::{Error, Result};
use crate::remote::RemoteRepository;
use crate::types::{RepoRef, Repository};
use crate::workflow::WorkflowProgress;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Bounds for fork readiness polling
#[derive(Debug, Clone)]
pub struct ForkPollPolicy {
    /// Maximum number of readiness checks before giving up
    pub max_attempts: u32,
    /// Delay before the first re-check; doubles per attempt
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl Default for ForkPollPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 10,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(10),
        }
    }
}

/// Ensure a fork of `upstream` exists for `identity` and is ready.
///
/// Idempotent: an existing fork is returned as-is and no second fork is ever
/// created. A newly requested fork is polled until its default branch
/// resolves, within the bounds of `policy`. The cancellation token is
/// honored between polling attempts.
pub async fn ensure_fork(
    remote: &dyn RemoteRepository,
    upstream: &RepoRef,
    identity: &str,
    policy: &ForkPollPolicy,
    progress: &dyn WorkflowProgress,
    cancel: &CancellationToken,
) -> Result<Repository> {
    if let Some(existing) = remote.find_fork(upstream, identity).await? {
        debug!(fork = %existing.repo, "reusing existing fork");
        return Ok(existing);
    }

    let fork = remote.create_fork(upstream).await.map_err(|err| match err {
        Error::PermissionDenied(reason) | Error::NotFound(reason) => Error::ForkCreationDenied {
            upstream: upstream.to_string(),
            reason,
        },
        other => other,
    })?;
    debug!(fork = %fork.repo, "fork creation requested");

    wait_until_ready(remote, &fork, policy, progress, cancel).await?;
    Ok(fork)
}

/// Poll until the fork's default branch resolves
async fn wait_until_ready(
    remote: &dyn RemoteRepository,
    fork: &Repository,
    policy: &ForkPollPolicy,
    progress: &dyn WorkflowProgress,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut delay = policy.initial_delay;

    for attempt in 1..=policy.max_attempts {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }
        progress.on_fork_poll(&fork.repo, attempt).await;

        match remote.get_branch(&fork.repo, &fork.default_branch).await {
            Ok(Some(_)) => {
                debug!(fork = %fork.repo, attempt, "fork is ready");
                return Ok(());
            }
            // Both "repo not there yet" and "ref not there yet" mean the
            // service is still copying objects.
            Ok(None) | Err(Error::NotFound(_)) => {}
            Err(err) => return Err(err),
        }

        if attempt < policy.max_attempts {
            tokio::select! {
                () = cancel.cancelled() => return Err(Error::Cancelled),
                () = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(policy.max_delay);
        }
    }

    Err(Error::ForkTimeout {
        fork: fork.repo.to_string(),
        attempts: policy.max_attempts,
    })
}
