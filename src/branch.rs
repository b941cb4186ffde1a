//! Branch state resolver
//!
//! Reconciles a named branch with desired state: reuse it when it exists,
//! create it from a base ref when it does not. Resetting an existing branch
//! is an explicit, separate operation, never a side effect of `ensure`.

use crate::error::{Error, Result};
use crate::remote::RemoteRepository;
use crate::types::{BranchRef, RepoRef};
use tracing::debug;

/// Ensure `branch` exists in `repo`, returning its current head.
///
/// An existing branch is returned as-is. An absent branch is created from
/// `base` (a branch name; the repository's default branch when `None`).
/// Losing a creation race to a concurrent creator is recovered by
/// re-resolving, which makes the operation safe under concurrent retries.
pub async fn ensure_branch(
    remote: &dyn RemoteRepository,
    repo: &RepoRef,
    branch: &str,
    base: Option<&str>,
) -> Result<BranchRef> {
    if let Some(existing) = remote.get_branch(repo, branch).await? {
        debug!(repo = %repo, branch, sha = %existing.sha, "reusing existing branch");
        return Ok(existing);
    }

    let base_name = match base {
        Some(name) => name.to_string(),
        None => remote.get_repository(repo).await?.default_branch,
    };

    let base_ref = remote
        .get_branch(repo, &base_name)
        .await?
        .ok_or_else(|| Error::BaseRefNotFound {
            repo: repo.to_string(),
            base: base_name.clone(),
        })?;

    match remote.create_branch(repo, branch, &base_ref.sha).await {
        Ok(created) => {
            debug!(repo = %repo, branch, base = %base_name, "created branch");
            Ok(created)
        }
        Err(Error::BranchExists { .. }) => {
            // Lost the race; whoever won defined the branch.
            debug!(repo = %repo, branch, "branch created concurrently, re-resolving");
            remote
                .get_branch(repo, branch)
                .await?
                .ok_or_else(|| Error::BranchNotFound {
                    repo: repo.to_string(),
                    branch: branch.to_string(),
                })
        }
        Err(err) => Err(err),
    }
}

/// Force an existing branch to point at `sha`.
///
/// This discards whatever the branch pointed at before. Callers must treat
/// it as a distinct, deliberate operation; `ensure_branch` never resets.
pub async fn reset_branch(
    remote: &dyn RemoteRepository,
    repo: &RepoRef,
    branch: &str,
    sha: &str,
) -> Result<BranchRef> {
    remote
        .get_branch(repo, branch)
        .await?
        .ok_or_else(|| Error::BranchNotFound {
            repo: repo.to_string(),
            branch: branch.to_string(),
        })?;

    remote.update_branch(repo, branch, sha, None).await
}
