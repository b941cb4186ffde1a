//! Cross-repository pull request composer
//!
//! Builds a pull request spanning a head repository+branch (possibly a
//! fork) and a base repository+branch (possibly upstream), after checking
//! that the two are compatibly related. Looks for an already-open PR before
//! creating one, so re-running a workflow converges on the same PR.

use crate::error::{Error, Result};
use crate::remote::RemoteRepository;
use crate::types::{BranchRef, PullRequest, RepoRef};
use tracing::debug;

/// Request to compose a pull request
#[derive(Debug, Clone)]
pub struct PullRequestSpec<'a> {
    /// Head branch (the proposed changes)
    pub head: &'a BranchRef,
    /// Base repository the PR targets
    pub base_repo: &'a RepoRef,
    /// Base branch within the base repository
    pub base_branch: &'a str,
    /// PR title
    pub title: &'a str,
    /// PR body
    pub body: &'a str,
    /// Whether to open as a draft
    pub draft: bool,
}

/// The head spec GitHub expects: `branch` within one repository,
/// `owner:branch` across a fork boundary.
fn head_spec(head: &BranchRef, base_repo: &RepoRef) -> String {
    if head.repo == *base_repo {
        head.name.clone()
    } else {
        format!("{}:{}", head.repo.owner, head.name)
    }
}

/// Compose a pull request, reusing an open one for the same head/base pair.
///
/// Rejects unrelated head/base repositories with `UnrelatedRepositories`
/// before attempting creation, instead of surfacing an opaque remote
/// rejection. Fails with `NoDiff` when head and base sit on the same commit.
pub async fn compose_pull_request(
    remote: &dyn RemoteRepository,
    spec: &PullRequestSpec<'_>,
) -> Result<PullRequest> {
    let head = spec.head;
    if head.repo != *spec.base_repo {
        // The fork relationship is re-derived from the service each time;
        // it can change out-of-band and is never cached.
        let head_repo = remote.get_repository(&head.repo).await?;
        if !head_repo.is_fork_of(spec.base_repo) {
            return Err(Error::UnrelatedRepositories {
                head: head.repo.to_string(),
                base: spec.base_repo.to_string(),
            });
        }
    }

    let head_spec = head_spec(head, spec.base_repo);

    let head_sha = remote
        .get_branch(&head.repo, &head.name)
        .await?
        .ok_or_else(|| Error::BranchNotFound {
            repo: head.repo.to_string(),
            branch: head.name.clone(),
        })?
        .sha;
    let base_sha = remote
        .get_branch(spec.base_repo, spec.base_branch)
        .await?
        .ok_or_else(|| Error::BranchNotFound {
            repo: spec.base_repo.to_string(),
            branch: spec.base_branch.to_string(),
        })?
        .sha;
    if head_sha == base_sha {
        return Err(Error::NoDiff {
            head: head_spec,
            base: format!("{}:{}", spec.base_repo, spec.base_branch),
        });
    }

    if let Some(existing) = find_open(remote, spec).await? {
        debug!(number = existing.number, "reusing open pull request");
        return Ok(existing);
    }

    match remote
        .create_pull_request(
            spec.base_repo,
            &head_spec,
            spec.base_branch,
            spec.title,
            spec.body,
            spec.draft,
        )
        .await
    {
        Ok(pr) => Ok(pr),
        // Lost a race with a concurrent composer; the open PR is the result.
        Err(Error::Conflict(_)) => find_open(remote, spec)
            .await?
            .ok_or_else(|| Error::Internal("duplicate pull request vanished".to_string())),
        Err(err) => Err(err),
    }
}

/// Look for an open pull request for the head/base pair.
///
/// The service's head filter only honors the `owner:branch` form; a bare
/// branch name is silently ignored and the listing comes back unfiltered.
/// The filter is therefore always owner-qualified, even within one
/// repository, while creation keeps the bare name.
async fn find_open(
    remote: &dyn RemoteRepository,
    spec: &PullRequestSpec<'_>,
) -> Result<Option<PullRequest>> {
    let filter = format!("{}:{}", spec.head.repo.owner, spec.head.name);
    let open = remote
        .list_open_pull_requests(spec.base_repo, &filter, spec.base_branch)
        .await?;
    Ok(open.into_iter().next())
}
