//! Remote repository client
//!
//! A request/response façade over the hosting API's repository, branch,
//! commit, and pull-request endpoints. Workflow logic only ever talks to the
//! [`RemoteRepository`] trait, so tests can substitute an in-process remote.

mod github;

pub use github::GithubRemote;

use crate::error::Result;
use crate::types::{
    BranchRef, CommitAuthor, CommitInfo, PullRequest, RepoRef, Repository, TreeEntry, TreeWrite,
};
use async_trait::async_trait;

/// Remote repository operations
///
/// Each call is a blocking request/response exchange with the hosting
/// service. Implementations own retry/backoff for transient transport and
/// rate-limit failures and map service errors into the crate taxonomy
/// (403-class to `PermissionDenied`, 404 to `NotFound`, 409/422 to
/// `Conflict`). Semantic 4xx errors are never retried.
#[async_trait]
pub trait RemoteRepository: Send + Sync {
    /// Find a fork of `upstream` owned by `owner`, if one exists.
    ///
    /// Fork existence is re-queried every time it is needed; it can change
    /// out-of-band and is never cached locally.
    async fn find_fork(&self, upstream: &RepoRef, owner: &str) -> Result<Option<Repository>>;

    /// Request creation of a fork of `upstream` for the acting identity.
    ///
    /// Fork creation is asynchronous at the hosting service: a successful
    /// response does not mean the fork is ready yet.
    async fn create_fork(&self, upstream: &RepoRef) -> Result<Repository>;

    /// Get repository metadata
    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository>;

    /// Resolve a branch to its current head, `None` if the branch is absent
    async fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Option<BranchRef>>;

    /// Create a branch pointing at `sha`.
    ///
    /// Fails with `BranchExists` when creation races a concurrent creator.
    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<BranchRef>;

    /// Move a branch to `sha`.
    ///
    /// With `expected: Some(prior)` the update is a compare-and-swap against
    /// the previously observed head and fails with `ConcurrentBranchUpdate`
    /// if the branch moved. With `expected: None` the update is forced.
    async fn update_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        expected: Option<&str>,
    ) -> Result<BranchRef>;

    /// Get a commit and its root tree
    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<CommitInfo>;

    /// List a tree recursively
    async fn list_tree(&self, repo: &RepoRef, tree_sha: &str) -> Result<Vec<TreeEntry>>;

    /// Create a blob, returning its sha
    async fn create_blob(&self, repo: &RepoRef, content: &str) -> Result<String>;

    /// Create a tree from a base tree plus staged writes, returning its sha
    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        writes: &[TreeWrite],
    ) -> Result<String>;

    /// Create a commit with one parent, returning its sha
    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &str,
        parent: &str,
        author: Option<&CommitAuthor>,
    ) -> Result<String>;

    /// Create a pull request against `base_repo`.
    ///
    /// `head_spec` is `branch` for a same-repository PR or `owner:branch`
    /// for a cross-repository PR from a fork.
    async fn create_pull_request(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
        title: &str,
        body: &str,
        draft: bool,
    ) -> Result<PullRequest>;

    /// List open pull requests matching a head/base pair
    async fn list_open_pull_requests(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>>;
}
