//! GitHub implementation of the remote repository client

use crate::error::{Error, Result};
use crate::remote::RemoteRepository;
use crate::types::{
    BranchRef, CommitAuthor, CommitInfo, PullRequest, RepoRef, Repository, TreeEntry, TreeWrite,
};
use async_trait::async_trait;
use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use octocrab::Octocrab;
use serde::Deserialize;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// Retry policy for transient remote failures.
///
/// Applies to transport errors, 5xx responses, and rate-limit responses.
/// Semantic 4xx errors are never retried.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Maximum number of attempts per request
    pub max_attempts: u32,
    /// Delay before the first retry; doubles per attempt
    pub initial_delay: Duration,
    /// Upper bound on the backoff delay
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(5),
        }
    }
}

/// GitHub remote using octocrab
pub struct GithubRemote {
    client: Octocrab,
    retry: RetryPolicy,
}

impl GithubRemote {
    /// Create a new GitHub remote with a personal token.
    ///
    /// `host` selects a GitHub Enterprise instance; `None` means github.com.
    pub fn new(token: &str, host: Option<&str>) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token.to_string());

        if let Some(h) = host {
            let base_url = format!("https://{h}/api/v3");
            builder = builder
                .base_uri(&base_url)
                .map_err(|e| Error::GitHubApi(e.to_string()))?;
        }

        let client = builder.build().map_err(|e| Error::GitHubApi(e.to_string()))?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
        })
    }

    /// Override the retry policy
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Issue a request with bounded retries on transient failures
    async fn request<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T>
    where
        F: FnMut() -> Fut + Send,
        Fut: Future<Output = octocrab::Result<T>> + Send,
        T: Send,
    {
        let mut delay = self.retry.initial_delay;
        let mut attempt: u32 = 1;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(err) if attempt < self.retry.max_attempts && is_transient(&err) => {
                    warn!(operation, attempt, "transient GitHub error, retrying: {err}");
                    tokio::time::sleep(delay).await;
                    delay = (delay * 2).min(self.retry.max_delay);
                    attempt += 1;
                }
                Err(err) => return Err(classify(&err)),
            }
        }
    }
}

/// Whether an octocrab error is worth retrying
fn is_transient(err: &octocrab::Error) -> bool {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let code = source.status_code.as_u16();
            code == 429 || code >= 500 || (code == 403 && is_rate_limit_message(&source.message))
        }
        // Everything else is transport- or decode-level; retries are bounded
        // either way.
        _ => true,
    }
}

fn is_rate_limit_message(message: &str) -> bool {
    let lower = message.to_ascii_lowercase();
    lower.contains("rate limit") || lower.contains("abuse")
}

/// Map an octocrab error into the crate taxonomy by status class
fn classify(err: &octocrab::Error) -> Error {
    match err {
        octocrab::Error::GitHub { source, .. } => {
            let message = source.message.clone();
            match source.status_code.as_u16() {
                403 if is_rate_limit_message(&message) => Error::RateLimited(message),
                401 | 403 => Error::PermissionDenied(message),
                404 => Error::NotFound(message),
                409 | 422 => Error::Conflict(message),
                429 => Error::RateLimited(message),
                _ => Error::GitHubApi(message),
            }
        }
        other => Error::GitHubApi(other.to_string()),
    }
}

/// Percent-encode a ref name for use in a route, preserving `/` separators
fn escape_ref(name: &str) -> String {
    name.split('/')
        .map(|segment| urlencoding::encode(segment).into_owned())
        .collect::<Vec<_>>()
        .join("/")
}

/// Parse a service repository payload into the typed model.
///
/// Raw response data never crosses this boundary; missing fields are
/// rejected here instead of surfacing as broken workflow state.
fn parse_repository(repo: &octocrab::models::Repository) -> Result<Repository> {
    let owner = repo
        .owner
        .as_ref()
        .map(|o| o.login.clone())
        .ok_or_else(|| Error::GitHubApi("repository response missing owner".to_string()))?;
    let default_branch = repo
        .default_branch
        .clone()
        .ok_or_else(|| Error::GitHubApi("repository response missing default branch".to_string()))?;
    let parent = repo
        .parent
        .as_deref()
        .and_then(|p| p.owner.as_ref().map(|o| RepoRef::new(o.login.clone(), p.name.clone())));

    Ok(Repository {
        repo: RepoRef::new(owner, repo.name.clone()),
        default_branch,
        parent,
        private: repo.private.unwrap_or(false),
    })
}

fn parse_pull_request(pr: &octocrab::models::pulls::PullRequest) -> PullRequest {
    PullRequest {
        number: pr.number,
        html_url: pr
            .html_url
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default(),
        base_ref: pr.base.ref_field.clone(),
        head_ref: pr.head.ref_field.clone(),
        title: pr.title.as_deref().unwrap_or_default().to_string(),
        created_at: pr.created_at,
    }
}

// Boundary structs for the git-data endpoints. octocrab exposes no typed
// handlers for these, so responses are deserialized into exactly the fields
// the workflow needs.

#[derive(Debug, Deserialize)]
struct GitRefResponse {
    object: GitObjectResponse,
}

#[derive(Debug, Deserialize)]
struct GitObjectResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct BlobResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeShaResponse {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct TreeListResponse {
    tree: Vec<TreeListEntry>,
    #[serde(default)]
    truncated: bool,
}

#[derive(Debug, Deserialize)]
struct TreeListEntry {
    path: String,
    #[serde(rename = "type")]
    kind: String,
    sha: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GitCommitResponse {
    sha: String,
    tree: TreeShaResponse,
}

#[async_trait]
impl RemoteRepository for GithubRemote {
    async fn find_fork(&self, upstream: &RepoRef, owner: &str) -> Result<Option<Repository>> {
        // A fork keeps the upstream name unless the user renamed it; the
        // candidate is confirmed by its parent link, never by name alone.
        let candidate = RepoRef::new(owner, upstream.name.clone());
        match self.get_repository(&candidate).await {
            Ok(repo) if repo.is_fork_of(upstream) => Ok(Some(repo)),
            Ok(_) | Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_fork(&self, upstream: &RepoRef) -> Result<Repository> {
        let handler = self.client.repos(&upstream.owner, &upstream.name);
        let repo = self
            .request("create fork", || handler.create_fork().send())
            .await?;
        parse_repository(&repo)
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository> {
        let handler = self.client.repos(&repo.owner, &repo.name);
        let response = self.request("get repository", || handler.get()).await?;
        parse_repository(&response)
    }

    async fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Option<BranchRef>> {
        let route = format!(
            "/repos/{}/{}/git/ref/heads/{}",
            repo.owner,
            repo.name,
            escape_ref(branch)
        );
        let result = self
            .request("get branch", || {
                self.client.get::<GitRefResponse, _, _>(&route, None::<&()>)
            })
            .await;

        match result {
            Ok(reference) => Ok(Some(BranchRef {
                repo: repo.clone(),
                name: branch.to_string(),
                sha: reference.object.sha,
            })),
            Err(Error::NotFound(_)) => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<BranchRef> {
        let route = format!("/repos/{}/{}/git/refs", repo.owner, repo.name);
        let body = serde_json::json!({
            "ref": format!("refs/heads/{branch}"),
            "sha": sha,
        });
        let result = self
            .request("create branch", || {
                self.client.post::<_, GitRefResponse>(&route, Some(&body))
            })
            .await;

        match result {
            Ok(reference) => Ok(BranchRef {
                repo: repo.clone(),
                name: branch.to_string(),
                sha: reference.object.sha,
            }),
            Err(Error::Conflict(_)) => Err(Error::BranchExists {
                branch: branch.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn update_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        expected: Option<&str>,
    ) -> Result<BranchRef> {
        // GitHub has no literal compare-and-swap on refs. A non-forced
        // update is rejected unless it is a fast-forward from the current
        // head, which detects any concurrent move of the branch; the
        // explicit head check below closes the remaining window where the
        // branch was force-moved to an ancestor.
        if let Some(prior) = expected {
            let current = self
                .get_branch(repo, branch)
                .await?
                .ok_or_else(|| Error::BranchNotFound {
                    repo: repo.to_string(),
                    branch: branch.to_string(),
                })?;
            if current.sha != prior {
                return Err(Error::ConcurrentBranchUpdate {
                    branch: branch.to_string(),
                });
            }
        }

        let route = format!(
            "/repos/{}/{}/git/refs/heads/{}",
            repo.owner,
            repo.name,
            escape_ref(branch)
        );
        let body = serde_json::json!({
            "sha": sha,
            "force": expected.is_none(),
        });
        let result = self
            .request("update branch", || {
                self.client.patch::<GitRefResponse, _, _>(&route, Some(&body))
            })
            .await;

        match result {
            Ok(reference) => Ok(BranchRef {
                repo: repo.clone(),
                name: branch.to_string(),
                sha: reference.object.sha,
            }),
            Err(Error::Conflict(_)) if expected.is_some() => Err(Error::ConcurrentBranchUpdate {
                branch: branch.to_string(),
            }),
            Err(err) => Err(err),
        }
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<CommitInfo> {
        let route = format!("/repos/{}/{}/git/commits/{sha}", repo.owner, repo.name);
        let commit = self
            .request("get commit", || {
                self.client.get::<GitCommitResponse, _, _>(&route, None::<&()>)
            })
            .await?;
        Ok(CommitInfo {
            sha: commit.sha,
            tree_sha: commit.tree.sha,
        })
    }

    async fn list_tree(&self, repo: &RepoRef, tree_sha: &str) -> Result<Vec<TreeEntry>> {
        let route = format!(
            "/repos/{}/{}/git/trees/{tree_sha}?recursive=1",
            repo.owner, repo.name
        );
        let listing = self
            .request("list tree", || {
                self.client.get::<TreeListResponse, _, _>(&route, None::<&()>)
            })
            .await?;

        if listing.truncated {
            warn!(repo = %repo, tree_sha, "tree listing truncated by the service");
        }

        Ok(listing
            .tree
            .into_iter()
            .filter_map(|entry| {
                entry.sha.map(|sha| TreeEntry {
                    path: entry.path,
                    kind: entry.kind,
                    sha,
                })
            })
            .collect())
    }

    async fn create_blob(&self, repo: &RepoRef, content: &str) -> Result<String> {
        let route = format!("/repos/{}/{}/git/blobs", repo.owner, repo.name);
        let body = serde_json::json!({
            "content": BASE64.encode(content),
            "encoding": "base64",
        });
        let blob = self
            .request("create blob", || {
                self.client.post::<_, BlobResponse>(&route, Some(&body))
            })
            .await?;
        Ok(blob.sha)
    }

    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        writes: &[TreeWrite],
    ) -> Result<String> {
        let entries: Vec<serde_json::Value> = writes
            .iter()
            .map(|write| {
                serde_json::json!({
                    "path": write.path,
                    "mode": write.mode,
                    "type": "blob",
                    // null sha tombstones the path in the new tree
                    "sha": write.sha,
                })
            })
            .collect();

        let route = format!("/repos/{}/{}/git/trees", repo.owner, repo.name);
        let body = serde_json::json!({
            "base_tree": base_tree,
            "tree": entries,
        });
        let tree = self
            .request("create tree", || {
                self.client.post::<_, TreeShaResponse>(&route, Some(&body))
            })
            .await?;
        Ok(tree.sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &str,
        parent: &str,
        author: Option<&CommitAuthor>,
    ) -> Result<String> {
        let mut body = serde_json::json!({
            "message": message,
            "tree": tree,
            "parents": [parent],
        });
        if let Some(author) = author {
            body["author"] = serde_json::json!({
                "name": author.name,
                "email": author.email,
                "date": chrono::Utc::now().to_rfc3339(),
            });
        }

        let route = format!("/repos/{}/{}/git/commits", repo.owner, repo.name);
        let commit = self
            .request("create commit", || {
                self.client.post::<_, GitCommitResponse>(&route, Some(&body))
            })
            .await?;
        debug!(repo = %repo, sha = %commit.sha, "created commit");
        Ok(commit.sha)
    }

    async fn create_pull_request(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
        title: &str,
        body: &str,
        draft: bool,
    ) -> Result<PullRequest> {
        let handler = self.client.pulls(&base_repo.owner, &base_repo.name);
        let pr = self
            .request("create pull request", || {
                handler
                    .create(title, head_spec, base_branch)
                    .body(body)
                    .draft(draft)
                    .send()
            })
            .await?;
        Ok(parse_pull_request(&pr))
    }

    async fn list_open_pull_requests(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>> {
        let handler = self.client.pulls(&base_repo.owner, &base_repo.name);
        let prs = self
            .request("list pull requests", || {
                handler
                    .list()
                    .head(head_spec)
                    .base(base_branch)
                    .state(octocrab::params::State::Open)
                    .send()
            })
            .await?;
        Ok(prs.items.iter().map(parse_pull_request).collect())
    }
}
