//! Mock remote repository for testing
//!
//! An in-memory Git-like hosting service: repositories with branches,
//! commits, trees, and blobs, plus fork and pull-request state. Implements
//! `RemoteRepository` manually (rather than using a mocking framework) so
//! tests get call tracking, error injection, and a configurable fork
//! readiness delay.

#![allow(dead_code)]

use async_trait::async_trait;
use gh_contrib::error::{Error, Result};
use gh_contrib::remote::RemoteRepository;
use gh_contrib::types::{
    BranchRef, CommitAuthor, CommitInfo, PullRequest, RepoRef, Repository, TreeEntry, TreeWrite,
};
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

/// Call record for `create_branch`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBranchCall {
    pub repo: String,
    pub branch: String,
    pub sha: String,
}

/// Call record for `create_pull_request`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatePrCall {
    pub base_repo: String,
    pub head_spec: String,
    pub base_branch: String,
    pub title: String,
}

#[derive(Debug, Clone)]
struct MockCommit {
    tree: String,
    parent: Option<String>,
    message: String,
}

#[derive(Debug, Clone, Default)]
struct RepoState {
    default_branch: String,
    parent: Option<RepoRef>,
    private: bool,
    /// branch name -> head commit sha
    branches: HashMap<String, String>,
    /// commit sha -> commit
    commits: HashMap<String, MockCommit>,
    /// tree sha -> path -> blob sha
    trees: HashMap<String, BTreeMap<String, String>>,
    /// blob sha -> content
    blobs: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct StoredPr {
    base_repo: String,
    head_owner: String,
    head_branch: String,
    base_branch: String,
    open: bool,
    pr: PullRequest,
}

/// In-memory mock of the hosting service
pub struct MockRemote {
    /// Login the "token" acts as; forks are created under this owner
    identity: String,
    repos: Mutex<HashMap<String, RepoState>>,
    prs: Mutex<Vec<StoredPr>>,
    next_id: AtomicU64,
    next_pr_number: AtomicU64,
    // Call tracking
    calls: Mutex<Vec<String>>,
    fork_create_calls: Mutex<Vec<String>>,
    branch_create_calls: Mutex<Vec<CreateBranchCall>>,
    pr_create_calls: Mutex<Vec<CreatePrCall>>,
    // Behavior knobs
    fork_not_ready_polls: Mutex<HashMap<String, u32>>,
    error_on_update_branch: Mutex<Option<Error>>,
    error_on_create_pr: Mutex<Option<String>>,
    deny_fork: Mutex<Option<String>>,
    race_on_create_branch: Mutex<bool>,
}

impl MockRemote {
    /// Create a mock acting as `identity`
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_string(),
            repos: Mutex::new(HashMap::new()),
            prs: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            next_pr_number: AtomicU64::new(1),
            calls: Mutex::new(Vec::new()),
            fork_create_calls: Mutex::new(Vec::new()),
            branch_create_calls: Mutex::new(Vec::new()),
            pr_create_calls: Mutex::new(Vec::new()),
            fork_not_ready_polls: Mutex::new(HashMap::new()),
            error_on_update_branch: Mutex::new(None),
            error_on_create_pr: Mutex::new(None),
            deny_fork: Mutex::new(None),
            race_on_create_branch: Mutex::new(false),
        }
    }

    fn fresh_sha(&self, kind: &str) -> String {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        format!("{kind}-{id}")
    }

    fn record(&self, call: &str) {
        self.calls.lock().unwrap().push(call.to_string());
    }

    // === Seeding ===

    /// Seed a repository with a default branch containing `files`
    pub fn seed_repo(&self, spec: &str, default_branch: &str, files: &[(&str, &str)]) {
        let mut tree = BTreeMap::new();
        let mut blobs = HashMap::new();
        for (path, content) in files {
            let sha = self.fresh_sha("blob");
            blobs.insert(sha.clone(), (*content).to_string());
            tree.insert((*path).to_string(), sha);
        }

        let tree_sha = self.fresh_sha("tree");
        let commit_sha = self.fresh_sha("commit");
        let mut state = RepoState {
            default_branch: default_branch.to_string(),
            ..RepoState::default()
        };
        state.trees.insert(tree_sha.clone(), tree);
        state.commits.insert(
            commit_sha.clone(),
            MockCommit {
                tree: tree_sha,
                parent: None,
                message: "initial".to_string(),
            },
        );
        state
            .branches
            .insert(default_branch.to_string(), commit_sha);
        state.blobs = blobs;

        self.repos.lock().unwrap().insert(spec.to_string(), state);
    }

    // === Behavior knobs ===

    /// Make the next fork report "not ready" for the first `polls` checks
    pub fn set_fork_not_ready_polls(&self, spec: &str, polls: u32) {
        self.fork_not_ready_polls
            .lock()
            .unwrap()
            .insert(spec.to_string(), polls);
    }

    /// Make `update_branch` fail with the given error
    pub fn fail_update_branch(&self, error: Error) {
        *self.error_on_update_branch.lock().unwrap() = Some(error);
    }

    /// Make `create_pull_request` fail with a remote write error
    pub fn fail_create_pr(&self, msg: &str) {
        *self.error_on_create_pr.lock().unwrap() = Some(msg.to_string());
    }

    /// Make `create_fork` fail as if forking were forbidden
    pub fn deny_fork(&self, msg: &str) {
        *self.deny_fork.lock().unwrap() = Some(msg.to_string());
    }

    /// Make the next `create_branch` lose a creation race: the branch comes
    /// into existence (the concurrent winner's) but the call itself fails
    pub fn race_next_create_branch(&self) {
        *self.race_on_create_branch.lock().unwrap() = true;
    }

    /// Rename a repository's default branch, moving the ref with it
    pub fn rename_default_branch(&self, spec: &str, new_name: &str) {
        let mut repos = self.repos.lock().unwrap();
        let state = repos.get_mut(spec).expect("repository is seeded");
        let old = state.default_branch.clone();
        if let Some(sha) = state.branches.remove(&old) {
            state.branches.insert(new_name.to_string(), sha);
        }
        state.default_branch = new_name.to_string();
    }

    // === Inspection ===

    /// Names of every call made, in order
    pub fn call_log(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Upstream specs `create_fork` was called with
    pub fn fork_create_calls(&self) -> Vec<String> {
        self.fork_create_calls.lock().unwrap().clone()
    }

    /// All `create_branch` calls
    pub fn branch_create_calls(&self) -> Vec<CreateBranchCall> {
        self.branch_create_calls.lock().unwrap().clone()
    }

    /// All `create_pull_request` calls
    pub fn pr_create_calls(&self) -> Vec<CreatePrCall> {
        self.pr_create_calls.lock().unwrap().clone()
    }

    /// Current head sha of a branch
    pub fn branch_sha(&self, spec: &str, branch: &str) -> Option<String> {
        self.repos
            .lock()
            .unwrap()
            .get(spec)
            .and_then(|repo| repo.branches.get(branch).cloned())
    }

    /// Paths in the tree at a branch head
    pub fn tree_paths(&self, spec: &str, branch: &str) -> Vec<String> {
        let repos = self.repos.lock().unwrap();
        let Some(repo) = repos.get(spec) else {
            return Vec::new();
        };
        repo.branches
            .get(branch)
            .and_then(|sha| repo.commits.get(sha))
            .and_then(|commit| repo.trees.get(&commit.tree))
            .map(|tree| tree.keys().cloned().collect())
            .unwrap_or_default()
    }

    /// Blob content at a path in the tree at a branch head
    pub fn file_content(&self, spec: &str, branch: &str, path: &str) -> Option<String> {
        let repos = self.repos.lock().unwrap();
        let repo = repos.get(spec)?;
        let commit = repo.commits.get(repo.branches.get(branch)?)?;
        let blob_sha = repo.trees.get(&commit.tree)?.get(path)?;
        repo.blobs.get(blob_sha).cloned()
    }

    /// The commit message at a branch head
    pub fn head_message(&self, spec: &str, branch: &str) -> Option<String> {
        let repos = self.repos.lock().unwrap();
        let repo = repos.get(spec)?;
        let commit = repo.commits.get(repo.branches.get(branch)?)?;
        Some(commit.message.clone())
    }

    fn repository_model(&self, spec: &str, state: &RepoState) -> Repository {
        Repository {
            repo: spec.parse().expect("mock repo specs are owner/name"),
            default_branch: state.default_branch.clone(),
            parent: state.parent.clone(),
            private: state.private,
        }
    }
}

#[async_trait]
impl RemoteRepository for MockRemote {
    async fn find_fork(&self, upstream: &RepoRef, owner: &str) -> Result<Option<Repository>> {
        self.record("find_fork");
        let repos = self.repos.lock().unwrap();
        let fork = repos.iter().find(|(spec, state)| {
            spec.starts_with(&format!("{owner}/")) && state.parent.as_ref() == Some(upstream)
        });
        Ok(fork.map(|(spec, state)| self.repository_model(spec, state)))
    }

    async fn create_fork(&self, upstream: &RepoRef) -> Result<Repository> {
        self.record("create_fork");
        self.fork_create_calls
            .lock()
            .unwrap()
            .push(upstream.to_string());

        if let Some(msg) = self.deny_fork.lock().unwrap().as_ref() {
            return Err(Error::PermissionDenied(msg.clone()));
        }

        let mut repos = self.repos.lock().unwrap();
        let upstream_state = repos
            .get(&upstream.to_string())
            .ok_or_else(|| Error::NotFound(upstream.to_string()))?
            .clone();

        let fork_spec = format!("{}/{}", self.identity, upstream.name);
        let fork_state = repos.entry(fork_spec.clone()).or_insert_with(|| RepoState {
            parent: Some(upstream.clone()),
            ..upstream_state
        });
        Ok(self.repository_model(&fork_spec, fork_state))
    }

    async fn get_repository(&self, repo: &RepoRef) -> Result<Repository> {
        self.record("get_repository");
        let repos = self.repos.lock().unwrap();
        let state = repos
            .get(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        Ok(self.repository_model(&repo.to_string(), state))
    }

    async fn get_branch(&self, repo: &RepoRef, branch: &str) -> Result<Option<BranchRef>> {
        self.record("get_branch");
        let spec = repo.to_string();

        // Simulated propagation delay after fork creation
        {
            let mut pending = self.fork_not_ready_polls.lock().unwrap();
            if let Some(remaining) = pending.get_mut(&spec) {
                if *remaining > 0 {
                    *remaining -= 1;
                    return Ok(None);
                }
            }
        }

        let repos = self.repos.lock().unwrap();
        Ok(repos.get(&spec).and_then(|state| {
            state.branches.get(branch).map(|sha| BranchRef {
                repo: repo.clone(),
                name: branch.to_string(),
                sha: sha.clone(),
            })
        }))
    }

    async fn create_branch(&self, repo: &RepoRef, branch: &str, sha: &str) -> Result<BranchRef> {
        self.record("create_branch");
        self.branch_create_calls.lock().unwrap().push(CreateBranchCall {
            repo: repo.to_string(),
            branch: branch.to_string(),
            sha: sha.to_string(),
        });

        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;

        if state.branches.contains_key(branch) {
            return Err(Error::BranchExists {
                branch: branch.to_string(),
            });
        }
        if !state.commits.contains_key(sha) {
            return Err(Error::Conflict(format!("unknown sha {sha}")));
        }
        // Simulated lost race: a concurrent creator lands the branch first
        // and this call sees the resulting conflict
        if std::mem::take(&mut *self.race_on_create_branch.lock().unwrap()) {
            state.branches.insert(branch.to_string(), sha.to_string());
            return Err(Error::BranchExists {
                branch: branch.to_string(),
            });
        }
        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(BranchRef {
            repo: repo.clone(),
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn update_branch(
        &self,
        repo: &RepoRef,
        branch: &str,
        sha: &str,
        expected: Option<&str>,
    ) -> Result<BranchRef> {
        self.record("update_branch");

        if let Some(error) = self.error_on_update_branch.lock().unwrap().take() {
            return Err(error);
        }

        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        let current = state
            .branches
            .get(branch)
            .ok_or_else(|| Error::BranchNotFound {
                repo: repo.to_string(),
                branch: branch.to_string(),
            })?;

        if let Some(prior) = expected {
            if current != prior {
                return Err(Error::ConcurrentBranchUpdate {
                    branch: branch.to_string(),
                });
            }
        }

        state.branches.insert(branch.to_string(), sha.to_string());
        Ok(BranchRef {
            repo: repo.clone(),
            name: branch.to_string(),
            sha: sha.to_string(),
        })
    }

    async fn get_commit(&self, repo: &RepoRef, sha: &str) -> Result<CommitInfo> {
        self.record("get_commit");
        let repos = self.repos.lock().unwrap();
        let state = repos
            .get(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        let commit = state
            .commits
            .get(sha)
            .ok_or_else(|| Error::NotFound(format!("commit {sha}")))?;
        Ok(CommitInfo {
            sha: sha.to_string(),
            tree_sha: commit.tree.clone(),
        })
    }

    async fn list_tree(&self, repo: &RepoRef, tree_sha: &str) -> Result<Vec<TreeEntry>> {
        self.record("list_tree");
        let repos = self.repos.lock().unwrap();
        let state = repos
            .get(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        let tree = state
            .trees
            .get(tree_sha)
            .ok_or_else(|| Error::NotFound(format!("tree {tree_sha}")))?;
        Ok(tree
            .iter()
            .map(|(path, sha)| TreeEntry {
                path: path.clone(),
                kind: "blob".to_string(),
                sha: sha.clone(),
            })
            .collect())
    }

    async fn create_blob(&self, repo: &RepoRef, content: &str) -> Result<String> {
        self.record("create_blob");
        let sha = self.fresh_sha("blob");
        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        state.blobs.insert(sha.clone(), content.to_string());
        Ok(sha)
    }

    async fn create_tree(
        &self,
        repo: &RepoRef,
        base_tree: &str,
        writes: &[TreeWrite],
    ) -> Result<String> {
        self.record("create_tree");
        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        let mut tree = state
            .trees
            .get(base_tree)
            .ok_or_else(|| Error::NotFound(format!("tree {base_tree}")))?
            .clone();

        for write in writes {
            match &write.sha {
                Some(sha) => {
                    tree.insert(write.path.clone(), sha.clone());
                }
                None => {
                    tree.remove(&write.path);
                }
            }
        }

        let sha = self.fresh_sha("tree");
        state.trees.insert(sha.clone(), tree);
        Ok(sha)
    }

    async fn create_commit(
        &self,
        repo: &RepoRef,
        message: &str,
        tree: &str,
        parent: &str,
        _author: Option<&CommitAuthor>,
    ) -> Result<String> {
        self.record("create_commit");
        let sha = self.fresh_sha("commit");
        let mut repos = self.repos.lock().unwrap();
        let state = repos
            .get_mut(&repo.to_string())
            .ok_or_else(|| Error::NotFound(repo.to_string()))?;
        state.commits.insert(
            sha.clone(),
            MockCommit {
                tree: tree.to_string(),
                parent: Some(parent.to_string()),
                message: message.to_string(),
            },
        );
        Ok(sha)
    }

    async fn create_pull_request(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
        title: &str,
        body: &str,
        _draft: bool,
    ) -> Result<PullRequest> {
        self.record("create_pull_request");
        self.pr_create_calls.lock().unwrap().push(CreatePrCall {
            base_repo: base_repo.to_string(),
            head_spec: head_spec.to_string(),
            base_branch: base_branch.to_string(),
            title: title.to_string(),
        });

        if let Some(msg) = self.error_on_create_pr.lock().unwrap().as_ref() {
            return Err(Error::RemoteWrite { cause: msg.clone() });
        }

        // Creation accepts both forms; a bare branch name means a head in
        // the base repository itself
        let (head_owner, head_branch) = match head_spec.split_once(':') {
            Some((owner, branch)) => (owner.to_string(), branch.to_string()),
            None => (base_repo.owner.clone(), head_spec.to_string()),
        };

        let mut prs = self.prs.lock().unwrap();
        // GitHub rejects a second open PR for the same head/base pair
        if prs.iter().any(|stored| {
            stored.open
                && stored.base_repo == base_repo.to_string()
                && stored.head_owner == head_owner
                && stored.head_branch == head_branch
                && stored.base_branch == base_branch
        }) {
            return Err(Error::Conflict("pull request already exists".to_string()));
        }

        let number = self.next_pr_number.fetch_add(1, Ordering::SeqCst);
        let pr = PullRequest {
            number,
            html_url: format!("https://github.test/{base_repo}/pull/{number}"),
            base_ref: base_branch.to_string(),
            head_ref: head_spec.to_string(),
            title: title.to_string(),
            created_at: None,
        };
        let _ = body;
        prs.push(StoredPr {
            base_repo: base_repo.to_string(),
            head_owner,
            head_branch,
            base_branch: base_branch.to_string(),
            open: true,
            pr: pr.clone(),
        });
        Ok(pr)
    }

    async fn list_open_pull_requests(
        &self,
        base_repo: &RepoRef,
        head_spec: &str,
        base_branch: &str,
    ) -> Result<Vec<PullRequest>> {
        self.record("list_open_pull_requests");
        // Like GitHub, the head filter only works in the owner:branch form;
        // a bare branch name is silently ignored and the listing comes back
        // unfiltered
        let head_filter = head_spec.split_once(':');
        let prs = self.prs.lock().unwrap();
        Ok(prs
            .iter()
            .filter(|stored| {
                stored.open
                    && stored.base_repo == base_repo.to_string()
                    && stored.base_branch == base_branch
                    && head_filter.is_none_or(|(owner, branch)| {
                        stored.head_owner == owner && stored.head_branch == branch
                    })
            })
            .map(|stored| stored.pr.clone())
            .collect())
    }
}
