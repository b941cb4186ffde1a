//! Batch commit builder
//!
//! Composes an atomic, single-commit change touching an arbitrary set of
//! file additions, modifications, and deletions. Per-file commit endpoints
//! would leave the branch half-updated if a later file failed; this builder
//! constructs the whole new tree first and advances the branch ref exactly
//! once, with a compare-and-swap against the observed head.

use crate::error::{Error, Result};
use crate::remote::RemoteRepository;
use crate::types::{CommitSpec, FileChange, FileMode, TreeWrite};
use std::collections::HashSet;
use tracing::debug;

/// Placeholder file name for empty directory markers
const DIRECTORY_PLACEHOLDER: &str = ".gitkeep";

/// A validated change with its effective tree path
#[derive(Debug, Clone)]
struct StagedChange {
    /// Path of the entry that will appear in the tree
    tree_path: String,
    /// Content to store; `None` tombstones the path
    content: Option<String>,
    /// Git mode string
    mode: &'static str,
}

/// Normalize and check a single change path.
///
/// Rejects empty paths, absolute paths, `.`/`..` segments, and empty
/// segments. Returns the normalized path without a trailing slash.
fn normalize_path(change: &FileChange) -> Result<String> {
    let raw = change.path.trim_end_matches('/');
    if raw.is_empty() || change.path.starts_with('/') {
        return Err(Error::PathTraversal {
            path: change.path.clone(),
        });
    }
    for segment in raw.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(Error::PathTraversal {
                path: change.path.clone(),
            });
        }
    }
    Ok(raw.to_string())
}

/// Validate a batch and resolve each change to its staged form.
///
/// Runs before any remote call: a batch that fails here has produced no
/// side effects anywhere.
fn validate(changes: &[FileChange]) -> Result<Vec<StagedChange>> {
    if changes.is_empty() {
        return Err(Error::EmptyBatch);
    }

    let mut seen: HashSet<String> = HashSet::new();
    let mut staged = Vec::with_capacity(changes.len());

    for change in changes {
        let path = normalize_path(change)?;
        let (tree_path, content) = match change.mode {
            FileMode::Directory => (
                format!("{path}/{DIRECTORY_PLACEHOLDER}"),
                Some(String::new()),
            ),
            FileMode::Regular | FileMode::Executable => (path, change.content.clone()),
        };

        // Duplicates are a validation error, not last-write-wins; checked on
        // the effective tree path so a directory marker cannot silently
        // collide with an explicit placeholder write.
        if !seen.insert(tree_path.clone()) {
            return Err(Error::DuplicatePath { path: tree_path });
        }

        staged.push(StagedChange {
            tree_path,
            content,
            mode: change.mode.as_git_mode(),
        });
    }

    Ok(staged)
}

/// Validate a batch without staging it.
///
/// Used by the orchestrator to reject malformed batches before the first
/// remote call of the workflow.
pub fn validate_changes(changes: &[FileChange]) -> Result<()> {
    validate(changes).map(|_| ())
}

/// Apply a commit spec as one commit and advance the branch.
///
/// Returns the new commit sha. If the branch head moves between observation
/// and the ref update, fails with `ConcurrentBranchUpdate` and leaves the
/// branch untouched; merge semantics are the caller's decision, never this
/// builder's.
pub async fn commit_batch(remote: &dyn RemoteRepository, spec: &CommitSpec) -> Result<String> {
    let staged = validate(&spec.changes)?;

    // Re-resolve the head instead of trusting the sha the caller observed
    // earlier; it may have been invalidated by an intervening commit.
    let repo = &spec.branch.repo;
    let head = remote
        .get_branch(repo, &spec.branch.name)
        .await?
        .ok_or_else(|| Error::BranchNotFound {
            repo: repo.to_string(),
            branch: spec.branch.name.clone(),
        })?;
    let base = remote.get_commit(repo, &head.sha).await?;

    // Deleting a path the base tree does not contain is a no-op, not an
    // error; the listing is fetched only when the batch deletes anything.
    let deletions_present = staged.iter().any(|change| change.content.is_none());
    let existing_paths: HashSet<String> = if deletions_present {
        remote
            .list_tree(repo, &base.tree_sha)
            .await?
            .into_iter()
            .filter(|entry| entry.kind == "blob")
            .map(|entry| entry.path)
            .collect()
    } else {
        HashSet::new()
    };

    let mut writes: Vec<TreeWrite> = Vec::with_capacity(staged.len());
    for change in &staged {
        match &change.content {
            Some(content) => {
                let sha = remote.create_blob(repo, content).await?;
                writes.push(TreeWrite {
                    path: change.tree_path.clone(),
                    mode: change.mode,
                    sha: Some(sha),
                });
            }
            None => {
                if existing_paths.contains(&change.tree_path) {
                    writes.push(TreeWrite {
                        path: change.tree_path.clone(),
                        mode: change.mode,
                        sha: None,
                    });
                } else {
                    debug!(path = %change.tree_path, "skipping deletion of absent path");
                }
            }
        }
    }

    // A batch may reduce to nothing (every deletion was a no-op). The tree
    // endpoint rejects an empty entry list, so commit the base tree itself.
    let tree_sha = if writes.is_empty() {
        base.tree_sha.clone()
    } else {
        remote.create_tree(repo, &base.tree_sha, &writes).await?
    };
    let commit_sha = remote
        .create_commit(
            repo,
            &spec.message,
            &tree_sha,
            &head.sha,
            spec.author.as_ref(),
        )
        .await?;

    // Single ref advance, compare-and-swap against the head observed above.
    remote
        .update_branch(repo, &spec.branch.name, &commit_sha, Some(&head.sha))
        .await?;

    debug!(repo = %repo, branch = %spec.branch.name, sha = %commit_sha, "batch committed");
    Ok(commit_sha)
}
