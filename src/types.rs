//! Core types for gh-contrib

use crate::error::Error;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A repository identified by owner and name
#[derive(Debug, Clone, Hash, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoRef {
    /// Repository owner (user or organization)
    pub owner: String,
    /// Repository name
    pub name: String,
}

impl RepoRef {
    /// Create a repository reference from owner and name
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for RepoRef {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Self::new(owner, name))
            }
            _ => Err(Error::Internal(format!(
                "invalid repository spec {s:?}, expected owner/name"
            ))),
        }
    }
}

/// A resolved branch head within a repository.
///
/// The sha is only valid at the moment of resolution; components re-resolve
/// before acting on it rather than caching across mutating calls.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BranchRef {
    /// Repository containing the branch
    pub repo: RepoRef,
    /// Branch name
    pub name: String,
    /// Commit sha the branch pointed at when resolved
    pub sha: String,
}

/// Repository metadata as reported by the hosting service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Repository {
    /// The repository itself
    pub repo: RepoRef,
    /// Default branch name (main/master)
    pub default_branch: String,
    /// Parent repository, when this repository is a fork
    pub parent: Option<RepoRef>,
    /// Whether the repository is private
    pub private: bool,
}

impl Repository {
    /// Whether this repository is a fork of `upstream`
    #[must_use]
    pub fn is_fork_of(&self, upstream: &RepoRef) -> bool {
        self.parent.as_ref() == Some(upstream)
    }
}

/// File mode for a staged change
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum FileMode {
    /// Regular file (100644)
    #[default]
    Regular,
    /// Executable file (100755)
    Executable,
    /// Empty directory marker, staged as a `.gitkeep` placeholder blob
    Directory,
}

impl FileMode {
    /// Git tree mode string for this file mode
    #[must_use]
    pub const fn as_git_mode(self) -> &'static str {
        match self {
            Self::Regular | Self::Directory => "100644",
            Self::Executable => "100755",
        }
    }
}

/// A single atomic mutation within a tree
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
    /// Repository-relative path, normalized (no `..`, no leading `/`)
    pub path: String,
    /// New file content; `None` means deletion
    pub content: Option<String>,
    /// File mode
    #[serde(default)]
    pub mode: FileMode,
}

impl FileChange {
    /// Add or update a regular file
    pub fn write(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: Some(content.into()),
            mode: FileMode::Regular,
        }
    }

    /// Delete a file
    pub fn delete(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            mode: FileMode::Regular,
        }
    }

    /// Create an empty directory marker
    pub fn directory(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: None,
            mode: FileMode::Directory,
        }
    }

    /// Whether this change deletes a path
    #[must_use]
    pub const fn is_deletion(&self) -> bool {
        self.content.is_none() && !matches!(self.mode, FileMode::Directory)
    }
}

/// Author identity for a commit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitAuthor {
    /// Author name
    pub name: String,
    /// Author email
    pub email: String,
}

/// One atomic multi-file commit request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitSpec {
    /// Target branch; its head is re-resolved before committing
    pub branch: BranchRef,
    /// Changes to apply, all in one commit
    pub changes: Vec<FileChange>,
    /// Commit message
    pub message: String,
    /// Author identity; the token identity is used when absent
    pub author: Option<CommitAuthor>,
}

/// A commit as reported by the hosting service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CommitInfo {
    /// Commit sha
    pub sha: String,
    /// Root tree sha of the commit
    pub tree_sha: String,
}

/// An entry in an existing tree listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TreeEntry {
    /// Repository-relative path
    pub path: String,
    /// Entry type as reported by the service (`blob`, `tree`)
    pub kind: String,
    /// Object sha
    pub sha: String,
}

/// A staged write for tree construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeWrite {
    /// Repository-relative path
    pub path: String,
    /// Git mode string (100644/100755)
    pub mode: &'static str,
    /// Blob sha for additions; `None` tombstones the path
    pub sha: Option<String>,
}

/// A pull request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PullRequest {
    /// PR number
    pub number: u64,
    /// Web URL for the PR
    pub html_url: String,
    /// Base branch name
    pub base_ref: String,
    /// Head branch spec (`branch` or `owner:branch`)
    pub head_ref: String,
    /// PR title
    pub title: String,
    /// When the PR was created
    pub created_at: Option<DateTime<Utc>>,
}
