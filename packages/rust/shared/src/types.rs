//! Core domain types for deploynote.

use serde::{Deserialize, Serialize};

use crate::error::{DeployNoteError, Result};

// ---------------------------------------------------------------------------
// RepoTarget
// ---------------------------------------------------------------------------

/// An `owner/name` repository pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoTarget {
    /// Repository owner (user or organization).
    pub owner: String,
    /// Repository name.
    pub name: String,
}

impl RepoTarget {
    /// Parse an `owner/name` string.
    pub fn parse(s: &str) -> Result<Self> {
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(DeployNoteError::config(format!(
                "invalid repository '{s}': expected owner/name"
            ))),
        }
    }
}

impl std::fmt::Display for RepoTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

// ---------------------------------------------------------------------------
// ChangeContext
// ---------------------------------------------------------------------------

/// Normalized metadata for one change request, assembled once per run and
/// read-only thereafter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeContext {
    /// Pull request title.
    pub title: String,
    /// Pull request description; empty when the author provided none.
    #[serde(default)]
    pub body: String,
    /// Pull request number.
    pub number: u64,
    /// Web URL of the pull request.
    pub url: String,
    /// Commit messages, in the host's ordering.
    pub commit_messages: Vec<String>,
    /// Changed file paths, in the host's ordering.
    pub changed_files: Vec<String>,
    /// Head branch name.
    pub branch: String,
    /// Head commit SHA.
    pub head_sha: String,
}
