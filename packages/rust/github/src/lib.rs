//! Source-control host collaborator for deploynote.
//!
//! [`SourceHost`] is the seam the pipeline depends on; [`GitHubClient`] is
//! the production implementation against the GitHub REST v3 API. Tests
//! inject in-memory fakes instead.
//!
//! Six operations are consumed: pull-request metadata, changed file paths,
//! commit messages, file reads (content plus the blob SHA concurrency
//! token), conditional file writes, and issue comments.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};
use url::Url;

use deploynote_shared::{DeployNoteError, RepoTarget, Result};

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Pull-request metadata subset consumed by the pipeline.
#[derive(Debug, Clone, Deserialize)]
pub struct PullRequest {
    pub number: u64,
    pub title: String,
    #[serde(default)]
    pub body: Option<String>,
    pub html_url: String,
    pub head: HeadRef,
}

/// Head branch reference of a pull request.
#[derive(Debug, Clone, Deserialize)]
pub struct HeadRef {
    #[serde(rename = "ref")]
    pub branch: String,
    pub sha: String,
}

#[derive(Debug, Deserialize)]
struct FileEntry {
    filename: String,
}

#[derive(Debug, Deserialize)]
struct CommitEntry {
    commit: CommitDetail,
}

#[derive(Debug, Deserialize)]
struct CommitDetail {
    message: String,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    content: Option<String>,
    sha: String,
}

/// A stored file as read from the contents API: decoded content plus the
/// blob SHA required for conditional updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    pub content: String,
    /// Concurrency token identifying the exact version that was read.
    pub sha: String,
}

/// Commit author/committer identity attached to note writes.
#[derive(Debug, Clone, Serialize)]
pub struct CommitIdentity {
    pub name: String,
    pub email: String,
}

/// A conditional create-or-update of one file on one branch.
#[derive(Debug, Clone)]
pub struct FileWrite<'a> {
    pub path: &'a str,
    pub branch: &'a str,
    pub content: &'a str,
    pub message: &'a str,
    /// Blob SHA of the version being replaced; `None` creates a new file.
    pub token: Option<&'a str>,
    pub identity: &'a CommitIdentity,
}

// ---------------------------------------------------------------------------
// SourceHost trait
// ---------------------------------------------------------------------------

/// The source-control host operations the pipeline depends on.
#[async_trait]
pub trait SourceHost: Send + Sync {
    /// Fetch pull-request metadata by number.
    async fn pull_request(&self, number: u64) -> Result<PullRequest>;

    /// List changed file paths, in the host's ordering.
    async fn changed_files(&self, number: u64) -> Result<Vec<String>>;

    /// List commit messages, in the host's ordering.
    async fn commit_messages(&self, number: u64) -> Result<Vec<String>>;

    /// Read a file at `path` on `branch`. `Ok(None)` when the file does not
    /// exist; any other failure is an error.
    async fn file_content(&self, path: &str, branch: &str) -> Result<Option<StoredFile>>;

    /// Create or update a file. The host rejects the write when the token no
    /// longer matches the current blob.
    async fn write_file(&self, write: &FileWrite<'_>) -> Result<()>;

    /// Post a comment on the change-request thread.
    async fn comment(&self, number: u64, body: &str) -> Result<()>;
}

// ---------------------------------------------------------------------------
// GitHub client
// ---------------------------------------------------------------------------

/// GitHub REST v3 client scoped to a single repository.
pub struct GitHubClient {
    client: reqwest::Client,
    api_base: Url,
    repo: RepoTarget,
    token: String,
}

impl GitHubClient {
    /// Build a client for one repository. Fails on an invalid API base URL.
    pub fn new(api_base: &str, repo: RepoTarget, token: String) -> Result<Self> {
        // A trailing slash keeps Url::join from replacing the last path segment.
        let normalized = if api_base.ends_with('/') {
            api_base.to_string()
        } else {
            format!("{api_base}/")
        };
        let api_base = Url::parse(&normalized).map_err(|e| {
            DeployNoteError::config(format!("invalid GitHub API base '{api_base}': {e}"))
        })?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("deploynote/", env!("CARGO_PKG_VERSION")))
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| DeployNoteError::transport_from("failed to build HTTP client", e))?;

        Ok(Self {
            client,
            api_base,
            repo,
            token,
        })
    }

    fn repo_url(&self, tail: &str) -> Result<Url> {
        self.api_base
            .join(&format!(
                "repos/{}/{}/{tail}",
                self.repo.owner, self.repo.name
            ))
            .map_err(|e| DeployNoteError::transport(format!("invalid request URL: {e}")))
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.client
            .request(method, url)
            .bearer_auth(&self.token)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: Url, what: &str) -> Result<T> {
        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| DeployNoteError::transport_from(format!("{what}: request failed"), e))?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(DeployNoteError::not_found(what.to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployNoteError::transport(format!(
                "{what}: HTTP {status}: {body}"
            )));
        }

        response.json::<T>().await.map_err(|e| {
            DeployNoteError::transport_from(format!("{what}: invalid response body"), e)
        })
    }
}

#[async_trait]
impl SourceHost for GitHubClient {
    #[instrument(skip(self))]
    async fn pull_request(&self, number: u64) -> Result<PullRequest> {
        let url = self.repo_url(&format!("pulls/{number}"))?;
        self.get_json(url, &format!("pull request #{number}")).await
    }

    #[instrument(skip(self))]
    async fn changed_files(&self, number: u64) -> Result<Vec<String>> {
        let mut url = self.repo_url(&format!("pulls/{number}/files"))?;
        url.query_pairs_mut().append_pair("per_page", "100");

        let entries: Vec<FileEntry> = self
            .get_json(url, &format!("files of pull request #{number}"))
            .await?;
        Ok(entries.into_iter().map(|f| f.filename).collect())
    }

    #[instrument(skip(self))]
    async fn commit_messages(&self, number: u64) -> Result<Vec<String>> {
        let mut url = self.repo_url(&format!("pulls/{number}/commits"))?;
        url.query_pairs_mut().append_pair("per_page", "100");

        let entries: Vec<CommitEntry> = self
            .get_json(url, &format!("commits of pull request #{number}"))
            .await?;
        Ok(entries.into_iter().map(|c| c.commit.message).collect())
    }

    #[instrument(skip(self))]
    async fn file_content(&self, path: &str, branch: &str) -> Result<Option<StoredFile>> {
        let mut url = self.repo_url(&format!("contents/{path}"))?;
        url.query_pairs_mut().append_pair("ref", branch);

        let response = self
            .request(reqwest::Method::GET, url)
            .send()
            .await
            .map_err(|e| {
                DeployNoteError::transport_from(format!("read {path}: request failed"), e)
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            debug!(path, branch, "no stored file");
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployNoteError::transport(format!(
                "read {path}: HTTP {status}: {body}"
            )));
        }

        let body: ContentResponse = response.json().await.map_err(|e| {
            DeployNoteError::transport_from(format!("read {path}: invalid response body"), e)
        })?;

        let content = decode_content(body.content.as_deref().unwrap_or_default())?;
        debug!(path, branch, len = content.len(), "stored file read");

        Ok(Some(StoredFile {
            content,
            sha: body.sha,
        }))
    }

    #[instrument(skip_all, fields(path = write.path, branch = write.branch))]
    async fn write_file(&self, write: &FileWrite<'_>) -> Result<()> {
        let url = self.repo_url(&format!("contents/{}", write.path))?;
        let payload = write_payload(write);

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                DeployNoteError::transport_from(
                    format!("write {}: request failed", write.path),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DeployNoteError::transport(format!(
                "write {}: HTTP {status}: {body}",
                write.path
            )));
        }

        info!(path = write.path, branch = write.branch, "file committed");
        Ok(())
    }

    #[instrument(skip(self, body))]
    async fn comment(&self, number: u64, body: &str) -> Result<()> {
        let url = self.repo_url(&format!("issues/{number}/comments"))?;

        let response = self
            .request(reqwest::Method::POST, url)
            .json(&serde_json::json!({ "body": body }))
            .send()
            .await
            .map_err(|e| {
                DeployNoteError::transport_from(
                    format!("comment on #{number}: request failed"),
                    e,
                )
            })?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(DeployNoteError::transport(format!(
                "comment on #{number}: HTTP {status}: {text}"
            )));
        }

        info!(number, "comment posted");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build the contents-API PUT payload. The `sha` field is present only for
/// conditional updates of an existing blob.
fn write_payload(write: &FileWrite<'_>) -> serde_json::Value {
    let mut payload = serde_json::json!({
        "message": write.message,
        "content": BASE64.encode(write.content.as_bytes()),
        "branch": write.branch,
        "committer": write.identity,
        "author": write.identity,
    });
    if let Some(sha) = write.token {
        payload["sha"] = serde_json::Value::String(sha.to_string());
    }
    payload
}

/// Decode the contents-API base64 payload (newline-wrapped by the host).
fn decode_content(encoded: &str) -> Result<String> {
    let compact: String = encoded.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = BASE64.decode(compact.as_bytes()).map_err(|e| {
        DeployNoteError::transport(format!("invalid base64 in contents response: {e}"))
    })?;
    String::from_utf8(bytes)
        .map_err(|e| DeployNoteError::transport(format!("stored file is not valid UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pull_request_deserializes() {
        let json = r#"{
            "number": 42,
            "title": "Fix login redirect",
            "body": null,
            "html_url": "https://github.com/acme/widgets/pull/42",
            "head": { "ref": "fix-login", "sha": "abc123" }
        }"#;
        let pull: PullRequest = serde_json::from_str(json).expect("deserialize");
        assert_eq!(pull.number, 42);
        assert_eq!(pull.body, None);
        assert_eq!(pull.head.branch, "fix-login");
        assert_eq!(pull.head.sha, "abc123");
    }

    #[test]
    fn commit_entries_deserialize() {
        let json = r#"[
            { "commit": { "message": "feat: add limiter" } },
            { "commit": { "message": "test: edge cases" } }
        ]"#;
        let entries: Vec<CommitEntry> = serde_json::from_str(json).expect("deserialize");
        let messages: Vec<String> = entries.into_iter().map(|c| c.commit.message).collect();
        assert_eq!(messages, vec!["feat: add limiter", "test: edge cases"]);
    }

    #[test]
    fn content_response_deserializes_without_content() {
        let json = r#"{ "sha": "def456" }"#;
        let body: ContentResponse = serde_json::from_str(json).expect("deserialize");
        assert_eq!(body.content, None);
        assert_eq!(body.sha, "def456");
    }

    #[test]
    fn decode_plain_base64() {
        let encoded = BASE64.encode("hello deploy note");
        assert_eq!(decode_content(&encoded).unwrap(), "hello deploy note");
    }

    #[test]
    fn decode_newline_wrapped_base64() {
        // The contents API wraps base64 at 60 columns.
        let encoded = BASE64.encode("a".repeat(100));
        let wrapped = format!("{}\n{}\n", &encoded[..60], &encoded[60..]);
        assert_eq!(decode_content(&wrapped).unwrap(), "a".repeat(100));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        assert!(decode_content("not base64 at all!!!").is_err());
    }

    #[test]
    fn write_payload_includes_sha_only_for_updates() {
        let identity = CommitIdentity {
            name: "GitHub Actions".into(),
            email: "actions@github.com".into(),
        };

        let create = FileWrite {
            path: "dev-utils/deployNotes/42.md",
            branch: "fix-login",
            content: "### note",
            message: "Add deploy note for PR #42",
            token: None,
            identity: &identity,
        };
        let payload = write_payload(&create);
        assert!(payload.get("sha").is_none());
        assert_eq!(payload["branch"], "fix-login");
        assert_eq!(payload["committer"]["name"], "GitHub Actions");
        assert_eq!(
            payload["content"],
            BASE64.encode("### note".as_bytes())
        );

        let update = FileWrite {
            token: Some("old-sha"),
            ..create
        };
        let payload = write_payload(&update);
        assert_eq!(payload["sha"], "old-sha");
    }
}
