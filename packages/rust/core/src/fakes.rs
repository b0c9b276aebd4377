//! In-memory collaborator fakes for pipeline tests.
//!
//! `FakeHost` scripts the source-control host: preloaded pull-request
//! metadata and stored-file state, plus a log of every write and comment.
//! `FakeModel` returns a canned completion or a scripted failure.

use std::sync::Mutex;

use async_trait::async_trait;

use deploynote_github::{
    CommitIdentity, FileWrite, HeadRef, PullRequest, SourceHost, StoredFile,
};
use deploynote_model::ModelClient;
use deploynote_note::{DeployNote, RawCandidate, validate};
use deploynote_shared::{ChangeContext, DeployNoteError, Result};

use crate::store::StoreConfig;

/// A write captured by [`FakeHost`].
#[derive(Debug, Clone)]
pub struct RecordedWrite {
    pub path: String,
    pub branch: String,
    pub content: String,
    pub message: String,
    pub token: Option<String>,
}

/// Scripted source host.
pub struct FakeHost {
    pull: PullRequest,
    files: Vec<String>,
    commits: Vec<String>,
    /// Content and token served by `file_content`, replaced on `write_file`.
    pub stored: Mutex<Option<StoredFile>>,
    pub writes: Mutex<Vec<RecordedWrite>>,
    pub comments: Mutex<Vec<String>>,
    drop_writes: bool,
    fail_reads: bool,
    fail_comments: bool,
}

impl FakeHost {
    pub fn new() -> Self {
        Self {
            pull: PullRequest {
                number: 42,
                title: "Fix login redirect".into(),
                body: None,
                html_url: "https://github.com/acme/widgets/pull/42".into(),
                head: HeadRef {
                    branch: "fix-login".into(),
                    sha: "abc123".into(),
                },
            },
            files: vec!["src/login.rs".into()],
            commits: vec!["fix: login redirect".into()],
            stored: Mutex::new(None),
            writes: Mutex::new(Vec::new()),
            comments: Mutex::new(Vec::new()),
            drop_writes: false,
            fail_reads: false,
            fail_comments: false,
        }
    }

    pub fn with_commits(mut self, commits: Vec<String>) -> Self {
        self.commits = commits;
        self
    }

    pub fn with_files(mut self, files: Vec<String>) -> Self {
        self.files = files;
        self
    }

    /// Preload the stored artifact at the note path.
    pub fn with_stored(self, content: &str, sha: &str) -> Self {
        *self.stored.lock().unwrap() = Some(StoredFile {
            content: content.to_string(),
            sha: sha.to_string(),
        });
        self
    }

    /// Accept writes but never apply them (read-back guard tests).
    pub fn dropping_writes(mut self) -> Self {
        self.drop_writes = true;
        self
    }

    /// Every read fails with a transport error.
    pub fn failing_reads(mut self) -> Self {
        self.fail_reads = true;
        self
    }

    /// Every comment fails with a transport error.
    pub fn failing_comments(mut self) -> Self {
        self.fail_comments = true;
        self
    }

    fn check_reads(&self) -> Result<()> {
        if self.fail_reads {
            Err(DeployNoteError::transport("scripted read failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SourceHost for FakeHost {
    async fn pull_request(&self, _number: u64) -> Result<PullRequest> {
        self.check_reads()?;
        Ok(self.pull.clone())
    }

    async fn changed_files(&self, _number: u64) -> Result<Vec<String>> {
        self.check_reads()?;
        Ok(self.files.clone())
    }

    async fn commit_messages(&self, _number: u64) -> Result<Vec<String>> {
        self.check_reads()?;
        Ok(self.commits.clone())
    }

    async fn file_content(&self, _path: &str, _branch: &str) -> Result<Option<StoredFile>> {
        self.check_reads()?;
        Ok(self.stored.lock().unwrap().clone())
    }

    async fn write_file(&self, write: &FileWrite<'_>) -> Result<()> {
        self.writes.lock().unwrap().push(RecordedWrite {
            path: write.path.to_string(),
            branch: write.branch.to_string(),
            content: write.content.to_string(),
            message: write.message.to_string(),
            token: write.token.map(str::to_string),
        });
        if !self.drop_writes {
            *self.stored.lock().unwrap() = Some(StoredFile {
                content: write.content.to_string(),
                sha: "new-sha".into(),
            });
        }
        Ok(())
    }

    async fn comment(&self, _number: u64, body: &str) -> Result<()> {
        if self.fail_comments {
            return Err(DeployNoteError::transport("scripted comment failure"));
        }
        self.comments.lock().unwrap().push(body.to_string());
        Ok(())
    }
}

/// Canned model: one fixed response, or a scripted synthesis failure.
pub struct FakeModel {
    response: Option<String>,
}

impl FakeModel {
    pub fn returning(text: &str) -> Self {
        Self {
            response: Some(text.to_string()),
        }
    }

    pub fn failing() -> Self {
        Self { response: None }
    }
}

#[async_trait]
impl ModelClient for FakeModel {
    async fn complete(&self, _system: &str, _prompt: &str) -> Result<String> {
        match &self.response {
            Some(text) => Ok(text.trim().to_string()),
            None => Err(DeployNoteError::synthesis("scripted model failure")),
        }
    }
}

/// The context [`FakeHost::new`] assembles for PR #42.
pub fn sample_context() -> ChangeContext {
    ChangeContext {
        title: "Fix login redirect".into(),
        body: String::new(),
        number: 42,
        url: "https://github.com/acme/widgets/pull/42".into(),
        commit_messages: vec!["fix: login redirect".into()],
        changed_files: vec!["src/login.rs".into()],
        branch: "fix-login".into(),
        head_sha: "abc123".into(),
    }
}

/// A well-formed note for [`sample_context`], distinct from the null note.
pub fn valid_note(ctx: &ChangeContext) -> DeployNote {
    let text = format!(
        "### [{}]({})\n\n\
         **Test Script**\n\n\
         1. Log in with a valid account. You land on the dashboard.\n\n\
         **Launch Requirements**\n\n\
         No special requirements",
        ctx.title, ctx.url
    );
    validate(RawCandidate(text), ctx)
}

/// Default store settings used across tests.
pub fn store_config() -> StoreConfig {
    StoreConfig {
        notes_dir: "dev-utils/deployNotes".into(),
        identity: CommitIdentity {
            name: "GitHub Actions".into(),
            email: "actions@github.com".into(),
        },
    }
}
