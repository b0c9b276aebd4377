//! Idempotent note persistence with optimistic concurrency.
//!
//! The stored artifact is the only externally shared mutable resource in
//! the system; the blob SHA returned by the read is the sole coordination
//! mechanism for overwrites. A token mismatch is rejected by the host and
//! surfaces as a fatal error rather than a silent overwrite, which could
//! lose an intervening human edit to the note.

use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument, warn};

use deploynote_github::{CommitIdentity, FileWrite, SourceHost};
use deploynote_note::DeployNote;
use deploynote_shared::{ChangeContext, DeployNoteError, Result};

/// What the store did with the computed note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    /// No prior artifact existed; a new file was committed.
    Created,
    /// A prior artifact existed with different (or empty) content and was
    /// overwritten using its concurrency token.
    Updated,
    /// The stored content already matches the note; nothing was written.
    Unchanged,
}

/// Store settings: where notes live and who signs the commits.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Repository directory the notes are committed under.
    pub notes_dir: String,
    /// Commit author/committer identity.
    pub identity: CommitIdentity,
}

/// Repository path for a change request's note.
pub fn note_path(notes_dir: &str, number: u64) -> String {
    format!("{}/{number}.md", notes_dir.trim_end_matches('/'))
}

/// Reconcile the validated note against the stored artifact.
///
/// Reads the prior version first; skips the write entirely when the stored
/// content is already byte-identical and non-empty. An empty stored file is
/// treated as "needs write" so an empty read is never mistaken for a real
/// artifact. After any write, the artifact is re-read and must be non-empty.
#[instrument(skip_all, fields(number = ctx.number, branch = %ctx.branch))]
pub async fn persist_note(
    host: &dyn SourceHost,
    ctx: &ChangeContext,
    note: &DeployNote,
    config: &StoreConfig,
) -> Result<StoreOutcome> {
    let path = note_path(&config.notes_dir, ctx.number);

    debug!(%path, "checking for existing deploy note");
    let existing = host.file_content(&path, &ctx.branch).await?;

    let token = match &existing {
        None => {
            info!(%path, "no existing deploy note, will create");
            None
        }
        Some(stored) if stored.content == note.as_str() && !stored.content.is_empty() => {
            info!(%path, "deploy note unchanged, skipping write");
            return Ok(StoreOutcome::Unchanged);
        }
        Some(stored) => {
            if stored.content.is_empty() {
                warn!(%path, "existing deploy note is empty, rewriting");
            } else {
                debug!(
                    stored = %content_digest(&stored.content),
                    computed = %content_digest(note.as_str()),
                    "deploy note differs from stored version"
                );
            }
            Some(stored.sha.clone())
        }
    };

    let outcome = if token.is_some() {
        StoreOutcome::Updated
    } else {
        StoreOutcome::Created
    };

    let message = format!("Add deploy note for PR #{}", ctx.number);
    let write = FileWrite {
        path: &path,
        branch: &ctx.branch,
        content: note.as_str(),
        message: &message,
        token: token.as_deref(),
        identity: &config.identity,
    };
    host.write_file(&write).await?;
    info!(%path, branch = %ctx.branch, ?outcome, "deploy note committed");

    // Read-back guard: a write the host accepted but did not apply must not
    // go unnoticed.
    match host.file_content(&path, &ctx.branch).await? {
        Some(stored) if !stored.content.is_empty() => Ok(outcome),
        _ => Err(DeployNoteError::consistency(format!(
            "deploy note missing at {path} after write"
        ))),
    }
}

/// Short SHA-256 digest for logging content identity without dumping it.
fn content_digest(content: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());
    hash[..12].to_string()
}
