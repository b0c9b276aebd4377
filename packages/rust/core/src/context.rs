//! Change-context assembly from the source-control host.

use tracing::{info, instrument};

use deploynote_github::SourceHost;
use deploynote_shared::{ChangeContext, Result};

/// Gather change metadata, its file diff list, and its commit list into a
/// normalized [`ChangeContext`].
///
/// Three sequential host calls; a missing or inaccessible pull request
/// aborts here, so no partial context is ever used downstream. Commit and
/// file ordering is the host's; nothing is re-sorted.
#[instrument(skip(host))]
pub async fn assemble_context(host: &dyn SourceHost, number: u64) -> Result<ChangeContext> {
    let pull = host.pull_request(number).await?;
    let changed_files = host.changed_files(number).await?;
    let commit_messages = host.commit_messages(number).await?;

    info!(
        title = %pull.title,
        commits = commit_messages.len(),
        files = changed_files.len(),
        branch = %pull.head.branch,
        "change context assembled"
    );

    Ok(ChangeContext {
        title: pull.title,
        body: pull.body.unwrap_or_default(),
        number: pull.number,
        url: pull.html_url,
        commit_messages,
        changed_files,
        branch: pull.head.branch,
        head_sha: pull.head.sha,
    })
}
