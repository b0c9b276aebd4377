//! Review-thread notification.

use tracing::{info, instrument};

use deploynote_github::SourceHost;
use deploynote_note::{DeployNote, comment_body};
use deploynote_shared::Result;

/// Post the final note to the change-request thread, wrapped in the fixed
/// comment template naming the stored path.
///
/// A stored but un-notified note is an incomplete run, so failures here
/// propagate.
#[instrument(skip(host, note))]
pub async fn post_note_comment(
    host: &dyn SourceHost,
    number: u64,
    note: &DeployNote,
    stored_path: &str,
) -> Result<()> {
    host.comment(number, &comment_body(note, stored_path)).await?;
    info!(number, "deploy note comment posted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fakes::{FakeHost, sample_context, valid_note};

    #[tokio::test]
    async fn comment_carries_note_and_path() {
        let host = FakeHost::new();
        let ctx = sample_context();
        let note = valid_note(&ctx);

        post_note_comment(&host, 42, &note, "dev-utils/deployNotes/42.md")
            .await
            .unwrap();

        let comments = host.comments.lock().unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains(note.as_str()));
        assert!(comments[0].contains("`dev-utils/deployNotes/42.md`"));
    }

    #[tokio::test]
    async fn comment_failure_propagates() {
        let host = FakeHost::new().failing_comments();
        let ctx = sample_context();
        let note = valid_note(&ctx);

        let err = post_note_comment(&host, 42, &note, "dev-utils/deployNotes/42.md")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("transport error"));
    }
}
