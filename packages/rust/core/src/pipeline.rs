//! End-to-end deploy-note pipeline.
//!
//! Strictly sequential: context → synthesis → validation → store → notify.
//! Each external call is a suspension point; no two suspend concurrently.
//! The first fatal error aborts the remaining stages.

use std::time::Instant;

use tracing::{info, instrument};

use deploynote_github::SourceHost;
use deploynote_model::ModelClient;
use deploynote_note::{DeployNote, RawCandidate, prompt, validate};
use deploynote_shared::Result;

use crate::context::assemble_context;
use crate::notify::post_note_comment;
use crate::store::{StoreConfig, StoreOutcome, note_path, persist_note};

/// Configuration for one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Change-request number to process.
    pub pr_number: u64,
    /// Store settings (notes directory, commit identity).
    pub store: StoreConfig,
}

/// Result of a completed run.
#[derive(Debug)]
pub struct PipelineReport {
    /// What the store did with the note.
    pub outcome: StoreOutcome,
    /// Repository path the note lives at.
    pub note_path: String,
    /// The final note.
    pub note: DeployNote,
    /// Total elapsed time.
    pub elapsed: std::time::Duration,
}

/// Progress callback for stage transitions.
pub trait Progress: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
}

/// No-op progress for headless/test usage.
pub struct SilentProgress;

impl Progress for SilentProgress {
    fn phase(&self, _name: &str) {}
}

/// Run the full pipeline for one change request.
#[instrument(skip_all, fields(number = config.pr_number))]
pub async fn generate_deploy_note(
    config: &PipelineConfig,
    host: &dyn SourceHost,
    model: &dyn ModelClient,
    progress: &dyn Progress,
) -> Result<PipelineReport> {
    let start = Instant::now();
    info!(number = config.pr_number, "generating deploy note");

    progress.phase("Assembling change context");
    let ctx = assemble_context(host, config.pr_number).await?;

    progress.phase("Synthesizing deploy note");
    let user_prompt = prompt::build_prompt(&ctx);
    let raw = RawCandidate(model.complete(prompt::SYSTEM_ROLE, &user_prompt).await?);

    let note = validate(raw, &ctx);

    progress.phase("Reconciling stored note");
    let outcome = persist_note(host, &ctx, &note, &config.store).await?;

    progress.phase("Posting review comment");
    let path = note_path(&config.store.notes_dir, ctx.number);
    post_note_comment(host, ctx.number, &note, &path).await?;

    let report = PipelineReport {
        outcome,
        note_path: path,
        note,
        elapsed: start.elapsed(),
    };

    info!(
        outcome = ?report.outcome,
        path = %report.note_path,
        elapsed_ms = report.elapsed.as_millis(),
        "deploy note pipeline complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use deploynote_note::null_note;

    use super::*;
    use crate::fakes::{FakeHost, FakeModel, sample_context, store_config};

    fn config() -> PipelineConfig {
        PipelineConfig {
            pr_number: 42,
            store: store_config(),
        }
    }

    #[tokio::test]
    async fn null_note_round_trip_creates_and_comments() {
        // The model returns exactly the canonical null note for a change
        // with no commits and no files.
        let host = FakeHost::new().with_commits(vec![]).with_files(vec![]);
        let expected = null_note(&sample_context());
        let model = FakeModel::returning(expected.as_str());

        let report = generate_deploy_note(&config(), &host, &model, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.outcome, StoreOutcome::Created);
        assert_eq!(report.note, expected);
        assert_eq!(report.note_path, "dev-utils/deployNotes/42.md");

        let writes = host.writes.lock().unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(writes[0].token, None);
        assert_eq!(writes[0].content, expected.as_str());

        let comments = host.comments.lock().unwrap();
        assert_eq!(comments.len(), 1);
        assert!(comments[0].contains(expected.as_str()));
    }

    #[tokio::test]
    async fn malformed_output_is_repaired_before_storage() {
        let host = FakeHost::new();
        let model = FakeModel::returning("free-form prose with no markers");

        let report = generate_deploy_note(&config(), &host, &model, &SilentProgress)
            .await
            .unwrap();

        let expected = null_note(&sample_context());
        assert_eq!(report.note, expected);
        let writes = host.writes.lock().unwrap();
        assert_eq!(writes[0].content, expected.as_str());
    }

    #[tokio::test]
    async fn unchanged_note_skips_write_but_still_comments() {
        let expected = null_note(&sample_context());
        let host = FakeHost::new().with_stored(expected.as_str(), "old-sha");
        let model = FakeModel::returning(expected.as_str());

        let report = generate_deploy_note(&config(), &host, &model, &SilentProgress)
            .await
            .unwrap();

        assert_eq!(report.outcome, StoreOutcome::Unchanged);
        assert!(host.writes.lock().unwrap().is_empty());
        assert_eq!(host.comments.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn synthesis_failure_aborts_before_any_side_effect() {
        let host = FakeHost::new();
        let model = FakeModel::failing();

        let err = generate_deploy_note(&config(), &host, &model, &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("synthesis error"));
        assert!(host.writes.lock().unwrap().is_empty());
        assert!(host.comments.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn dropped_write_never_reaches_notification() {
        let host = FakeHost::new().dropping_writes();
        let model = FakeModel::returning(null_note(&sample_context()).as_str());

        let err = generate_deploy_note(&config(), &host, &model, &SilentProgress)
            .await
            .unwrap_err();

        assert!(err.to_string().contains("consistency error"));
        assert!(host.comments.lock().unwrap().is_empty());
    }
}
