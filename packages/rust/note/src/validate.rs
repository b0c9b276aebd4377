//! Structural validation of model output.
//!
//! [`validate`] is a total function: it always yields a usable note.
//! Generative output must never be able to block downstream persistence,
//! so every failure repairs to the canonical null note instead of erroring.

use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, warn};

use deploynote_shared::{ChangeContext, DeployNoteError};

use crate::{
    DeployNote, LAUNCH_REQUIREMENTS_MARKER, RawCandidate, TEST_SCRIPT_MARKER, TITLE_MARKER,
    null_note,
};

/// Content between the two section markers, dot-all so it spans lines.
static TEST_SCRIPT_BODY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\*\*Test Script\*\*(.*?)\*\*Launch Requirements\*\*")
        .expect("test-script body regex is valid")
});

/// Classify a candidate document, repairing to the canonical null note when
/// it is structurally invalid.
pub fn validate(candidate: RawCandidate, ctx: &ChangeContext) -> DeployNote {
    match check(&candidate.0) {
        Ok(()) => {
            debug!(len = candidate.0.len(), "deploy note candidate accepted");
            DeployNote::from_validated(candidate.0.trim().to_string())
        }
        Err(reason) => {
            warn!(%reason, "model output rejected, substituting null note");
            null_note(ctx)
        }
    }
}

/// The structural checks. A failure names the offending rule; it is always
/// resolved locally and never reaches the pipeline caller.
fn check(text: &str) -> std::result::Result<(), DeployNoteError> {
    if text.trim().is_empty() {
        return Err(DeployNoteError::validation("note is empty"));
    }
    if !text.contains(TEST_SCRIPT_MARKER) {
        return Err(DeployNoteError::validation(format!(
            "missing required section {TEST_SCRIPT_MARKER}"
        )));
    }
    if !text.contains(LAUNCH_REQUIREMENTS_MARKER) {
        return Err(DeployNoteError::validation(format!(
            "missing required section {LAUNCH_REQUIREMENTS_MARKER}"
        )));
    }
    if !text.contains(TITLE_MARKER) {
        return Err(DeployNoteError::validation("missing title header"));
    }
    if let Some(captures) = TEST_SCRIPT_BODY.captures(text) {
        if captures[1].trim().is_empty() {
            return Err(DeployNoteError::validation("test script section is empty"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_context() -> ChangeContext {
        ChangeContext {
            title: "Fix login redirect".into(),
            body: String::new(),
            number: 42,
            url: "https://github.com/acme/widgets/pull/42".into(),
            commit_messages: vec![],
            changed_files: vec![],
            branch: "fix-login".into(),
            head_sha: "abc123".into(),
        }
    }

    fn well_formed() -> String {
        "### [Fix login redirect](https://github.com/acme/widgets/pull/42)\n\n\
         **Test Script**\n\n\
         1. Log in with a valid account. You land on the dashboard.\n\n\
         **Launch Requirements**\n\n\
         No special requirements"
            .to_string()
    }

    #[test]
    fn valid_candidate_passes_through() {
        let ctx = sample_context();
        let note = validate(RawCandidate(well_formed()), &ctx);
        assert_eq!(note.as_str(), well_formed());
    }

    #[test]
    fn valid_candidate_is_trimmed() {
        let ctx = sample_context();
        let note = validate(RawCandidate(format!("\n\n{}\n  ", well_formed())), &ctx);
        assert_eq!(note.as_str(), well_formed());
    }

    #[test]
    fn totality_over_malformed_inputs() {
        let ctx = sample_context();
        let cases = [
            "",
            "   \n\t  ",
            "just some prose with no structure",
            "### [title](url) only a header",
            "**Test Script**\n\nstep\n\n**Launch Requirements**\n\nnone", // no title
        ];
        for case in cases {
            let note = validate(RawCandidate(case.to_string()), &ctx);
            let text = note.as_str();
            assert!(text.contains(TITLE_MARKER), "case {case:?}");
            assert!(text.contains(TEST_SCRIPT_MARKER), "case {case:?}");
            assert!(text.contains(LAUNCH_REQUIREMENTS_MARKER), "case {case:?}");
            assert!(!text.trim().is_empty(), "case {case:?}");
        }
    }

    #[test]
    fn null_note_is_a_fixed_point() {
        let ctx = sample_context();
        let canonical = null_note(&ctx);
        let note = validate(RawCandidate(canonical.as_str().to_string()), &ctx);
        assert_eq!(note, canonical);
    }

    #[test]
    fn missing_launch_requirements_repairs_to_null_note() {
        let ctx = sample_context();
        let candidate = "### [Fix login redirect](https://github.com/acme/widgets/pull/42)\n\n\
                         **Test Script**\n\n\
                         1. Log in with a valid account."
            .to_string();
        let note = validate(RawCandidate(candidate), &ctx);
        assert_eq!(note, null_note(&ctx));
    }

    #[test]
    fn empty_test_script_body_repairs_to_null_note() {
        let ctx = sample_context();
        let candidate = "### [Fix login redirect](https://github.com/acme/widgets/pull/42)\n\n\
                         **Test Script**\n\n\n\
                         **Launch Requirements**\n\n\
                         No special requirements"
            .to_string();
        let note = validate(RawCandidate(candidate), &ctx);
        assert_eq!(note, null_note(&ctx));
    }
}
