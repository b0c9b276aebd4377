//! Deploy-note document layer: prompt contract, structural validation, and
//! the canonical null note.
//!
//! Model output is untrusted. It enters the pipeline as a [`RawCandidate`]
//! and can only become a [`DeployNote`] through [`validate`], which repairs
//! anything malformed to the canonical null note. Storage and notification
//! accept only [`DeployNote`], so unchecked text cannot reach them.

pub mod prompt;
mod validate;

pub use validate::validate;

use deploynote_shared::ChangeContext;

/// Marker for the test-script region.
pub const TEST_SCRIPT_MARKER: &str = "**Test Script**";

/// Marker for the launch-requirements region.
pub const LAUNCH_REQUIREMENTS_MARKER: &str = "**Launch Requirements**";

/// Marker for the title line.
pub const TITLE_MARKER: &str = "###";

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Untrusted model output, not yet structurally checked.
#[derive(Debug, Clone)]
pub struct RawCandidate(pub String);

/// A structurally valid deploy note.
///
/// Constructed only by [`validate`] or [`null_note`], never from raw text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployNote(String);

impl DeployNote {
    /// The note text, byte-identical to what gets stored.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn from_validated(text: String) -> Self {
        Self(text)
    }
}

impl std::fmt::Display for DeployNote {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Canonical null note
// ---------------------------------------------------------------------------

/// Build the canonical null note for a change request.
///
/// The universal fallback when generation fails or nothing is testable: it
/// satisfies every structural check and states that there is nothing to test.
pub fn null_note(ctx: &ChangeContext) -> DeployNote {
    DeployNote(format!(
        "{TITLE_MARKER} [{title}]({url})\n\n\
         {TEST_SCRIPT_MARKER}\n\n\
         Nothing to test\n\n\
         {LAUNCH_REQUIREMENTS_MARKER}\n\n\
         No special requirements",
        title = ctx.title,
        url = ctx.url,
    ))
}

// ---------------------------------------------------------------------------
// Comment template
// ---------------------------------------------------------------------------

/// Wrap a note in the fixed review-comment template, naming the path it was
/// committed to.
pub fn comment_body(note: &DeployNote, stored_path: &str) -> String {
    format!(
        "## Deploy Note Generated\n\n\
         A deploy note has been automatically generated for this PR:\n\n\
         ```markdown\n\
         {note}\n\
         ```\n\n\
         This note has been saved to `{stored_path}` and committed to this PR branch.\n"
    )
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

    #[test]
    fn null_note_has_all_regions() {
        let note = null_note(&sample_context());
        let text = note.as_str();
        assert!(text.starts_with("### [Fix login redirect](https://github.com/acme/widgets/pull/42)"));
        assert!(text.contains(TEST_SCRIPT_MARKER));
        assert!(text.contains(LAUNCH_REQUIREMENTS_MARKER));
        assert!(text.contains("Nothing to test"));
        assert!(text.contains("No special requirements"));
    }

    #[test]
    fn comment_embeds_note_and_path() {
        let note = null_note(&sample_context());
        let comment = comment_body(&note, "dev-utils/deployNotes/42.md");
        assert!(comment.starts_with("## Deploy Note Generated"));
        assert!(comment.contains("```markdown"));
        assert!(comment.contains(note.as_str()));
        assert!(comment.contains("`dev-utils/deployNotes/42.md`"));
    }
}
