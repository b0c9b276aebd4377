//! The synthesis prompt contract.
//!
//! The prompt is deterministic for a given [`ChangeContext`]: same context,
//! same bytes. It mandates the exact three-region note shape and requires
//! the canonical null note whenever there is nothing concrete to test.

use deploynote_shared::ChangeContext;

/// Fixed system role sent with every synthesis request.
pub const SYSTEM_ROLE: &str =
    "You are a helpful assistant that generates deploy notes for pull requests.";

/// Placeholder embedded when the change request has no description.
pub const NO_DESCRIPTION: &str = "No description provided";

/// Build the user prompt for one change request.
pub fn build_prompt(ctx: &ChangeContext) -> String {
    let body = if ctx.body.trim().is_empty() {
        NO_DESCRIPTION
    } else {
        ctx.body.as_str()
    };

    format!(
        r#"You are an expert developer tasked with creating a deploy note for a pull request.
Your goal is to create simple, concrete test steps that can be executed without interpretation.

CRITICAL REQUIREMENT: NEVER RETURN EMPTY OUTPUT.
- You must always return a properly formatted deploy note.
- If there are no tests to run, use the null deploy note format shown below.
- An empty response is a failure; always provide content.
- Default to the null deploy note if unsure.

Guidelines:
1. Write test steps that are mechanically executable, with no thinking or interpretation needed.
2. Use simple, human language; avoid technical jargon unless absolutely necessary.
3. Each test step must be concrete and verifiable (e.g. "Click the submit button", not "Ensure the form validates").
4. Remove any step that requires subjective interpretation.
5. Don't include steps that can't be clearly tested.
6. Focus on what a real human would actually test, not theoretical validations.
7. Always start with the null deploy note as your baseline and only modify it if there are actual test steps.

Here's the information about the PR:
- Title: {title}
- PR Number: {number}
- PR URL: {url}
- Branch: {branch}

Commit messages:
{commits}

Changed files:
{files}

PR description:
{body}

Based on this information, generate a deploy note in the following format:

### [PR Title](PR URL)

**Test Script**

1. [Simple, concrete action. Describes the test case in full detail and explains the expected result.]
2. [Second test case described in full detail, also with its expected result.]

**Launch Requirements**

- List only concrete, necessary setup steps
- If no special requirements, just say "No special requirements"

Examples of good test steps:
- "Click the 'Submit' button"
- "Check that the success message appears"
- "Enter 'test@example.com' in the email field"

Examples of bad test steps (avoid these):
- "Verify system validation"
- "Check that the localization works"
- "Ensure proper data handling"

NULL DEPLOY NOTE (use this when no tests are needed):
### [PR Title](PR URL)

**Test Script**

Nothing to test

**Launch Requirements**

No special requirements

Remember: never return an empty response. If in doubt, use the null deploy note above."#,
        title = ctx.title,
        number = ctx.number,
        url = ctx.url,
        branch = ctx.branch,
        commits = ctx.commit_messages.join("\n"),
        files = ctx.changed_files.join("\n"),
    )
}
